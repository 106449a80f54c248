//! User filter selection and its application to a record snapshot.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::ServiceOrderRecord;
use crate::month::MonthKey;

/// Inclusive range of generation dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Values a user can choose from, derived from the loaded snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    /// Distinct localities, ascending.
    pub localities: Vec<i64>,
    /// Earliest and latest generation date, `None` when there is no data.
    pub date_span: Option<DateRange>,
    /// Distinct generation months, chronological.
    pub months: Vec<MonthKey>,
}

impl FilterOptions {
    pub fn from_records(records: &[ServiceOrderRecord]) -> Self {
        let localities: BTreeSet<i64> = records.iter().map(|r| r.locality_id).collect();
        let months: BTreeSet<MonthKey> = records.iter().map(|r| r.generation_month()).collect();
        let min = records.iter().map(|r| r.generated_on()).min();
        let max = records.iter().map(|r| r.generated_on()).max();

        Self {
            localities: localities.into_iter().collect(),
            date_span: min.zip(max).map(|(from, to)| DateRange { from, to }),
            months: months.into_iter().collect(),
        }
    }
}

/// The filter state: locality set, generation date range and month set.
///
/// The month set only narrows the monthly view; the KPIs, overall chart and
/// detail export use localities and dates alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub localities: BTreeSet<i64>,
    /// `None` leaves generation dates unbounded.
    pub date_range: Option<DateRange>,
    pub months: BTreeSet<MonthKey>,
}

impl Selection {
    /// Everything selected: all localities, all months, the full date span.
    pub fn all(options: &FilterOptions) -> Self {
        Self {
            localities: options.localities.iter().copied().collect(),
            date_range: options.date_span,
            months: options.months.iter().copied().collect(),
        }
    }

    pub fn with_localities(mut self, localities: impl IntoIterator<Item = i64>) -> Self {
        self.localities = localities.into_iter().collect();
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_months(mut self, months: impl IntoIterator<Item = MonthKey>) -> Self {
        self.months = months.into_iter().collect();
        self
    }

    /// Generation months among the records this selection keeps. These are
    /// the month picker's choices and its default.
    pub fn available_months(&self, records: &[ServiceOrderRecord]) -> BTreeSet<MonthKey> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .map(|r| r.generation_month())
            .collect()
    }

    /// Select every month still available under the locality and date filters.
    pub fn with_available_months(mut self, records: &[ServiceOrderRecord]) -> Self {
        self.months = self.available_months(records);
        self
    }

    pub fn matches(&self, record: &ServiceOrderRecord) -> bool {
        self.localities.contains(&record.locality_id)
            && self
                .date_range
                .map_or(true, |range| range.contains(record.generated_on()))
    }
}

/// Records whose locality is selected and whose generation date is in range,
/// in their original order.
pub fn filter_records<'a>(
    records: &'a [ServiceOrderRecord],
    selection: &Selection,
) -> Vec<&'a ServiceOrderRecord> {
    records.iter().filter(|r| selection.matches(r)).collect()
}
