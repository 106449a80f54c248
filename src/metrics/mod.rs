pub mod types;

pub use types::*;

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::ServiceType;
use crate::model::ServiceOrderRecord;
use crate::month::MonthKey;
use crate::status::OrderStatus;

/// Total, completed and completion rate over the filtered records.
pub fn compute_kpis(records: &[&ServiceOrderRecord]) -> SummaryKpis {
    let total = records.len() as u64;
    let completed = records.iter().filter(|r| r.status.is_completed()).count() as u64;

    SummaryKpis {
        total_generated: total,
        total_completed: completed,
        completion_rate: if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        },
    }
}

/// Counts per (service type, status) and totals per service type.
pub fn compute_breakdown(records: &[&ServiceOrderRecord]) -> StatusBreakdown {
    let mut counts: BTreeMap<(ServiceType, OrderStatus), u64> = BTreeMap::new();
    let mut totals: BTreeMap<ServiceType, u64> = BTreeMap::new();

    for r in records {
        *counts
            .entry((r.service_type, r.status.clone()))
            .or_default() += 1;
        *totals.entry(r.service_type).or_default() += 1;
    }

    StatusBreakdown {
        counts: counts
            .into_iter()
            .map(|((service_type, status), count)| StatusCount {
                service_type,
                status,
                count,
            })
            .collect(),
        totals: totals
            .into_iter()
            .map(|(service_type, total)| TypeTotal { service_type, total })
            .collect(),
    }
}

/// Counts per (month, service type, status) and totals per (month, service
/// type), restricted to `months`. Months are ordered by calendar, not label.
pub fn compute_monthly_breakdown(
    records: &[&ServiceOrderRecord],
    months: &BTreeSet<MonthKey>,
) -> MonthlyBreakdown {
    let mut counts: BTreeMap<(MonthKey, ServiceType, OrderStatus), u64> = BTreeMap::new();
    let mut totals: BTreeMap<(MonthKey, ServiceType), u64> = BTreeMap::new();

    for r in records {
        let month = r.generation_month();
        if !months.contains(&month) {
            continue;
        }
        *counts
            .entry((month, r.service_type, r.status.clone()))
            .or_default() += 1;
        *totals.entry((month, r.service_type)).or_default() += 1;
    }

    let present: BTreeSet<MonthKey> = totals.keys().map(|(month, _)| *month).collect();

    MonthlyBreakdown {
        months: present.into_iter().collect(),
        counts: counts
            .into_iter()
            .map(|((month, service_type, status), count)| MonthlyStatusCount {
                month,
                service_type,
                status,
                count,
            })
            .collect(),
        totals: totals
            .into_iter()
            .map(|((month, service_type), total)| MonthlyTypeTotal {
                month,
                service_type,
                total,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter_records, DateRange, FilterOptions, Selection};
    use chrono::NaiveDate;

    fn record(
        order_id: i64,
        locality_id: i64,
        (y, m, d): (i32, u32, u32),
        service_type: ServiceType,
        status: OrderStatus,
    ) -> ServiceOrderRecord {
        let generated_at = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let closed_at = (!status.is_pending()).then(|| generated_at + chrono::Duration::days(1));
        ServiceOrderRecord {
            order_id,
            property_id: 7000 + order_id,
            locality_id,
            generated_at,
            closed_at,
            service_type,
            status,
            service_description: service_type.label().to_uppercase(),
            closure_reason: None,
        }
    }

    /// Two localities over June, July and August 2025.
    fn scenario() -> Vec<ServiceOrderRecord> {
        use OrderStatus::*;
        use ServiceType::*;
        vec![
            record(1, 10, (2025, 6, 3), Diagnostic, Completed),
            record(2, 10, (2025, 6, 20), Probing, Pending),
            record(3, 20, (2025, 6, 21), Suppression, Cancelled),
            record(4, 10, (2025, 7, 1), Diagnostic, Completed),
            record(5, 10, (2025, 7, 9), Diagnostic, Pending),
            record(6, 20, (2025, 7, 10), Probing, Completed),
            record(7, 10, (2025, 7, 31), Suppression, Situation("EXECUTADA".into())),
            record(8, 20, (2025, 8, 2), Suppression, Completed),
            record(9, 10, (2025, 8, 15), Probing, Cancelled),
            record(10, 20, (2025, 8, 30), Diagnostic, Pending),
        ]
    }

    fn all_refs(records: &[ServiceOrderRecord]) -> Vec<&ServiceOrderRecord> {
        records.iter().collect()
    }

    #[test]
    fn test_kpis_over_scenario() {
        let records = scenario();
        let kpis = compute_kpis(&all_refs(&records));
        assert_eq!(kpis.total_generated, 10);
        assert_eq!(kpis.total_completed, 4);
        assert!((kpis.completion_rate - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_kpis_empty_input() {
        let kpis = compute_kpis(&[]);
        assert_eq!(kpis, SummaryKpis::default());
        assert_eq!(kpis.completion_rate, 0.0);
    }

    #[test]
    fn test_completion_rate_bounds() {
        let records = scenario();
        for n in 0..=records.len() {
            let refs: Vec<&ServiceOrderRecord> = records.iter().take(n).collect();
            let rate = compute_kpis(&refs).completion_rate;
            assert!((0.0..=100.0).contains(&rate), "rate {rate} for first {n}");
        }
    }

    #[test]
    fn test_breakdown_groups_and_totals() {
        let records = scenario();
        let b = compute_breakdown(&all_refs(&records));

        let diag_completed = b
            .counts
            .iter()
            .find(|c| c.service_type == ServiceType::Diagnostic && c.status == OrderStatus::Completed)
            .unwrap();
        assert_eq!(diag_completed.count, 2);

        let totals: Vec<(ServiceType, u64)> =
            b.totals.iter().map(|t| (t.service_type, t.total)).collect();
        assert_eq!(
            totals,
            vec![
                (ServiceType::Diagnostic, 4),
                (ServiceType::Probing, 3),
                (ServiceType::Suppression, 3),
            ]
        );

        // Per-type totals equal the sum of that type's segments.
        for t in &b.totals {
            let sum: u64 = b
                .counts
                .iter()
                .filter(|c| c.service_type == t.service_type)
                .map(|c| c.count)
                .sum();
            assert_eq!(sum, t.total);
        }
    }

    #[test]
    fn test_breakdown_empty_input() {
        let b = compute_breakdown(&[]);
        assert!(b.is_empty());
        assert!(b.totals.is_empty());
    }

    #[test]
    fn test_monthly_totals_sum_back_to_overall() {
        let records = scenario();
        let refs = all_refs(&records);
        let all_months: BTreeSet<MonthKey> = records.iter().map(|r| r.generation_month()).collect();

        let overall = compute_breakdown(&refs);
        let monthly = compute_monthly_breakdown(&refs, &all_months);

        let mut from_counts: BTreeMap<ServiceType, u64> = BTreeMap::new();
        for c in &monthly.counts {
            *from_counts.entry(c.service_type).or_default() += c.count;
        }
        let mut from_totals: BTreeMap<ServiceType, u64> = BTreeMap::new();
        for t in &monthly.totals {
            *from_totals.entry(t.service_type).or_default() += t.total;
        }
        let expected: BTreeMap<ServiceType, u64> = overall
            .totals
            .iter()
            .map(|t| (t.service_type, t.total))
            .collect();

        assert_eq!(from_counts, expected);
        assert_eq!(from_totals, expected);
    }

    #[test]
    fn test_monthly_months_are_chronological() {
        let records = vec![
            record(1, 1, (2026, 1, 5), ServiceType::Diagnostic, OrderStatus::Pending),
            record(2, 1, (2025, 12, 5), ServiceType::Diagnostic, OrderStatus::Pending),
            record(3, 1, (2025, 2, 5), ServiceType::Diagnostic, OrderStatus::Pending),
        ];
        let refs = all_refs(&records);
        let months: BTreeSet<MonthKey> = records.iter().map(|r| r.generation_month()).collect();
        let monthly = compute_monthly_breakdown(&refs, &months);
        let labels: Vec<String> = monthly.months.iter().map(|m| m.label()).collect();
        assert_eq!(labels, vec!["02/2025", "12/2025", "01/2026"]);
    }

    #[test]
    fn test_monthly_empty_month_selection() {
        let records = scenario();
        let monthly = compute_monthly_breakdown(&all_refs(&records), &BTreeSet::new());
        assert_eq!(monthly, MonthlyBreakdown::default());
    }

    #[test]
    fn test_one_locality_one_month_matches_manual_subset() {
        let records = scenario();
        let options = FilterOptions::from_records(&records);
        let july = MonthKey::new(2025, 7).unwrap();
        let selection = Selection::all(&options)
            .with_localities([10])
            .with_months([july]);

        let filtered = filter_records(&records, &selection);
        let monthly = compute_monthly_breakdown(&filtered, &selection.months);

        // Locality 10 in July: orders 4 (diag, completed), 5 (diag, pending),
        // 7 (suppression, EXECUTADA).
        assert_eq!(monthly.months, vec![july]);
        let totals: Vec<(ServiceType, u64)> = monthly
            .totals
            .iter()
            .map(|t| (t.service_type, t.total))
            .collect();
        assert_eq!(
            totals,
            vec![(ServiceType::Diagnostic, 2), (ServiceType::Suppression, 1)]
        );
        let grand: u64 = monthly.counts.iter().map(|c| c.count).sum();
        assert_eq!(grand, 3);

        let july_only = monthly.for_month(july);
        assert_eq!(july_only.totals.len(), 2);
        assert!(monthly.for_month(MonthKey::new(2025, 6).unwrap()).is_empty());
    }

    #[test]
    fn test_date_filter_then_kpis() {
        let records = scenario();
        let selection = Selection::all(&FilterOptions::from_records(&records)).with_date_range(
            DateRange::new(
                NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
            ),
        );
        let kpis = compute_kpis(&filter_records(&records, &selection));
        assert_eq!(kpis.total_generated, 3);
        assert_eq!(kpis.total_completed, 1);
    }
}
