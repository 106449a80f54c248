use serde::Serialize;

use crate::catalog::ServiceType;
use crate::month::MonthKey;
use crate::status::OrderStatus;

/// Headline numbers for the filtered period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryKpis {
    pub total_generated: u64,
    pub total_completed: u64,
    /// Percentage of generated orders that were completed, 0 when there are none.
    pub completion_rate: f64,
}

/// Orders of one service type in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub service_type: ServiceType,
    pub status: OrderStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeTotal {
    pub service_type: ServiceType,
    pub total: u64,
}

/// Overall stacked-bar data: counts per (type, status) and totals per type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub counts: Vec<StatusCount>,
    pub totals: Vec<TypeTotal>,
}

impl StatusBreakdown {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyStatusCount {
    pub month: MonthKey,
    pub service_type: ServiceType,
    pub status: OrderStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTypeTotal {
    pub month: MonthKey,
    pub service_type: ServiceType,
    pub total: u64,
}

/// Month-bucketed stacked-bar data, months in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyBreakdown {
    /// Selected months that have at least one order.
    pub months: Vec<MonthKey>,
    pub counts: Vec<MonthlyStatusCount>,
    pub totals: Vec<MonthlyTypeTotal>,
}

impl MonthlyBreakdown {
    /// The overall breakdown restricted to a single month.
    pub fn for_month(&self, month: MonthKey) -> StatusBreakdown {
        StatusBreakdown {
            counts: self
                .counts
                .iter()
                .filter(|c| c.month == month)
                .map(|c| StatusCount {
                    service_type: c.service_type,
                    status: c.status.clone(),
                    count: c.count,
                })
                .collect(),
            totals: self
                .totals
                .iter()
                .filter(|t| t.month == month)
                .map(|t| TypeTotal {
                    service_type: t.service_type,
                    total: t.total,
                })
                .collect(),
        }
    }
}
