//! Chart-ready stacked bar data.
//!
//! One bar per service type, one stacked segment per status, and the
//! per-bar total drawn above each bar.

use serde::Serialize;

use crate::metrics::{MonthlyBreakdown, StatusBreakdown};
use crate::status::OrderStatus;

pub const OVERALL_CHART_TITLE: &str = "Volume de OS por Tipo e Status";
pub const MONTHLY_CHART_TITLE: &str = "Análise Mensal de OS por Tipo e Status";
pub const LEGEND_TITLE: &str = "Status da OS";

/// Fixed colour for the well-known status labels. Other labels are left to
/// the renderer's palette.
pub fn status_color(status: &OrderStatus) -> Option<&'static str> {
    match status.label() {
        "Pendente" => Some("lightblue"),
        "Cancelada" => Some("red"),
        "Conclusão do Serviço" => Some("#0047AB"),
        "EXECUTADA" => Some("darkslateblue"),
        "GERADA" => Some("grey"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub color: Option<&'static str>,
    /// One value per category, 0 where the status does not occur.
    pub values: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackedBarChart {
    pub title: String,
    pub legend_title: &'static str,
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
    /// Bar totals, aligned with `categories`.
    pub totals: Vec<u64>,
}

impl StackedBarChart {
    pub fn from_breakdown(title: impl Into<String>, breakdown: &StatusBreakdown) -> Self {
        let types: Vec<_> = breakdown.totals.iter().map(|t| t.service_type).collect();

        let mut statuses: Vec<&OrderStatus> = breakdown.counts.iter().map(|c| &c.status).collect();
        statuses.sort();
        statuses.dedup();

        let series = statuses
            .into_iter()
            .map(|status| ChartSeries {
                name: status.label().to_string(),
                color: status_color(status),
                values: types
                    .iter()
                    .map(|service_type| {
                        breakdown
                            .counts
                            .iter()
                            .find(|c| c.service_type == *service_type && &c.status == status)
                            .map_or(0, |c| c.count)
                    })
                    .collect(),
            })
            .collect();

        Self {
            title: title.into(),
            legend_title: LEGEND_TITLE,
            categories: types.iter().map(|t| t.label().to_string()).collect(),
            series,
            totals: breakdown.totals.iter().map(|t| t.total).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// One small-multiple per month, each with its own y scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetedChart {
    pub title: &'static str,
    pub facets: Vec<StackedBarChart>,
}

impl FacetedChart {
    pub fn from_monthly(monthly: &MonthlyBreakdown) -> Self {
        Self {
            title: MONTHLY_CHART_TITLE,
            facets: monthly
                .months
                .iter()
                .map(|month| StackedBarChart::from_breakdown(month.label(), &monthly.for_month(*month)))
                .collect(),
        }
    }
}
