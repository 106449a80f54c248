//! Everything the dashboard surface renders for one filter selection.

pub mod chart;

pub use chart::{status_color, ChartSeries, FacetedChart, StackedBarChart};

use serde::Serialize;

use crate::date_util::{format_count, format_rate};
use crate::export::{detail_rows, DetailRow};
use crate::filter::{filter_records, Selection};
use crate::metrics::{
    compute_breakdown, compute_kpis, compute_monthly_breakdown, MonthlyBreakdown, StatusBreakdown,
    SummaryKpis,
};
use crate::model::ServiceOrderRecord;
use crate::month::MonthKey;

pub const LOAD_FAILURE_WARNING: &str =
    "Não foi possível carregar os dados. Verifique a conexão com o banco de dados.";
pub const SELECT_MONTH_PROMPT: &str =
    "Selecione pelo menos um mês para visualizar a análise detalhada.";

/// KPI values formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiCards {
    pub total_generated: String,
    pub total_completed: String,
    pub completion_rate: String,
}

impl From<&SummaryKpis> for KpiCards {
    fn from(kpis: &SummaryKpis) -> Self {
        Self {
            total_generated: format_count(kpis.total_generated),
            total_completed: format_count(kpis.total_completed),
            completion_rate: format_rate(kpis.completion_rate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MonthlyView {
    Ready {
        breakdown: MonthlyBreakdown,
        chart: FacetedChart,
    },
    /// No month selected; the surface shows `prompt` instead of the chart.
    Suppressed { prompt: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Set when the load failed; the rest of the view is then empty.
    pub warning: Option<&'static str>,
    pub load_error: Option<String>,
    pub kpis: SummaryKpis,
    pub kpi_cards: KpiCards,
    pub breakdown: StatusBreakdown,
    pub overall_chart: StackedBarChart,
    /// Months present in the filtered records, offered by the month picker.
    pub available_months: Vec<MonthKey>,
    pub monthly: MonthlyView,
    /// Only populated when the detail table is toggled on.
    pub details: Option<Vec<DetailRow>>,
}

impl DashboardView {
    /// Build the view for `selection` over a loaded snapshot.
    pub fn build(
        records: &[ServiceOrderRecord],
        selection: &Selection,
        show_details: bool,
    ) -> Self {
        let filtered = filter_records(records, selection);
        log::debug!(
            "Selection kept {} of {} records",
            filtered.len(),
            records.len()
        );

        let kpis = compute_kpis(&filtered);
        let breakdown = compute_breakdown(&filtered);
        let overall_chart =
            StackedBarChart::from_breakdown(chart::OVERALL_CHART_TITLE, &breakdown);

        let available_months = selection.available_months(records);

        let monthly = if selection.months.is_empty() {
            MonthlyView::Suppressed {
                prompt: SELECT_MONTH_PROMPT,
            }
        } else {
            let breakdown = compute_monthly_breakdown(&filtered, &selection.months);
            let chart = FacetedChart::from_monthly(&breakdown);
            MonthlyView::Ready { breakdown, chart }
        };

        Self {
            warning: None,
            load_error: None,
            kpi_cards: KpiCards::from(&kpis),
            kpis,
            breakdown,
            overall_chart,
            available_months: available_months.into_iter().collect(),
            monthly,
            details: show_details.then(|| detail_rows(&filtered)),
        }
    }

    /// Mark the view as built from a failed load.
    pub fn with_load_error(mut self, error: impl Into<String>) -> Self {
        self.warning = Some(LOAD_FAILURE_WARNING);
        self.load_error = Some(error.into());
        self
    }
}
