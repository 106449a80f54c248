pub mod cache;
pub mod catalog;
pub mod config;
pub mod date_util;
pub mod error;
pub mod export;
pub mod filter;
pub mod metrics;
pub mod model;
pub mod month;
pub mod source;
pub mod status;
pub mod view;

pub use cache::{LoadedOrders, SnapshotCache, CACHE_TTL};
pub use catalog::ServiceType;
pub use config::DbConfig;
pub use error::{Error, Result};
pub use filter::{DateRange, FilterOptions, Selection};
pub use metrics::{MonthlyBreakdown, StatusBreakdown, SummaryKpis};
pub use model::ServiceOrderRecord;
pub use month::MonthKey;
pub use source::{FixtureSource, OrderSource, PostgresSource};
pub use status::OrderStatus;
pub use view::{DashboardView, MonthlyView};

use std::sync::Arc;

/// Main entry point for the service-order dashboard.
///
/// Owns the memoized snapshot; every view is recomputed from it on demand.
pub struct OrderDashboard {
    cache: SnapshotCache,
}

impl OrderDashboard {
    pub fn new(source: Arc<dyn OrderSource>) -> Self {
        Self {
            cache: SnapshotCache::new(source),
        }
    }

    pub fn from_config(config: DbConfig) -> Self {
        Self::new(Arc::new(PostgresSource::new(config)))
    }

    /// Access the cache (for tests and tooling that need TTL control).
    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Load the current snapshot. Never fails; see [`LoadedOrders::error`].
    pub async fn load(&self) -> LoadedOrders {
        self.cache.get().await
    }

    /// Filter choices and their defaults for the current snapshot.
    pub async fn filter_options(&self) -> FilterOptions {
        FilterOptions::from_records(&self.load().await.records)
    }

    /// Build the dashboard for `selection`. `None` selects everything.
    pub async fn view(&self, selection: Option<&Selection>, show_details: bool) -> DashboardView {
        let loaded = self.load().await;
        let default_selection;
        let selection = match selection {
            Some(s) => s,
            None => {
                default_selection = Selection::all(&FilterOptions::from_records(&loaded.records));
                &default_selection
            }
        };

        let view = DashboardView::build(&loaded.records, selection, show_details);
        match loaded.error {
            Some(e) => view.with_load_error(e),
            None => view,
        }
    }

    /// CSV export bytes for `selection`.
    pub async fn export_csv(&self, selection: &Selection) -> Vec<u8> {
        let loaded = self.load().await;
        let filtered = filter::filter_records(&loaded.records, selection);
        export::to_csv(&filtered)
    }
}
