pub mod fixture;
pub mod postgres;

pub use self::fixture::FixtureSource;
pub use self::postgres::PostgresSource;

use crate::error::Result;
use crate::model::ServiceOrderRecord;

/// Somewhere service orders can be read from.
///
/// `fetch` is blocking; [`SnapshotCache`](crate::cache::SnapshotCache) runs it
/// on tokio's blocking pool.
pub trait OrderSource: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Read every service order in scope.
    fn fetch(&self) -> Result<Vec<ServiceOrderRecord>>;
}
