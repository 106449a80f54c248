//! Replay records from a JSON file (or an in-memory list) instead of the
//! database. Used for development without database access and in tests.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::ServiceOrderRecord;

use super::OrderSource;

enum Backing {
    File(PathBuf),
    Records(Vec<ServiceOrderRecord>),
}

pub struct FixtureSource {
    backing: Backing,
}

impl FixtureSource {
    /// Read records from a JSON array on every fetch.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            backing: Backing::File(path.as_ref().to_path_buf()),
        }
    }

    pub fn from_records(records: Vec<ServiceOrderRecord>) -> Self {
        Self {
            backing: Backing::Records(records),
        }
    }
}

impl OrderSource for FixtureSource {
    fn name(&self) -> &str {
        match self.backing {
            Backing::File(_) => "fixture-file",
            Backing::Records(_) => "fixture",
        }
    }

    fn fetch(&self) -> Result<Vec<ServiceOrderRecord>> {
        match &self.backing {
            Backing::Records(records) => Ok(records.clone()),
            Backing::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    Error::DataSource(format!("cannot read fixture {}: {e}", path.display()))
                })?;
                let mut records: Vec<ServiceOrderRecord> = serde_json::from_str(&text)?;
                for record in &mut records {
                    record.clear_pending_closure();
                }
                log::info!("Loaded {} service orders from {}", records.len(), path.display());
                Ok(records)
            }
        }
    }
}

/// Write records in the format [`FixtureSource::from_path`] reads.
pub fn write_fixture(path: impl AsRef<Path>, records: &[ServiceOrderRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    Ok(())
}
