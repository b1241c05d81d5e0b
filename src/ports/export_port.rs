//! Raw export acquisition port.

use crate::domain::error::PremarketError;
use chrono::NaiveDate;
use std::path::PathBuf;

/// A raw export on local disk, ready to be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredExport {
    pub path: PathBuf,
    /// True when a cached file was used instead of a fresh download.
    pub used_cache: bool,
}

pub trait ExportPort {
    fn acquire(&self, run_date: NaiveDate, use_cache: bool) -> Result<AcquiredExport, PremarketError>;
}

/// Downloads the export body. Implemented over HTTP in production.
pub trait ExportFetcher {
    fn fetch(&self) -> Result<Vec<u8>, PremarketError>;
}
