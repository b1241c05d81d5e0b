//! Same-day export cache with TTL and fallback to the latest cached export.
//!
//! Layout: `<raw_dir>/<YYYY-MM-DD>/finviz_elite.csv`.

use crate::domain::error::PremarketError;
use crate::ports::export_port::{AcquiredExport, ExportFetcher, ExportPort};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const EXPORT_FILE_NAME: &str = "finviz_elite.csv";
pub const DEFAULT_TTL_MIN: u64 = 60;

pub struct CachedExportAdapter {
    raw_dir: PathBuf,
    ttl: Duration,
    fetcher: Option<Box<dyn ExportFetcher>>,
}

impl CachedExportAdapter {
    /// `fetcher` is `None` when no export URL is configured; only a fresh
    /// same-day cache can then satisfy a run.
    pub fn new(raw_dir: impl Into<PathBuf>, ttl: Duration, fetcher: Option<Box<dyn ExportFetcher>>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            ttl,
            fetcher,
        }
    }

    pub fn export_path(&self, run_date: NaiveDate) -> PathBuf {
        self.raw_dir
            .join(run_date.format("%Y-%m-%d").to_string())
            .join(EXPORT_FILE_NAME)
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let age = fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok());
        match age {
            Some(age) => age < self.ttl,
            // Timestamps in the future count as fresh.
            None => path.is_file() && !self.ttl.is_zero(),
        }
    }

    /// Cached export from the lexicographically latest date directory.
    fn latest_cached(&self) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.raw_dir).ok()?;
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.join(EXPORT_FILE_NAME).is_file())
            .collect();
        dirs.sort();
        dirs.pop().map(|d| d.join(EXPORT_FILE_NAME))
    }

    fn store(&self, path: &Path, body: &[u8]) -> Result<(), PremarketError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("csv.part");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn download(&self, fetcher: &dyn ExportFetcher, path: &Path) -> Result<(), PremarketError> {
        let body = fetcher.fetch()?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(PremarketError::Acquisition {
                reason: "downloaded export is empty".into(),
            });
        }
        self.store(path, &body)?;
        tracing::info!(path = %path.display(), bytes = body.len(), "downloaded export");
        Ok(())
    }
}

impl ExportPort for CachedExportAdapter {
    fn acquire(&self, run_date: NaiveDate, use_cache: bool) -> Result<AcquiredExport, PremarketError> {
        let path = self.export_path(run_date);

        if use_cache && self.is_fresh(&path) {
            tracing::info!(path = %path.display(), "using same-day cached export");
            return Ok(AcquiredExport {
                path,
                used_cache: true,
            });
        }

        let Some(fetcher) = self.fetcher.as_deref() else {
            return Err(PremarketError::Acquisition {
                reason: "FINVIZ_EXPORT_URL is not set".into(),
            });
        };

        match self.download(fetcher, &path) {
            Ok(()) => Ok(AcquiredExport {
                path,
                used_cache: false,
            }),
            Err(err) => match self.latest_cached() {
                Some(fallback) => {
                    tracing::warn!(
                        error = %err,
                        fallback = %fallback.display(),
                        "download failed, falling back to cached export"
                    );
                    Ok(AcquiredExport {
                        path: fallback,
                        used_cache: true,
                    })
                }
                None => Err(PremarketError::Acquisition {
                    reason: format!("{err}; no cached export to fall back to"),
                }),
            },
        }
    }
}
