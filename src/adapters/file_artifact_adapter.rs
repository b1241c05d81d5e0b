//! Writes run artifacts as JSON and CSV files into one output directory.

use crate::adapters::artifact_payload::{
    self, FULL_WATCHLIST_FILE, RUN_SUMMARY_FILE, TOP_N_FILE, WATCHLIST_CSV_FILE,
};
use crate::adapters::csv_adapter;
use crate::domain::error::PremarketError;
use crate::domain::pipeline::EngineOutput;
use crate::domain::summary::RunSummary;
use crate::ports::artifact_port::ArtifactPort;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

pub struct FileArtifactAdapter {
    out_dir: PathBuf,
}

impl FileArtifactAdapter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), PremarketError> {
        let path = self.out_dir.join(name);
        let body = serde_json::to_vec_pretty(value).map_err(|e| PremarketError::Artifact {
            artifact: name.to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&path, body).map_err(|e| PremarketError::Artifact {
            artifact: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "wrote artifact");
        Ok(())
    }
}

impl ArtifactPort for FileArtifactAdapter {
    fn write_run(&self, output: &EngineOutput, summary: &RunSummary) -> Result<(), PremarketError> {
        fs::create_dir_all(&self.out_dir).map_err(|e| PremarketError::Artifact {
            artifact: self.out_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        self.write_json(FULL_WATCHLIST_FILE, &artifact_payload::full_watchlist(output, summary))?;
        self.write_json(TOP_N_FILE, &artifact_payload::top_n(output, summary))?;
        csv_adapter::write_watchlist_csv(
            &self.out_dir.join(WATCHLIST_CSV_FILE),
            &artifact_payload::watchlist_rows(output),
        )?;
        self.write_json(RUN_SUMMARY_FILE, summary)?;

        tracing::info!(out_dir = %self.out_dir.display(), "artifacts written");
        Ok(())
    }
}
