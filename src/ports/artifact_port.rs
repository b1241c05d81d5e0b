//! Run artifact output port.

use crate::domain::error::PremarketError;
use crate::domain::pipeline::EngineOutput;
use crate::domain::summary::RunSummary;

pub trait ArtifactPort {
    /// Persist the scored rows, the Top-N, and the run summary.
    fn write_run(&self, output: &EngineOutput, summary: &RunSummary) -> Result<(), PremarketError>;
}
