//! Result data types.

use fb_sched::{BlockReport, RunSummary, SchedError, SimulationSettings};
use serde::{Deserialize, Serialize};

pub type RunId = String;

/// One line of `records.jsonl`: a block's state at the end of a pass.
pub type BlockRecord = BlockReport;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    /// Name of the scenario or graph that was run.
    pub scenario: String,
    pub timestamp: String,
    pub outcome: RunOutcome,
    pub settings: SimulationSettings,
    pub summary: RunSummary,
    pub engine_version: String,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunOutcome {
    Finished,
    Stopped { iteration: u32, segment: u32 },
    Failed { message: String },
}

impl RunOutcome {
    /// Classify the result of `fb_sched::run`.
    pub fn from_result<T>(result: &Result<T, SchedError>) -> Self {
        match result {
            Ok(_) => RunOutcome::Finished,
            Err(SchedError::SimulationAborted { iteration, segment }) => RunOutcome::Stopped {
                iteration: *iteration,
                segment: *segment,
            },
            Err(e) => RunOutcome::Failed {
                message: e.to_string(),
            },
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, RunOutcome::Finished)
    }
}
