//! Host-provided sinks for log lines, progress and per-block results.

use fb_core::{BlockId, ParameterTable, ResultsTable};
use serde::{Deserialize, Serialize};

use crate::error::SchedError;
use crate::state::BlockStatus;

/// Numeric progress, emitted after every block completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Blocks completed in the current pass.
    pub blocks_completed: usize,
    pub blocks_total: usize,
    pub iteration: u32,
    pub iterations_total: u32,
    pub segment: u32,
    pub segments_total: u32,
}

impl Progress {
    /// Fraction of the whole run finished, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        let passes = (self.iterations_total as f64) * (self.segments_total as f64);
        if passes == 0.0 || self.blocks_total == 0 {
            return 0.0;
        }
        let done_passes = (self.iteration.saturating_sub(1) * self.segments_total
            + self.segment.saturating_sub(1)) as f64;
        let pass_frac = self.blocks_completed as f64 / self.blocks_total as f64;
        ((done_passes + pass_frac) / passes).clamp(0.0, 1.0)
    }
}

/// One poll of one block by the round-robin pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollRecord {
    pub position: usize,
    pub block: BlockId,
    /// Status after the poll was handled.
    pub status: BlockStatus,
    pub retry_count: u32,
}

/// Results and parameters of one block at the end of a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockReport {
    pub iteration: u32,
    pub segment: u32,
    pub block: BlockId,
    pub name: String,
    pub status: BlockStatus,
    pub retry_count: u32,
    pub parameters: ParameterTable,
    pub results: ResultsTable,
}

/// Receives everything the scheduler reports to its host.
///
/// All methods default to doing nothing.
pub trait RunSink {
    /// One human-readable line per state transition.
    fn on_message(&mut self, _message: &str) {}

    fn on_progress(&mut self, _progress: &Progress) {}

    fn on_poll(&mut self, _poll: &PollRecord) {}

    /// Non-fatal problems such as a block retired as `Unable`.
    fn on_warning(&mut self, _error: &SchedError) {}

    /// Handed one report per block at the end of every pass.
    fn on_results(&mut self, _report: BlockReport) {}
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RunSink for NullSink {}

/// Sink that forwards progress to a closure, in the style of a progress callback.
pub struct ProgressFn<F>(pub F);

impl<F: FnMut(&Progress)> RunSink for ProgressFn<F> {
    fn on_progress(&mut self, progress: &Progress) {
        (self.0)(progress)
    }
}
