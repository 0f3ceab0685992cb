//! Caller-owned scheduler context.

use std::collections::BTreeMap;

use fb_core::Signal;
use fb_graph::{BlockGraph, PortDirection, PortRef};
use serde::{Deserialize, Serialize};

use crate::control::RunControl;
use crate::error::{SchedError, SchedResult};
use crate::settings::SimulationSettings;
use crate::state::ExecutionState;

/// Counters for a run, updated live so they survive an aborted run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Iterations started.
    pub iterations: u32,
    /// Passes (segments) that reached their exit condition.
    pub passes: u32,
    /// Script invocations that completed successfully.
    pub invocations: u64,
    /// Blocks retired as `Unable`, summed over passes.
    pub unable: u64,
    /// Block polls across all passes.
    pub polls: u64,
}

/// Everything a run needs besides the graph and its scripts.
///
/// Owned by the caller and passed by reference into [`run`](crate::run); after
/// the run returns, successfully or not, the state stays here for inspection.
#[derive(Debug)]
pub struct SchedulerContext {
    settings: SimulationSettings,
    control: RunControl,
    pub(crate) seeds: BTreeMap<PortRef, Signal>,
    pub(crate) state: ExecutionState,
    pub(crate) pointer: usize,
    pub(crate) summary: RunSummary,
}

impl SchedulerContext {
    pub fn new(settings: SimulationSettings) -> SchedResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            control: RunControl::new(),
            seeds: BTreeMap::new(),
            state: ExecutionState::default(),
            pointer: 0,
            summary: RunSummary::default(),
        })
    }

    /// Use a control handle shared with the host.
    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    /// Value a feedback port holds before anything has been fed back.
    pub fn seed_feedback(&mut self, port: PortRef, signal: Signal) {
        self.seeds.insert(port, signal);
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    pub fn seeds(&self) -> &BTreeMap<PortRef, Signal> {
        &self.seeds
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Position of the next block the round-robin pass would poll.
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Seeds must target `InFeedback` ports of matching type.
    pub(crate) fn check_seeds(&self, graph: &BlockGraph) -> SchedResult<()> {
        for (&port, signal) in &self.seeds {
            let p = graph.port(port).ok_or(SchedError::InvalidFeedbackSeed {
                port,
                what: "port does not exist",
            })?;
            if p.direction != PortDirection::InFeedback {
                return Err(SchedError::InvalidFeedbackSeed {
                    port,
                    what: "port is not a feedback input",
                });
            }
            if p.signal_type != signal.signal_type() {
                return Err(SchedError::InvalidFeedbackSeed {
                    port,
                    what: "seed signal type differs from port",
                });
            }
        }
        Ok(())
    }

    /// Fresh state for a new run over `graph`.
    pub(crate) fn reset(&mut self, graph: &BlockGraph) {
        self.state = ExecutionState::for_graph(graph);
        self.pointer = 0;
        self.summary = RunSummary::default();
    }
}
