//! Error types for scheduling and execution.

use fb_core::{BlockId, SignalType};
use fb_graph::{GraphError, PortRef};
use thiserror::Error;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// How a [`SchedError`] affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The run stops; the offending block is flagged.
    Fatal,
    /// The block is retired as `Unable`; the run carries on.
    Soft,
    /// The host asked the run to stop.
    Aborted,
}

/// Errors encountered while running a block graph.
#[derive(Error, Debug)]
pub enum SchedError {
    #[error("Block '{block}': no script registered under '{key}'")]
    ScriptNotFound { block: String, key: String },

    #[error("Block '{block}': script failed: {message}")]
    ScriptException { block: String, message: String },

    #[error("Block '{block}': script wrote to {port}, which is not an output port of this block")]
    InvalidOutputPort { block: String, port: PortRef },

    #[error("Block '{block}': output on {port} is {found}, port expects {expected}")]
    OutputTypeMismatch {
        block: String,
        port: PortRef,
        expected: SignalType,
        found: SignalType,
    },

    #[error("Block '{block}' could not be resolved after {attempts} attempts")]
    UnresolvableBlock { block: String, attempts: u32 },

    #[error("Simulation stopped by request in iteration {iteration}, segment {segment}")]
    SimulationAborted { iteration: u32, segment: u32 },

    #[error("Invalid feedback seed for {port}: {what}")]
    InvalidFeedbackSeed { port: PortRef, what: &'static str },

    #[error("Invalid settings: {what}")]
    InvalidSettings { what: &'static str },

    #[error("Settings could not be parsed: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

impl SchedError {
    pub fn severity(&self) -> Severity {
        match self {
            SchedError::UnresolvableBlock { .. } => Severity::Soft,
            SchedError::SimulationAborted { .. } => Severity::Aborted,
            _ => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Error returned by a block script.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ScriptError {
    pub message: String,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<fb_core::FbError> for ScriptError {
    fn from(e: fb_core::FbError) -> Self {
        ScriptError::new(e.to_string())
    }
}

/// Record of the block that caused a fatal error.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockFault {
    pub block: BlockId,
    pub message: String,
}
