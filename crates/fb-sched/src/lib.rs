//! Execution scheduler for functional block graphs.
//!
//! Given a [`BlockGraph`](fb_graph::BlockGraph) whose blocks name scripts in a
//! [`ScriptRegistry`], [`run`] decides when each block computes, moves the
//! produced signals along links, and repeats the whole graph for a number of
//! iterations. Cycles are broken with feedback segments: values arriving on
//! `InFeedback` ports only become visible in the following segment.
//!
//! # Architecture
//!
//! - [`ExecutionState`] holds per-block status and per-port readiness
//! - a round-robin pass polls blocks in graph order until every block is
//!   `Complete` or `Unable`; blocks that stay `NotReady` are retried a bounded
//!   number of times
//! - the controller drives iterations and segments and hands results to a
//!   host [`RunSink`]
//!
//! Execution is single threaded. Stop and pause are cooperative flags on a
//! [`RunControl`] that a host thread may hold.
//!
//! # Example
//!
//! ```
//! use fb_core::{Signal, SignalType, Waveform};
//! use fb_graph::{BlockGraph, PortDirection};
//! use fb_sched::{
//!     BlockStatus, ExecutionPlan, NullSink, SchedulerContext, ScriptOutput, ScriptRegistry,
//!     SimulationSettings, run, script_fn,
//! };
//!
//! let mut graph = BlockGraph::new();
//! let src = graph.add_block("Source", "source").unwrap();
//! let dst = graph.add_block("Sink", "sink").unwrap();
//! let out = graph.add_port(src, "out", PortDirection::Out, SignalType::Electrical).unwrap();
//! let inp = graph.add_port(dst, "in", PortDirection::In, SignalType::Electrical).unwrap();
//! graph.add_link(out, inp).unwrap();
//!
//! let registry = ScriptRegistry::new()
//!     .with("source", script_fn(|call| {
//!         let port = call.output_port("out")?;
//!         let wave = Waveform::new(0.0, 1.0e9, vec![1.0; 8]);
//!         Ok(ScriptOutput::keep(call.parameters).with_output(port, Signal::Electrical(wave)))
//!     }))
//!     .with("sink", script_fn(|call| Ok(ScriptOutput::keep(call.parameters))));
//!
//! let plan = ExecutionPlan::resolve(&graph, &registry).unwrap();
//! let mut ctx = SchedulerContext::new(SimulationSettings::default()).unwrap();
//! run(&mut ctx, &plan, &mut NullSink).unwrap();
//!
//! assert_eq!(ctx.state().status(dst), Some(BlockStatus::Complete));
//! assert!(ctx.state().check_exit());
//! ```

pub mod context;
pub mod control;
pub mod controller;
pub mod error;
pub mod plan;
pub mod script;
pub mod settings;
pub mod sink;
pub mod state;

// Internal modules
mod invoke;
mod propagate;
mod round_robin;

// Re-exports for public API
pub use context::{RunSummary, SchedulerContext};
pub use control::RunControl;
pub use controller::run;
pub use error::{BlockFault, SchedError, SchedResult, ScriptError, Severity};
pub use plan::ExecutionPlan;
pub use script::{
    BlockScript, OrderedSignals, PortSignal, ScriptCall, ScriptOutput, ScriptRegistry, script_fn,
};
pub use settings::SimulationSettings;
pub use sink::{BlockReport, NullSink, PollRecord, Progress, ProgressFn, RunSink};
pub use state::{BlockState, BlockStatus, ExecutionState, PortState};
