#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use fb_core::{Signal, SignalType, Table, Waveform};
use fb_graph::{BlockGraph, PortDirection, PortRef};
use fb_sched::{
    BlockReport, PollRecord, Progress, RunSink, SchedError, ScriptError, ScriptOutput,
    ScriptRegistry, script_fn,
};

pub fn electrical(v: f64) -> Signal {
    Signal::Electrical(Waveform::new(0.0, 1.0, vec![v; 4]))
}

pub fn mean(signal: &Signal) -> f64 {
    signal.waveform().and_then(Waveform::mean).unwrap_or(f64::NAN)
}

/// Shared record of which blocks were invoked, in order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Scripts used across the scenario tests.
///
/// - `source`: writes `level` (default 1.0, plus the segment number when
///   `ramp` is set) to every output
/// - `pass`: forwards the mean of all inputs to every output and records it
/// - `fail`: always errors
pub fn registry(log: &CallLog) -> ScriptRegistry {
    let l1 = log.clone();
    let l2 = log.clone();
    let l3 = log.clone();
    ScriptRegistry::new()
        .with(
            "source",
            script_fn(move |call| {
                l1.lock().unwrap().push(call.block.name.clone());
                let mut level = call.parameters.real_or("level", 1.0)?;
                if call.parameters.contains_key("ramp") {
                    level += call.segment as f64;
                }
                let mut out = ScriptOutput::keep(call.parameters);
                for p in call.block.outputs() {
                    out = out.with_output(p.id, electrical(level));
                }
                Ok(out)
            }),
        )
        .with(
            "pass",
            script_fn(move |call| {
                l2.lock().unwrap().push(call.block.name.clone());
                let sum: f64 = call.inputs.iter().map(|i| mean(&i.signal)).sum();
                let mut out = ScriptOutput::keep(call.parameters)
                    .with_results(Table::new().with("input", sum).with("inputs", call.inputs.len() as i64));
                for p in call.block.outputs() {
                    out = out.with_output(p.id, electrical(sum));
                }
                Ok(out)
            }),
        )
        .with(
            "fail",
            script_fn(move |call| {
                l3.lock().unwrap().push(call.block.name.clone());
                Err(ScriptError::new("detector saturated"))
            }),
        )
}

pub fn out(g: &mut BlockGraph, block: fb_core::BlockId, name: &str) -> PortRef {
    g.add_port(block, name, PortDirection::Out, SignalType::Electrical)
        .unwrap()
}

pub fn inp(g: &mut BlockGraph, block: fb_core::BlockId, name: &str) -> PortRef {
    g.add_port(block, name, PortDirection::In, SignalType::Electrical)
        .unwrap()
}

pub fn fb(g: &mut BlockGraph, block: fb_core::BlockId, name: &str) -> PortRef {
    g.add_port(block, name, PortDirection::InFeedback, SignalType::Electrical)
        .unwrap()
}

/// Sink that keeps everything it is given.
#[derive(Default)]
pub struct Recorder {
    pub messages: Vec<String>,
    pub progress: Vec<Progress>,
    pub polls: Vec<PollRecord>,
    pub warnings: Vec<String>,
    pub reports: Vec<BlockReport>,
}

impl Recorder {
    pub fn report(&self, name: &str, iteration: u32, segment: u32) -> Option<&BlockReport> {
        self.reports
            .iter()
            .find(|r| r.name == name && r.iteration == iteration && r.segment == segment)
    }
}

impl RunSink for Recorder {
    fn on_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn on_progress(&mut self, progress: &Progress) {
        self.progress.push(*progress);
    }

    fn on_poll(&mut self, poll: &PollRecord) {
        self.polls.push(*poll);
    }

    fn on_warning(&mut self, error: &SchedError) {
        self.warnings.push(error.to_string());
    }

    fn on_results(&mut self, report: BlockReport) {
        self.reports.push(report);
    }
}
