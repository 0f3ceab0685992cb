//! A [`RunSink`] that keeps everything a run reports.

use fb_sched::{Progress, RunSink, SchedError};

use crate::types::BlockRecord;

type ProgressCallback<'a> = Box<dyn FnMut(&Progress) + 'a>;
type MessageCallback<'a> = Box<dyn FnMut(&str) + 'a>;

/// Collects per-pass block records, log lines and warnings, optionally
/// forwarding progress and messages to host callbacks as they arrive.
#[derive(Default)]
pub struct ResultsCollector<'a> {
    records: Vec<BlockRecord>,
    messages: Vec<String>,
    warnings: Vec<String>,
    last_progress: Option<Progress>,
    on_progress: Option<ProgressCallback<'a>>,
    on_message: Option<MessageCallback<'a>>,
}

impl<'a> ResultsCollector<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, f: impl FnMut(&Progress) + 'a) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn with_messages(mut self, f: impl FnMut(&str) + 'a) -> Self {
        self.on_message = Some(Box::new(f));
        self
    }

    pub fn records(&self) -> &[BlockRecord] {
        &self.records
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn last_progress(&self) -> Option<&Progress> {
        self.last_progress.as_ref()
    }

    /// Record of `block` for a given iteration and segment.
    pub fn record(&self, block: &str, iteration: u32, segment: u32) -> Option<&BlockRecord> {
        self.records
            .iter()
            .find(|r| r.name == block && r.iteration == iteration && r.segment == segment)
    }

    /// Most recent record of `block`.
    pub fn latest(&self, block: &str) -> Option<&BlockRecord> {
        self.records.iter().rev().find(|r| r.name == block)
    }

    pub fn into_parts(self) -> (Vec<BlockRecord>, Vec<String>) {
        (self.records, self.messages)
    }
}

impl RunSink for ResultsCollector<'_> {
    fn on_message(&mut self, message: &str) {
        if let Some(f) = self.on_message.as_mut() {
            f(message);
        }
        self.messages.push(message.to_string());
    }

    fn on_progress(&mut self, progress: &Progress) {
        if let Some(f) = self.on_progress.as_mut() {
            f(progress);
        }
        self.last_progress = Some(*progress);
    }

    fn on_warning(&mut self, error: &SchedError) {
        self.warnings.push(error.to_string());
    }

    fn on_results(&mut self, report: BlockRecord) {
        self.records.push(report);
    }
}
