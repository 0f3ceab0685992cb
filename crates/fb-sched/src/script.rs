//! Block script contract and registration table.
//!
//! A block names its script by key; the key is resolved once against a
//! [`ScriptRegistry`] when an [`ExecutionPlan`](crate::ExecutionPlan) is built.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fb_core::{ParameterTable, PortId, ResultsTable, Signal};
use fb_graph::{Block, PortDirection};

use crate::error::ScriptError;
use crate::settings::SimulationSettings;

/// A signal bound to a block-local port.
#[derive(Debug, Clone, PartialEq)]
pub struct PortSignal {
    pub port: PortId,
    pub signal: Signal,
}

impl PortSignal {
    pub fn new(port: PortId, signal: Signal) -> Self {
        Self { port, signal }
    }
}

/// Signals in port order.
pub type OrderedSignals = Vec<PortSignal>;

/// Everything a script sees for one invocation.
#[derive(Debug)]
pub struct ScriptCall<'a> {
    pub block: &'a Block,
    pub iteration: u32,
    pub segment: u32,
    /// Inputs currently holding data, in port order. `InFeedback` ports are
    /// included when they carry a value.
    pub inputs: &'a [PortSignal],
    pub parameters: &'a ParameterTable,
    pub settings: &'a SimulationSettings,
}

impl ScriptCall<'_> {
    /// Input signal arriving on the port called `name`.
    pub fn input(&self, name: &str) -> Option<&Signal> {
        let port = self.block.port_by_name(name)?;
        self.inputs
            .iter()
            .find(|s| s.port == port.id)
            .map(|s| &s.signal)
    }

    /// Id of the output port called `name`.
    pub fn output_port(&self, name: &str) -> Result<PortId, ScriptError> {
        self.block
            .port_by_name(name)
            .filter(|p| p.direction == PortDirection::Out)
            .map(|p| p.id)
            .ok_or_else(|| {
                ScriptError::new(format!("block '{}' has no output '{}'", self.block.name, name))
            })
    }
}

/// What a script hands back on success.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptOutput {
    /// Each entry names the `Out` port it belongs to.
    pub outputs: OrderedSignals,
    /// Replaces the block's live parameters.
    pub parameters: ParameterTable,
    pub results: ResultsTable,
}

impl ScriptOutput {
    /// Output that keeps the caller's parameters unchanged.
    pub fn keep(parameters: &ParameterTable) -> Self {
        Self {
            parameters: parameters.clone(),
            ..Default::default()
        }
    }

    pub fn with_output(mut self, port: PortId, signal: Signal) -> Self {
        self.outputs.push(PortSignal::new(port, signal));
        self
    }

    pub fn with_results(mut self, results: ResultsTable) -> Self {
        self.results = results;
        self
    }
}

/// The computation behind a block. Opaque to the scheduler.
pub trait BlockScript: Send + Sync {
    fn run(&self, call: &ScriptCall<'_>) -> Result<ScriptOutput, ScriptError>;
}

impl<F> BlockScript for F
where
    F: Fn(&ScriptCall<'_>) -> Result<ScriptOutput, ScriptError> + Send + Sync,
{
    fn run(&self, call: &ScriptCall<'_>) -> Result<ScriptOutput, ScriptError> {
        self(call)
    }
}

/// Pin a closure to the script signature so it can be registered directly.
pub fn script_fn<F>(f: F) -> F
where
    F: Fn(&ScriptCall<'_>) -> Result<ScriptOutput, ScriptError> + Send + Sync,
{
    f
}

/// Maps stable script keys to script implementations.
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    scripts: HashMap<String, Arc<dyn BlockScript>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `script` under `key`, replacing any previous entry.
    pub fn register(&mut self, key: impl Into<String>, script: impl BlockScript + 'static) {
        self.scripts.insert(key.into(), Arc::new(script));
    }

    pub fn with(mut self, key: impl Into<String>, script: impl BlockScript + 'static) -> Self {
        self.register(key, script);
        self
    }

    pub fn resolve(&self, key: &str) -> Option<Arc<dyn BlockScript>> {
        self.scripts.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.scripts.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.scripts.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
