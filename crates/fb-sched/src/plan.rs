//! Graph plus resolved scripts, ready to run.

use std::fmt;
use std::sync::Arc;

use fb_graph::BlockGraph;

use crate::error::{SchedError, SchedResult};
use crate::script::{BlockScript, ScriptRegistry};

/// A validated graph whose script keys have all been resolved.
pub struct ExecutionPlan<'g> {
    graph: &'g BlockGraph,
    scripts: Vec<Arc<dyn BlockScript>>,
}

impl<'g> ExecutionPlan<'g> {
    /// Validate `graph` and resolve every block's script key once.
    ///
    /// Fails with `ScriptNotFound` naming the first block whose key is not
    /// registered.
    pub fn resolve(graph: &'g BlockGraph, registry: &ScriptRegistry) -> SchedResult<Self> {
        graph.validate()?;
        let scripts = graph
            .blocks()
            .iter()
            .map(|b| {
                registry
                    .resolve(&b.script)
                    .ok_or_else(|| SchedError::ScriptNotFound {
                        block: b.name.clone(),
                        key: b.script.clone(),
                    })
            })
            .collect::<SchedResult<Vec<_>>>()?;
        Ok(Self { graph, scripts })
    }

    pub fn graph(&self) -> &'g BlockGraph {
        self.graph
    }

    pub(crate) fn script(&self, idx: usize) -> &dyn BlockScript {
        self.scripts[idx].as_ref()
    }
}

impl fmt::Debug for ExecutionPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPlan")
            .field("blocks", &self.graph.len())
            .finish()
    }
}
