//! Live execution state: block statuses and port readiness.
//!
//! Block and port entries are stored by scheduling position, parallel to
//! `BlockGraph::blocks()`, so the scheduler addresses them by index.

use std::collections::{BTreeMap, HashMap};

use fb_core::{BlockId, ParameterTable, ResultsTable, Signal};
use fb_graph::{BlockGraph, PortDirection, PortRef};
use serde::{Deserialize, Serialize};

use crate::error::BlockFault;

/// Status of a block within the current pass.
///
/// `NotReady -> Ready -> Complete`, or `NotReady -> Unable`. `Complete` and
/// `Unable` are terminal until the next segment or iteration reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockStatus {
    NotReady,
    Ready,
    Complete,
    Unable,
}

impl BlockStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, BlockStatus::Complete | BlockStatus::Unable)
    }
}

/// Per-block live state.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockState {
    pub id: BlockId,
    pub status: BlockStatus,
    pub retry_count: u32,
    /// Parameters as last returned by the script.
    pub parameters: ParameterTable,
    /// Results of the last invocation in the current pass.
    pub results: ResultsTable,
}

/// Per-port live state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortState {
    pub data_ready: bool,
    pub signal: Option<Signal>,
}

impl PortState {
    fn ready(signal: Option<Signal>) -> Self {
        Self {
            data_ready: true,
            signal,
        }
    }
}

/// Status, retry counts, port readiness and signals for one run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionState {
    current_iteration: u32,
    current_segment: u32,
    blocks: Vec<BlockState>,
    ports: Vec<Vec<PortState>>,
    index: HashMap<BlockId, usize>,
    /// Feedback deliveries waiting for the next segment, keyed by (block, port) position.
    staged: BTreeMap<(usize, usize), Signal>,
    fault: Option<BlockFault>,
}

impl ExecutionState {
    /// Fresh state shaped after `graph`. Everything starts `NotReady`.
    pub fn for_graph(graph: &BlockGraph) -> Self {
        let blocks = graph
            .blocks()
            .iter()
            .map(|b| BlockState {
                id: b.id,
                status: BlockStatus::NotReady,
                retry_count: 0,
                parameters: b.parameters.clone(),
                results: ResultsTable::new(),
            })
            .collect();
        let ports = graph
            .blocks()
            .iter()
            .map(|b| vec![PortState::default(); b.ports.len()])
            .collect();
        let index = graph
            .blocks()
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id, i))
            .collect();
        Self {
            blocks,
            ports,
            index,
            ..Default::default()
        }
    }

    /// Prepare for a new iteration.
    ///
    /// Parameters return to their design values. Feedback ports take their
    /// seed value on the first iteration, and on every iteration when
    /// `persist_feedback` is off; otherwise they keep what the previous
    /// iteration left behind.
    pub fn begin_iteration(
        &mut self,
        graph: &BlockGraph,
        iteration: u32,
        seeds: &BTreeMap<PortRef, Signal>,
        persist_feedback: bool,
    ) {
        self.current_iteration = iteration;
        self.current_segment = 0;
        self.fault = None;

        for (state, block) in self.blocks.iter_mut().zip(graph.blocks()) {
            state.parameters = block.parameters.clone();
        }

        if iteration > 1 && persist_feedback {
            return;
        }
        self.staged.clear();
        for (bi, block) in graph.blocks().iter().enumerate() {
            for (pi, port) in block.ports.iter().enumerate() {
                if port.direction == PortDirection::InFeedback {
                    let seed = seeds.get(&PortRef::new(block.id, port.id)).cloned();
                    self.ports[bi][pi] = PortState::ready(seed);
                }
            }
        }
    }

    /// Prepare for a new segment (or the single pass of a non-feedback run).
    ///
    /// Block status and retry counts reset, regular ports lose their data,
    /// and staged feedback deliveries become visible. Feedback ports without
    /// a staged delivery keep their previous value.
    pub fn begin_segment(&mut self, graph: &BlockGraph, segment: u32) {
        self.current_segment = segment;

        for state in &mut self.blocks {
            state.status = BlockStatus::NotReady;
            state.retry_count = 0;
            state.results = ResultsTable::new();
        }

        for (bi, block) in graph.blocks().iter().enumerate() {
            for (pi, port) in block.ports.iter().enumerate() {
                let slot = &mut self.ports[bi][pi];
                if port.signal_type.is_disabled() {
                    *slot = PortState::ready(None);
                } else if port.direction != PortDirection::InFeedback {
                    *slot = PortState::default();
                }
            }
        }

        for ((bi, pi), signal) in std::mem::take(&mut self.staged) {
            self.ports[bi][pi] = PortState::ready(Some(signal));
        }
    }

    /// Status of the block at position `idx`.
    ///
    /// Settled statuses are returned as cached. Otherwise the block is
    /// `Ready` iff every gating `In` port holds data. No side effects.
    pub(crate) fn check_status(&self, graph: &BlockGraph, idx: usize) -> BlockStatus {
        let cached = self.blocks[idx].status;
        if cached.is_settled() {
            return cached;
        }
        let slots = &self.ports[idx];
        let ready = graph.blocks()[idx].gating_ports().all(|port| {
            slots
                .get(port.id.index() as usize)
                .is_some_and(|state| state.data_ready)
        });
        if ready {
            BlockStatus::Ready
        } else {
            BlockStatus::NotReady
        }
    }

    /// True iff every block is `Complete` or `Unable`.
    pub fn check_exit(&self) -> bool {
        self.blocks.iter().all(|b| b.status.is_settled())
    }

    pub fn current_iteration(&self) -> u32 {
        self.current_iteration
    }

    pub fn current_segment(&self) -> u32 {
        self.current_segment
    }

    pub fn blocks(&self) -> &[BlockState] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&BlockState> {
        self.index.get(&id).map(|&i| &self.blocks[i])
    }

    pub fn status(&self, id: BlockId) -> Option<BlockStatus> {
        self.block(id).map(|b| b.status)
    }

    pub fn port(&self, port: PortRef) -> Option<&PortState> {
        let bi = *self.index.get(&port.block)?;
        self.ports[bi].get(port.port.index() as usize)
    }

    /// Signal currently held by `port`, if any.
    pub fn signal(&self, port: PortRef) -> Option<&Signal> {
        self.port(port)?.signal.as_ref()
    }

    /// Whether a feedback delivery to `port` is waiting for the next segment.
    pub fn has_staged(&self, port: PortRef) -> bool {
        let Some(&bi) = self.index.get(&port.block) else {
            return false;
        };
        self.staged.contains_key(&(bi, port.port.index() as usize))
    }

    /// The block that caused the last fatal error, if any.
    pub fn fault(&self) -> Option<&BlockFault> {
        self.fault.as_ref()
    }

    pub(crate) fn block_mut(&mut self, idx: usize) -> &mut BlockState {
        &mut self.blocks[idx]
    }

    pub(crate) fn port_slots(&self, idx: usize) -> &[PortState] {
        &self.ports[idx]
    }

    /// Write a value into a port and mark it ready.
    pub(crate) fn deliver(&mut self, bi: usize, pi: usize, signal: Signal) {
        self.ports[bi][pi] = PortState::ready(Some(signal));
    }

    /// Hold a feedback value until the next segment begins.
    pub(crate) fn stage(&mut self, bi: usize, pi: usize, signal: Signal) {
        self.staged.insert((bi, pi), signal);
    }

    pub(crate) fn set_fault(&mut self, fault: BlockFault) {
        self.fault = Some(fault);
    }
}
