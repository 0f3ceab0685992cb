//! Moves completed block outputs along links.

use fb_graph::{BlockGraph, PortDirection, PortRef};
use tracing::trace;

use crate::script::{OrderedSignals, PortSignal};
use crate::state::ExecutionState;

/// Deliver the outputs of the block at `idx` to linked inputs.
///
/// Each destination receives its own copy of the signal; the producing port
/// keeps one too. Deliveries to `InFeedback` ports are staged and only become
/// visible when the next segment begins. Returns the number of links fed.
pub(crate) fn propagate(
    graph: &BlockGraph,
    state: &mut ExecutionState,
    idx: usize,
    outputs: OrderedSignals,
) -> usize {
    let block = &graph.blocks()[idx];
    let mut fed = 0;

    for PortSignal { port, signal } in outputs {
        let src = PortRef::new(block.id, port);
        if let Some(link) = graph.link_from(src)
            && let Some(bi) = graph.block_index(link.dest.block)
            && let Some(dst) = graph.port(link.dest)
        {
            let pi = link.dest.port.index() as usize;
            if dst.direction == PortDirection::InFeedback {
                trace!(link = %link.id, from = %src, to = %link.dest, "staged feedback");
                state.stage(bi, pi, signal.clone());
            } else {
                trace!(link = %link.id, from = %src, to = %link.dest, "delivered");
                state.deliver(bi, pi, signal.clone());
            }
            fed += 1;
        }
        state.deliver(idx, port.index() as usize, signal);
    }

    fed
}
