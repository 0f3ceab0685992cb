//! Round-robin pass over the blocks of a graph.
//!
//! The pass polls blocks in scheduling order, wrapping around, until every
//! block is `Complete` or `Unable`. A block found `NotReady` spends one retry;
//! after `max_calculation_attempts` retries it is retired as `Unable`, which
//! bounds the pass even for graphs that can never fully resolve.

use tracing::{debug, error, warn};

use crate::context::SchedulerContext;
use crate::error::{BlockFault, SchedError, SchedResult};
use crate::invoke;
use crate::plan::ExecutionPlan;
use crate::propagate;
use crate::sink::{PollRecord, Progress, RunSink};
use crate::state::BlockStatus;

/// Run one pass to its fixpoint.
///
/// Returns `SimulationAborted` if a stop is requested before the pass
/// settles, or the fatal error of a failing script. A stop already pending
/// when the pass begins aborts it before any block is polled.
pub(crate) fn run_pass(
    ctx: &mut SchedulerContext,
    plan: &ExecutionPlan<'_>,
    sink: &mut dyn RunSink,
) -> SchedResult<()> {
    let graph = plan.graph();
    let n = graph.len();
    let iteration = ctx.state.current_iteration();
    let segment = ctx.state.current_segment();
    let mut progress = Progress {
        blocks_completed: 0,
        blocks_total: n,
        iteration,
        iterations_total: ctx.settings().iterations,
        segment,
        segments_total: ctx.settings().segments_per_iteration(),
    };

    ctx.pointer = 0;
    if ctx.control().stop_requested() {
        return Err(SchedError::SimulationAborted { iteration, segment });
    }
    if n == 0 {
        return Ok(());
    }

    loop {
        let cur = ctx.pointer;
        let status = match ctx.state.check_status(graph, cur) {
            BlockStatus::Ready => {
                complete(ctx, plan, cur, sink)?;
                progress.blocks_completed += 1;
                sink.on_progress(&progress);
                BlockStatus::Complete
            }
            BlockStatus::NotReady => retry(ctx, plan, cur, sink),
            settled => settled,
        };

        ctx.summary.polls += 1;
        let state = &ctx.state.blocks()[cur];
        sink.on_poll(&PollRecord {
            position: cur,
            block: state.id,
            status,
            retry_count: state.retry_count,
        });

        let exit = status.is_settled() && ctx.state.check_exit();
        if !exit && ctx.control().stop_requested() {
            return Err(SchedError::SimulationAborted { iteration, segment });
        }

        ctx.pointer = (cur + 1) % n;
        if exit {
            return Ok(());
        }
    }
}

/// Invoke a ready block, commit its output and propagate it.
fn complete(
    ctx: &mut SchedulerContext,
    plan: &ExecutionPlan<'_>,
    idx: usize,
    sink: &mut dyn RunSink,
) -> SchedResult<()> {
    let graph = plan.graph();
    let block = &graph.blocks()[idx];
    ctx.state.block_mut(idx).status = BlockStatus::Ready;
    debug!(block = %block.name, "block ready");

    let output = match invoke::invoke(ctx, plan, idx) {
        Ok(output) => output,
        Err(err) => {
            error!(block = %block.name, error = %err, "block script failed");
            sink.on_message(&format!("{}: failed: {err}", block.name));
            ctx.state.set_fault(BlockFault {
                block: block.id,
                message: err.to_string(),
            });
            return Err(err);
        }
    };

    let state = ctx.state.block_mut(idx);
    state.parameters = output.parameters;
    state.results = output.results;
    state.status = BlockStatus::Complete;

    let fed = propagate::propagate(graph, &mut ctx.state, idx, output.outputs);
    ctx.summary.invocations += 1;
    debug!(block = %block.name, links = fed, "block complete");
    sink.on_message(&format!("{}: complete", block.name));
    Ok(())
}

/// Spend one retry on a block that is not ready.
fn retry(
    ctx: &mut SchedulerContext,
    plan: &ExecutionPlan<'_>,
    idx: usize,
    sink: &mut dyn RunSink,
) -> BlockStatus {
    let max_attempts = ctx.settings().max_calculation_attempts;
    let name = &plan.graph().blocks()[idx].name;
    let state = ctx.state.block_mut(idx);
    state.retry_count += 1;

    if state.retry_count < max_attempts {
        state.status = BlockStatus::NotReady;
        debug!(block = %name, retry = state.retry_count, "block not ready");
        return BlockStatus::NotReady;
    }

    state.status = BlockStatus::Unable;
    let attempts = state.retry_count;
    ctx.summary.unable += 1;
    let soft = SchedError::UnresolvableBlock {
        block: name.clone(),
        attempts,
    };
    warn!(block = %name, attempts, "block unable to calculate");
    sink.on_message(&format!("{name}: unable to calculate"));
    sink.on_warning(&soft);
    BlockStatus::Unable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{ScriptOutput, ScriptRegistry, script_fn};
    use crate::settings::SimulationSettings;
    use crate::sink::NullSink;
    use fb_core::SignalType;
    use fb_graph::{BlockGraph, PortDirection};

    #[derive(Default)]
    struct Polls(Vec<PollRecord>);

    impl RunSink for Polls {
        fn on_poll(&mut self, poll: &PollRecord) {
            self.0.push(*poll);
        }
    }

    fn registry() -> ScriptRegistry {
        ScriptRegistry::new().with(
            "noop",
            script_fn(|call| Ok(ScriptOutput::keep(call.parameters))),
        )
    }

    fn ctx(max_attempts: u32) -> SchedulerContext {
        SchedulerContext::new(SimulationSettings {
            max_calculation_attempts: max_attempts,
            ..Default::default()
        })
        .unwrap()
    }

    fn begin(ctx: &mut SchedulerContext, g: &BlockGraph) {
        ctx.reset(g);
        ctx.state.begin_iteration(g, 1, &Default::default(), true);
        ctx.state.begin_segment(g, 1);
    }

    #[test]
    fn empty_graph_pass_is_trivial() {
        let g = BlockGraph::new();
        let reg = registry();
        let plan = ExecutionPlan::resolve(&g, &reg).unwrap();
        let mut c = ctx(3);
        begin(&mut c, &g);
        run_pass(&mut c, &plan, &mut NullSink).unwrap();
        assert!(c.state().check_exit());
    }

    #[test]
    fn single_block_is_polled_once() {
        let mut g = BlockGraph::new();
        g.add_block("Only", "noop").unwrap();
        let reg = registry();
        let plan = ExecutionPlan::resolve(&g, &reg).unwrap();
        let mut c = ctx(3);
        begin(&mut c, &g);
        let mut polls = Polls::default();
        run_pass(&mut c, &plan, &mut polls).unwrap();
        assert_eq!(polls.0.len(), 1);
        assert_eq!(polls.0[0].status, BlockStatus::Complete);
        assert_eq!(c.pointer(), 0);
    }

    #[test]
    fn reversed_chain_needs_retries_then_completes() {
        // Scheduling order C, B, A with data flowing A -> B -> C.
        let mut g = BlockGraph::new();
        let c_ = g.add_block("C", "noop").unwrap();
        let b_ = g.add_block("B", "noop").unwrap();
        let a_ = g.add_block("A", "noop").unwrap();
        let c_in = g
            .add_port(c_, "in", PortDirection::In, SignalType::Digital)
            .unwrap();
        let b_in = g
            .add_port(b_, "in", PortDirection::In, SignalType::Digital)
            .unwrap();
        let b_out = g
            .add_port(b_, "out", PortDirection::Out, SignalType::Digital)
            .unwrap();
        let a_out = g
            .add_port(a_, "out", PortDirection::Out, SignalType::Digital)
            .unwrap();
        g.add_link(a_out, b_in).unwrap();
        g.add_link(b_out, c_in).unwrap();

        // noop produces no outputs, so downstream never becomes ready.
        let reg = registry();
        let plan = ExecutionPlan::resolve(&g, &reg).unwrap();
        let mut c = ctx(2);
        begin(&mut c, &g);
        let mut polls = Polls::default();
        run_pass(&mut c, &plan, &mut polls).unwrap();

        assert_eq!(c.state().status(a_), Some(BlockStatus::Complete));
        assert_eq!(c.state().status(b_), Some(BlockStatus::Unable));
        assert_eq!(c.state().status(c_), Some(BlockStatus::Unable));
        for b in c.state().blocks() {
            assert!(b.retry_count <= 2);
        }
        // Never the same position twice in a row.
        for w in polls.0.windows(2) {
            assert_ne!(w[0].position, w[1].position);
        }
        // Pointer sits after the last polled block.
        let last = polls.0.last().unwrap().position;
        assert_eq!(c.pointer(), (last + 1) % 3);
    }

    #[test]
    fn exit_holds_once_reached() {
        // A completes; B waits on an input nobody feeds and is retired.
        let mut g = BlockGraph::new();
        g.add_block("A", "noop").unwrap();
        let b = g.add_block("B", "noop").unwrap();
        g.add_port(b, "in", PortDirection::In, SignalType::Electrical)
            .unwrap();
        let reg = registry();
        let plan = ExecutionPlan::resolve(&g, &reg).unwrap();
        let mut c = ctx(3);
        begin(&mut c, &g);
        run_pass(&mut c, &plan, &mut NullSink).unwrap();
        assert!(c.state().check_exit());

        let before = c.state().blocks().to_vec();
        for _ in 0..3 {
            for idx in 0..g.len() {
                assert!(c.state().check_status(&g, idx).is_settled());
            }
            assert!(c.state().check_exit());
        }
        assert_eq!(c.state().blocks(), before.as_slice());
        assert_eq!(before[0].status, BlockStatus::Complete);
        assert_eq!(before[1].status, BlockStatus::Unable);
        assert_eq!(before[1].retry_count, 3);
    }
}
