//! Iteration and feedback-segment controller.

use tracing::info;

use crate::context::{RunSummary, SchedulerContext};
use crate::error::{SchedError, SchedResult};
use crate::plan::ExecutionPlan;
use crate::round_robin;
use crate::sink::{BlockReport, RunSink};

/// Execute `plan` for every configured iteration and segment.
///
/// Each iteration starts from the design parameters; with feedback enabled it
/// is split into `feedback_segments` passes, feedback ports carrying their
/// value from one segment to the next. Results are handed to `sink` after
/// every pass.
///
/// A fatal script error or a stop request ends the run early. Either way the
/// state reached so far stays in `ctx` for inspection.
///
/// The run never clears the control flags. A host reusing a [`RunControl`]
/// after a stop calls [`RunControl::reset`] first, otherwise the next run
/// aborts before its first block.
///
/// [`RunControl`]: crate::control::RunControl
/// [`RunControl::reset`]: crate::control::RunControl::reset
pub fn run(
    ctx: &mut SchedulerContext,
    plan: &ExecutionPlan<'_>,
    sink: &mut dyn RunSink,
) -> SchedResult<RunSummary> {
    let graph = plan.graph();
    ctx.check_seeds(graph)?;
    ctx.reset(graph);

    let iterations = ctx.settings().iterations;
    let segments = ctx.settings().segments_per_iteration();
    let feedback = ctx.settings().feedback_enabled;
    let persist = ctx.settings().persist_feedback_across_iterations;

    info!(
        blocks = graph.len(),
        links = graph.links().count(),
        iterations,
        segments,
        "run started"
    );
    sink.on_message(&format!(
        "Run started: {} blocks, {iterations} iterations",
        graph.len()
    ));

    for iteration in 1..=iterations {
        if iteration > 1 {
            wait_while_paused(ctx, iteration, sink)?;
        }

        ctx.state
            .begin_iteration(graph, iteration, &ctx.seeds, persist);
        ctx.summary.iterations = iteration;
        info!(iteration, "iteration started");
        sink.on_message(&format!("Iteration {iteration}/{iterations}"));

        for segment in 1..=segments {
            ctx.state.begin_segment(graph, segment);
            if feedback {
                info!(iteration, segment, "segment started");
                sink.on_message(&format!("Segment {segment}/{segments}"));
            }

            match round_robin::run_pass(ctx, plan, sink) {
                Ok(()) => {
                    ctx.summary.passes += 1;
                    hand_off(ctx, plan, sink);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    info!(iteration, segment, "run stopped");
                    sink.on_message("Run stopped");
                    hand_off(ctx, plan, sink);
                    return Err(err);
                }
            }

            if ctx.control().stop_requested() {
                info!(iteration, segment, "run stopped");
                sink.on_message("Run stopped");
                return Err(SchedError::SimulationAborted { iteration, segment });
            }
        }
    }

    info!(
        passes = ctx.summary.passes,
        invocations = ctx.summary.invocations,
        unable = ctx.summary.unable,
        "run finished"
    );
    sink.on_message("Run finished");
    Ok(ctx.summary.clone())
}

/// Give the host one report per block for the pass that just ended.
fn hand_off(ctx: &SchedulerContext, plan: &ExecutionPlan<'_>, sink: &mut dyn RunSink) {
    let state = ctx.state();
    for (block, live) in plan.graph().blocks().iter().zip(state.blocks()) {
        sink.on_results(BlockReport {
            iteration: state.current_iteration(),
            segment: state.current_segment(),
            block: block.id,
            name: block.name.clone(),
            status: live.status,
            retry_count: live.retry_count,
            parameters: live.parameters.clone(),
            results: live.results.clone(),
        });
    }
}

/// Hold before `iteration` while the host has the run paused.
fn wait_while_paused(
    ctx: &SchedulerContext,
    iteration: u32,
    sink: &mut dyn RunSink,
) -> SchedResult<()> {
    let control = ctx.control();
    if !control.pause_requested() {
        return Ok(());
    }

    info!(iteration, "run paused");
    sink.on_message(&format!("Paused before iteration {iteration}"));
    while control.pause_requested() {
        if control.stop_requested() {
            return Err(SchedError::SimulationAborted {
                iteration: iteration - 1,
                segment: ctx.state().current_segment(),
            });
        }
        std::thread::sleep(ctx.settings().pause_poll_interval());
    }
    info!(iteration, "run resumed");
    sink.on_message("Resumed");
    Ok(())
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::script::{ScriptOutput, ScriptRegistry, script_fn};
    use crate::settings::SimulationSettings;
    use crate::sink::NullSink;
    use crate::state::BlockStatus;
    use fb_core::{BitStream, BlockId, Signal, SignalType};
    use fb_graph::{BlockGraph, PortDirection};
    use proptest::prelude::*;

    fn registry() -> ScriptRegistry {
        ScriptRegistry::new().with(
            "fwd",
            script_fn(|call| {
                let mut out = ScriptOutput::keep(call.parameters);
                for p in call.block.outputs() {
                    out = out.with_output(p.id, Signal::Digital(BitStream::default()));
                }
                Ok(out)
            }),
        )
    }

    /// Blocks are added in `order` (a permutation of topological ranks);
    /// every edge runs from the lower rank to the higher one, so the graph is
    /// acyclic whatever the scheduling order. `open` adds unlinked inputs.
    fn build(order: &[usize], edges: &[(usize, usize)], open: &[usize]) -> BlockGraph {
        let n = order.len();
        let mut g = BlockGraph::new();
        let mut by_rank: Vec<Option<BlockId>> = vec![None; n];
        for &rank in order {
            by_rank[rank] = Some(g.add_block(format!("B{rank}"), "fwd").unwrap());
        }
        let ids: Vec<BlockId> = by_rank.into_iter().flatten().collect();

        for (e, &(x, y)) in edges.iter().enumerate() {
            let (src, dst) = (x.min(y) % n, x.max(y) % n);
            if src >= dst {
                continue;
            }
            let o = g
                .add_port(ids[src], format!("o{e}"), PortDirection::Out, SignalType::Digital)
                .unwrap();
            let i = g
                .add_port(ids[dst], format!("i{e}"), PortDirection::In, SignalType::Digital)
                .unwrap();
            g.add_link(o, i).unwrap();
        }
        for (k, &b) in open.iter().enumerate() {
            g.add_port(ids[b % n], format!("open{k}"), PortDirection::In, SignalType::Digital)
                .unwrap();
        }
        g
    }

    fn graph_parts() -> impl Strategy<Value = (Vec<usize>, Vec<(usize, usize)>)> {
        (1usize..8).prop_flat_map(|n| {
            (
                Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
                prop::collection::vec((0..n, 0..n), 0..16),
            )
        })
    }

    proptest! {
        #[test]
        fn acyclic_graphs_complete_every_block(
            (order, edges) in graph_parts(),
            iterations in 1u32..3,
        ) {
            let g = build(&order, &edges, &[]);
            let reg = registry();
            let plan = ExecutionPlan::resolve(&g, &reg).unwrap();
            let mut ctx = SchedulerContext::new(SimulationSettings {
                iterations,
                ..Default::default()
            })
            .unwrap();
            let summary = run(&mut ctx, &plan, &mut NullSink).unwrap();

            prop_assert!(ctx.state().blocks().iter().all(|b| b.status == BlockStatus::Complete));
            prop_assert_eq!(summary.invocations, (g.len() as u64) * iterations as u64);
            prop_assert_eq!(summary.unable, 0);
        }

        #[test]
        fn dangling_inputs_still_terminate(
            (order, edges) in graph_parts(),
            open in prop::collection::vec(0usize..8, 1..4),
            max_attempts in 1u32..6,
        ) {
            let g = build(&order, &edges, &open);
            let reg = registry();
            let plan = ExecutionPlan::resolve(&g, &reg).unwrap();
            let mut ctx = SchedulerContext::new(SimulationSettings {
                max_calculation_attempts: max_attempts,
                ..Default::default()
            })
            .unwrap();
            let summary = run(&mut ctx, &plan, &mut NullSink).unwrap();

            prop_assert!(ctx.state().check_exit());
            prop_assert!(summary.unable >= 1);
            for b in ctx.state().blocks() {
                prop_assert!(b.retry_count <= max_attempts);
                if b.status == BlockStatus::Unable {
                    prop_assert_eq!(b.retry_count, max_attempts);
                }
            }
        }
    }
}
