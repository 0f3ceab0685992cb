//! Script invocation and output contract checks.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use fb_graph::{Block, PortDirection, PortRef};

use crate::context::SchedulerContext;
use crate::error::{SchedError, SchedResult};
use crate::plan::ExecutionPlan;
use crate::script::{OrderedSignals, PortSignal, ScriptCall, ScriptOutput};

/// Run the script of the block at `idx` against the current port state.
///
/// Nothing in `ctx` is modified; the caller commits the output only when
/// this returns `Ok`.
pub(crate) fn invoke(
    ctx: &SchedulerContext,
    plan: &ExecutionPlan<'_>,
    idx: usize,
) -> SchedResult<ScriptOutput> {
    let block = &plan.graph().blocks()[idx];
    let state = ctx.state();

    let inputs: OrderedSignals = block
        .ports
        .iter()
        .zip(state.port_slots(idx))
        .filter(|(p, _)| p.direction.is_input() && !p.signal_type.is_disabled())
        .filter_map(|(p, slot)| {
            slot.signal
                .clone()
                .map(|signal| PortSignal::new(p.id, signal))
        })
        .collect();

    let call = ScriptCall {
        block,
        iteration: state.current_iteration(),
        segment: state.current_segment(),
        inputs: &inputs,
        parameters: &state.blocks()[idx].parameters,
        settings: ctx.settings(),
    };

    let mut output = match panic::catch_unwind(AssertUnwindSafe(|| plan.script(idx).run(&call))) {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(SchedError::ScriptException {
                block: block.name.clone(),
                message: e.message,
            });
        }
        Err(payload) => {
            return Err(SchedError::ScriptException {
                block: block.name.clone(),
                message: panic_message(payload.as_ref()),
            });
        }
    };

    check_outputs(block, &mut output.outputs)?;
    Ok(output)
}

/// Every output must target an `Out` port of this block with a matching
/// signal type. Outputs on disabled ports are dropped.
fn check_outputs(block: &Block, outputs: &mut OrderedSignals) -> SchedResult<()> {
    for out in outputs.iter() {
        let port_ref = PortRef::new(block.id, out.port);
        let port = block
            .port(out.port)
            .filter(|p| p.direction == PortDirection::Out)
            .ok_or_else(|| SchedError::InvalidOutputPort {
                block: block.name.clone(),
                port: port_ref,
            })?;
        let found = out.signal.signal_type();
        if !port.signal_type.is_disabled() && port.signal_type != found {
            return Err(SchedError::OutputTypeMismatch {
                block: block.name.clone(),
                port: port_ref,
                expected: port.signal_type,
                found,
            });
        }
    }
    outputs.retain(|o| block.port(o.port).is_some_and(|p| !p.signal_type.is_disabled()));
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
