//! Built-in block scripts available to scenario files.
//!
//! | key      | behaviour |
//! |----------|-----------|
//! | `source` | constant signal of `level` (default 1.0) on every output |
//! | `gain`   | first input scaled by `gain` (default 1.0) |
//! | `adder`  | sample-wise sum of all inputs |
//! | `delay`  | forwards the feedback input, or an empty signal before one arrives |
//! | `probe`  | records mean, min, max and rms of each input into results |

use fb_core::{BitStream, OpticalField, ResultsTable, Signal, SignalType, Waveform};
use fb_graph::PortDirection;
use fb_sched::{ScriptCall, ScriptError, ScriptOutput, ScriptRegistry};

pub fn builtin() -> ScriptRegistry {
    ScriptRegistry::new()
        .with("source", source)
        .with("gain", gain)
        .with("adder", adder)
        .with("delay", delay)
        .with("probe", probe)
}

type ScriptResult = Result<ScriptOutput, ScriptError>;

fn source(call: &ScriptCall<'_>) -> ScriptResult {
    let level = call.parameters.real_or("level", 1.0)?;
    let samples = call.parameters.real_or("samples", 16.0)?.max(0.0) as usize;
    let rate = call.parameters.real_or("sample_rate_hz", 1.0e9)?;

    let mut out = ScriptOutput::keep(call.parameters);
    for port in call.block.outputs() {
        if let Some(signal) = constant(port.signal_type, level, samples, rate) {
            out = out.with_output(port.id, signal);
        }
    }
    Ok(out)
}

fn gain(call: &ScriptCall<'_>) -> ScriptResult {
    let k = call.parameters.real_or("gain", 1.0)?;
    let Some(first) = call.inputs.first() else {
        return Err(ScriptError::new("gain needs an input signal"));
    };
    let mut signal = first.signal.clone();
    scale(&mut signal, k);
    Ok(fan_out(call, signal))
}

fn adder(call: &ScriptCall<'_>) -> ScriptResult {
    let mut sum: Option<Signal> = None;
    for input in call.inputs {
        let wave = input.signal.expect_waveform()?;
        match sum.as_mut().and_then(Signal::waveform_mut) {
            Some(acc) => {
                if acc.samples.len() < wave.samples.len() {
                    acc.samples.resize(wave.samples.len(), 0.0);
                }
                for (a, b) in acc.samples.iter_mut().zip(&wave.samples) {
                    *a += b;
                }
            }
            None => sum = Some(input.signal.clone()),
        }
    }
    let sum = sum.ok_or_else(|| ScriptError::new("adder needs at least one input"))?;
    Ok(fan_out(call, sum))
}

fn delay(call: &ScriptCall<'_>) -> ScriptResult {
    let fed_back = call.block.ports.iter().find_map(|p| {
        if p.direction != PortDirection::InFeedback {
            return None;
        }
        call.inputs
            .iter()
            .find(|s| s.port == p.id)
            .map(|s| s.signal.clone())
    });

    let mut out = ScriptOutput::keep(call.parameters);
    for port in call.block.outputs() {
        let signal = match &fed_back {
            Some(s) if s.signal_type() == port.signal_type => Some(s.clone()),
            _ => Signal::empty(port.signal_type),
        };
        if let Some(signal) = signal {
            out = out.with_output(port.id, signal);
        }
    }
    Ok(out)
}

fn probe(call: &ScriptCall<'_>) -> ScriptResult {
    let mut results = ResultsTable::new();
    for input in call.inputs {
        let name = call
            .block
            .port(input.port)
            .map(|p| p.name.as_str())
            .unwrap_or("?");
        let samples = samples_of(&input.signal);
        results.insert(format!("{name}.samples"), samples.len() as i64);
        if samples.is_empty() {
            continue;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let rms = (samples.iter().map(|v| v * v).sum::<f64>() / n).sqrt();
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        results.insert(format!("{name}.mean"), mean);
        results.insert(format!("{name}.rms"), rms);
        results.insert(format!("{name}.min"), min);
        results.insert(format!("{name}.max"), max);
    }
    results.insert("segment", call.segment as i64);
    Ok(ScriptOutput::keep(call.parameters).with_results(results))
}

/// Send `signal` to every output whose type matches it.
fn fan_out(call: &ScriptCall<'_>, signal: Signal) -> ScriptOutput {
    let mut out = ScriptOutput::keep(call.parameters);
    for port in call.block.outputs() {
        if port.signal_type == signal.signal_type() {
            out = out.with_output(port.id, signal.clone());
        }
    }
    out
}

fn constant(signal_type: SignalType, level: f64, samples: usize, rate: f64) -> Option<Signal> {
    let mut signal = Signal::empty(signal_type)?;
    match &mut signal {
        Signal::Electrical(w) | Signal::Analog { waveform: w, .. } => {
            *w = Waveform::new(0.0, rate, vec![level; samples]);
        }
        Signal::Optical(field) => {
            *field = OpticalField {
                wavelength_m: 1.55e-6,
                sample_rate_hz: rate,
                x_pol: vec![level; samples],
                y_pol: vec![0.0; samples],
            };
        }
        Signal::Digital(bits) => {
            *bits = BitStream {
                bit_rate_hz: rate,
                bits: vec![level > 0.5; samples],
            };
        }
    }
    Some(signal)
}

fn scale(signal: &mut Signal, k: f64) {
    match signal {
        Signal::Electrical(w) | Signal::Analog { waveform: w, .. } => {
            w.samples.iter_mut().for_each(|v| *v *= k);
        }
        Signal::Optical(field) => {
            let amp = k.abs().sqrt();
            field.x_pol.iter_mut().for_each(|v| *v *= amp);
            field.y_pol.iter_mut().for_each(|v| *v *= amp);
        }
        Signal::Digital(_) => {}
    }
}

fn samples_of(signal: &Signal) -> Vec<f64> {
    match signal {
        Signal::Electrical(w) | Signal::Analog { waveform: w, .. } => w.samples.clone(),
        Signal::Optical(field) => field
            .x_pol
            .iter()
            .zip(&field.y_pol)
            .map(|(x, y)| x * x + y * y)
            .collect(),
        Signal::Digital(b) => b.bits.iter().map(|&bit| if bit { 1.0 } else { 0.0 }).collect(),
    }
}
