//! Signal type tags and payloads carried between ports.
//!
//! The scheduler never looks inside a payload; it only checks the tag so that
//! a link always joins two ports of the same [`SignalType`].

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FbError, FbResult};

/// Type tag for a port and the signals it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalType {
    Electrical,
    Optical,
    Digital,
    AnalogGeneric1,
    AnalogGeneric2,
    AnalogGeneric3,
    /// Port is switched off; it never gates readiness and never carries data.
    Disabled,
}

impl SignalType {
    pub fn name(self) -> &'static str {
        match self {
            SignalType::Electrical => "electrical",
            SignalType::Optical => "optical",
            SignalType::Digital => "digital",
            SignalType::AnalogGeneric1 => "analog1",
            SignalType::AnalogGeneric2 => "analog2",
            SignalType::AnalogGeneric3 => "analog3",
            SignalType::Disabled => "disabled",
        }
    }

    pub fn is_disabled(self) -> bool {
        matches!(self, SignalType::Disabled)
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which of the three generic analog channels a signal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalogChannel {
    Generic1,
    Generic2,
    Generic3,
}

/// Sampled real-valued waveform (electrical or generic analog).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Waveform {
    /// Carrier frequency in Hz (0 for baseband).
    pub carrier_hz: f64,
    /// Sample rate in Hz.
    pub sample_rate_hz: f64,
    pub samples: Vec<f64>,
}

impl Waveform {
    pub fn new(carrier_hz: f64, sample_rate_hz: f64, samples: Vec<f64>) -> Self {
        Self {
            carrier_hz,
            sample_rate_hz,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Arithmetic mean of the samples, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }
}

/// Dual-polarization optical field envelope.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpticalField {
    /// Carrier wavelength in metres.
    pub wavelength_m: f64,
    pub sample_rate_hz: f64,
    pub x_pol: Vec<f64>,
    pub y_pol: Vec<f64>,
}

/// Serial bit stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BitStream {
    pub bit_rate_hz: f64,
    pub bits: Vec<bool>,
}

/// A value travelling along a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Signal {
    Electrical(Waveform),
    Optical(OpticalField),
    Digital(BitStream),
    Analog {
        channel: AnalogChannel,
        waveform: Waveform,
    },
}

impl Signal {
    /// Type tag of this payload. Never `Disabled`.
    pub fn signal_type(&self) -> SignalType {
        match self {
            Signal::Electrical(_) => SignalType::Electrical,
            Signal::Optical(_) => SignalType::Optical,
            Signal::Digital(_) => SignalType::Digital,
            Signal::Analog { channel, .. } => match channel {
                AnalogChannel::Generic1 => SignalType::AnalogGeneric1,
                AnalogChannel::Generic2 => SignalType::AnalogGeneric2,
                AnalogChannel::Generic3 => SignalType::AnalogGeneric3,
            },
        }
    }

    /// Waveform view for electrical and analog signals.
    pub fn waveform(&self) -> Option<&Waveform> {
        match self {
            Signal::Electrical(w) | Signal::Analog { waveform: w, .. } => Some(w),
            _ => None,
        }
    }

    pub fn waveform_mut(&mut self) -> Option<&mut Waveform> {
        match self {
            Signal::Electrical(w) | Signal::Analog { waveform: w, .. } => Some(w),
            _ => None,
        }
    }

    /// Waveform view that reports the actual type on mismatch.
    pub fn expect_waveform(&self) -> FbResult<&Waveform> {
        self.waveform().ok_or(FbError::SignalMismatch {
            expected: "waveform",
            found: self.signal_type().name(),
        })
    }

    /// Build an empty signal of the given type, used for feedback defaults.
    ///
    /// Returns `None` for `Disabled`.
    pub fn empty(signal_type: SignalType) -> Option<Self> {
        let analog = |channel| Signal::Analog {
            channel,
            waveform: Waveform::default(),
        };
        match signal_type {
            SignalType::Electrical => Some(Signal::Electrical(Waveform::default())),
            SignalType::Optical => Some(Signal::Optical(OpticalField::default())),
            SignalType::Digital => Some(Signal::Digital(BitStream::default())),
            SignalType::AnalogGeneric1 => Some(analog(AnalogChannel::Generic1)),
            SignalType::AnalogGeneric2 => Some(analog(AnalogChannel::Generic2)),
            SignalType::AnalogGeneric3 => Some(analog(AnalogChannel::Generic3)),
            SignalType::Disabled => None,
        }
    }
}
