//! Host-provided simulation settings.

use std::path::Path;
use std::time::Duration;

use fb_core::Table;
use serde::{Deserialize, Serialize};

use crate::error::{SchedError, SchedResult};

/// Settings for one run of a block graph.
///
/// `sampling` is forwarded verbatim to every block script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Number of independent runs of the whole graph.
    pub iterations: u32,
    /// Split each iteration into feedback segments.
    pub feedback_enabled: bool,
    /// Segments per iteration when feedback is enabled.
    pub feedback_segments: u32,
    /// Polls a block may spend `NotReady` in one pass before it is retired.
    pub max_calculation_attempts: u32,
    /// Keep feedback port values from the end of one iteration into the next.
    pub persist_feedback_across_iterations: bool,
    /// Sleep between checks of the pause flag.
    pub pause_poll_interval_ms: u64,
    /// Sampling parameters, opaque to the scheduler.
    pub sampling: Table,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            iterations: 1,
            feedback_enabled: false,
            feedback_segments: 1,
            max_calculation_attempts: 100,
            persist_feedback_across_iterations: true,
            pause_poll_interval_ms: 50,
            sampling: Table::new(),
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> SchedResult<()> {
        if self.iterations == 0 {
            return Err(SchedError::InvalidSettings {
                what: "iterations must be at least 1",
            });
        }
        if self.max_calculation_attempts == 0 {
            return Err(SchedError::InvalidSettings {
                what: "max_calculation_attempts must be at least 1",
            });
        }
        if self.feedback_enabled && self.feedback_segments == 0 {
            return Err(SchedError::InvalidSettings {
                what: "feedback_segments must be at least 1 when feedback is enabled",
            });
        }
        Ok(())
    }

    /// Round-robin passes per iteration.
    pub fn segments_per_iteration(&self) -> u32 {
        if self.feedback_enabled {
            self.feedback_segments
        } else {
            1
        }
    }

    pub fn pause_poll_interval(&self) -> Duration {
        Duration::from_millis(self.pause_poll_interval_ms)
    }

    /// Parse and validate settings from YAML.
    pub fn from_yaml_str(yaml: &str) -> SchedResult<Self> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> SchedResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}
