//! YAML scenario files: settings, blocks, links and feedback seeds.
//!
//! ```yaml
//! name: chain
//! settings:
//!   iterations: 2
//! blocks:
//!   - name: Laser
//!     script: source
//!     parameters: { level: 1.5 }
//!     ports:
//!       - { name: out, direction: Out, signal_type: Electrical }
//!   - name: Meter
//!     script: probe
//!     ports:
//!       - { name: in, direction: In, signal_type: Electrical }
//! links:
//!   - { from: Laser.out, to: Meter.in }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use fb_core::{ParameterTable, Signal, SignalType};
use fb_graph::{BlockGraph, PortDirection, PortRef};
use fb_sched::SimulationSettings;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub settings: SimulationSettings,
    pub blocks: Vec<BlockDef>,
    #[serde(default)]
    pub links: Vec<LinkDef>,
    #[serde(default)]
    pub feedback_seeds: Vec<SeedDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDef {
    pub name: String,
    pub script: String,
    #[serde(default)]
    pub parameters: ParameterTable,
    #[serde(default)]
    pub ports: Vec<PortDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDef {
    pub name: String,
    pub direction: PortDirection,
    pub signal_type: SignalType,
}

/// Endpoints are written `Block.port`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkDef {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedDef {
    pub port: String,
    pub signal: Signal,
}

/// A scenario turned into a graph plus the seeds addressed by port.
#[derive(Debug)]
pub struct BuiltScenario {
    pub graph: BlockGraph,
    pub seeds: BTreeMap<PortRef, Signal>,
}

impl Scenario {
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| CliError::ScenarioRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| CliError::ScenarioParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(yaml: &str) -> CliResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn build(&self) -> CliResult<BuiltScenario> {
        let mut graph = BlockGraph::new();
        for def in &self.blocks {
            let id = graph.add_block(def.name.as_str(), def.script.as_str())?;
            for port in &def.ports {
                if graph.port_by_name(&def.name, &port.name).is_some() {
                    return Err(CliError::Scenario(format!(
                        "block '{}' declares port '{}' twice",
                        def.name, port.name
                    )));
                }
                graph.add_port(id, port.name.as_str(), port.direction, port.signal_type)?;
            }
            graph.set_parameters(id, def.parameters.clone())?;
        }

        for link in &self.links {
            let src = endpoint(&graph, &link.from)?;
            let dst = endpoint(&graph, &link.to)?;
            graph.add_link(src, dst)?;
        }

        let mut seeds = BTreeMap::new();
        for seed in &self.feedback_seeds {
            seeds.insert(endpoint(&graph, &seed.port)?, seed.signal.clone());
        }

        graph.validate()?;
        Ok(BuiltScenario { graph, seeds })
    }
}

fn endpoint(graph: &BlockGraph, text: &str) -> CliResult<PortRef> {
    let (block, port) = text
        .split_once('.')
        .ok_or_else(|| CliError::Scenario(format!("'{text}' is not of the form Block.port")))?;
    graph
        .port_by_name(block, port)
        .ok_or_else(|| CliError::Scenario(format!("unknown port '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: &str = r#"
name: chain
settings:
  iterations: 2
blocks:
  - name: Laser
    script: source
    parameters: { level: 1.5 }
    ports:
      - { name: out, direction: Out, signal_type: Electrical }
  - name: Meter
    script: probe
    ports:
      - { name: in, direction: In, signal_type: Electrical }
      - { name: fb, direction: InFeedback, signal_type: Electrical }
links:
  - { from: Laser.out, to: Meter.in }
feedback_seeds:
  - port: Meter.fb
    signal: { type: Electrical, carrier_hz: 0.0, sample_rate_hz: 1.0, samples: [0.25] }
"#;

    #[test]
    fn builds_graph_from_yaml() {
        let scenario = Scenario::from_yaml_str(CHAIN).unwrap();
        assert_eq!(scenario.settings.iterations, 2);
        assert_eq!(scenario.settings.max_calculation_attempts, 100);

        let built = scenario.build().unwrap();
        assert_eq!(built.graph.len(), 2);
        assert_eq!(built.graph.links().count(), 1);
        let laser = built.graph.block_by_name("Laser").unwrap();
        assert_eq!(laser.parameters.real("level").unwrap(), 1.5);

        let fb = built.graph.port_by_name("Meter", "fb").unwrap();
        assert!(built.seeds.contains_key(&fb));
    }

    #[test]
    fn bad_endpoint_is_reported() {
        let mut scenario = Scenario::from_yaml_str(CHAIN).unwrap();
        scenario.links[0].to = "Meter.missing".into();
        assert!(matches!(scenario.build(), Err(CliError::Scenario(_))));

        scenario.links[0].to = "Meter".into();
        assert!(matches!(scenario.build(), Err(CliError::Scenario(_))));
    }

    #[test]
    fn link_errors_come_from_the_graph() {
        let mut scenario = Scenario::from_yaml_str(CHAIN).unwrap();
        scenario.links[0] = LinkDef {
            from: "Meter.in".into(),
            to: "Laser.out".into(),
        };
        assert!(matches!(scenario.build(), Err(CliError::Graph(_))));
    }
}
