//! Content-based hashing for run IDs.

use std::collections::BTreeMap;

use fb_core::Signal;
use fb_graph::{BlockGraph, PortRef};
use fb_sched::SimulationSettings;
use sha2::{Digest, Sha256};

/// Hash of everything that determines a run's outcome: the graph, the
/// settings, the feedback seeds and the engine version.
pub fn compute_run_id(
    graph: &BlockGraph,
    settings: &SimulationSettings,
    seeds: &BTreeMap<PortRef, Signal>,
    engine_version: &str,
) -> String {
    let mut hasher = Sha256::new();

    let graph_json = serde_json::to_string(graph).unwrap_or_default();
    hasher.update(graph_json.as_bytes());

    let settings_json = serde_json::to_string(settings).unwrap_or_default();
    hasher.update(settings_json.as_bytes());

    // Struct keys are not valid JSON object keys, so hash the pairs.
    let seeds: Vec<_> = seeds.iter().collect();
    let seeds_json = serde_json::to_string(&seeds).unwrap_or_default();
    hasher.update(seeds_json.as_bytes());

    hasher.update(engine_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fb_core::{SignalType, Waveform};
    use fb_graph::PortDirection;

    fn graph(name: &str) -> (BlockGraph, PortRef) {
        let mut g = BlockGraph::new();
        let a = g.add_block(name, "source").unwrap();
        let fb = g
            .add_port(a, "fb", PortDirection::InFeedback, SignalType::Electrical)
            .unwrap();
        (g, fb)
    }

    #[test]
    fn hash_stability() {
        let (g, _) = graph("A");
        let settings = SimulationSettings::default();
        let h1 = compute_run_id(&g, &settings, &BTreeMap::new(), "v1");
        let h2 = compute_run_id(&g, &settings, &BTreeMap::new(), "v1");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let (g1, fb) = graph("A");
        let (g2, _) = graph("B");
        let settings = SimulationSettings::default();
        let none = BTreeMap::new();
        let base = compute_run_id(&g1, &settings, &none, "v1");

        assert_ne!(base, compute_run_id(&g2, &settings, &none, "v1"));
        assert_ne!(base, compute_run_id(&g1, &settings, &none, "v2"));

        let more = SimulationSettings {
            iterations: 4,
            ..Default::default()
        };
        assert_ne!(base, compute_run_id(&g1, &more, &none, "v1"));

        let seeded = BTreeMap::from([(fb, Signal::Electrical(Waveform::default()))]);
        assert_ne!(base, compute_run_id(&g1, &settings, &seeded, "v1"));
    }
}
