// unit-delay arrival / required times over the gate graph
use prjunnamed_netlist::{Design, Net};
use std::collections::HashMap;

use crate::graph::{decode_gate, GateGraph};

/// Arrival and required times under a unit gate delay. Primary inputs and
/// constants arrive at 0; signals outside every primary-output cone keep the
/// critical-path depth as their required time.
pub struct Timing {
    arrival: HashMap<Net, f32>,
    required: HashMap<Net, f32>,
    critical_depth: i32,
}

impl Timing {
    pub fn analyze(design: &Design, graph: &GateGraph) -> Self {
        let mut arrival: HashMap<Net, f32> = HashMap::new();
        let mut critical_depth = 0;
        for &signal in graph.topo() {
            let (_, inputs) = decode_gate(design, signal).expect("gate output must decode");
            let mut at = 0.0f32;
            for input in inputs {
                at = at.max(arrival.get(&input).copied().unwrap_or(0.0));
            }
            let at = at + 1.0;
            critical_depth = critical_depth.max(at.ceil() as i32);
            arrival.insert(signal, at);
        }

        let mut required: HashMap<Net, f32> = HashMap::new();
        for &root in graph.roots() {
            required.insert(root, critical_depth as f32);
        }
        for signal in graph.rtopo() {
            let Some(&rt) = required.get(&signal) else {
                continue;
            };
            let (_, inputs) = decode_gate(design, signal).expect("gate output must decode");
            for input in inputs {
                let slot = required.entry(input).or_insert(f32::INFINITY);
                *slot = slot.min(rt - 1.0);
            }
        }

        Self {
            arrival,
            required,
            critical_depth,
        }
    }

    pub fn arrival(&self, net: Net) -> f32 {
        self.arrival.get(&net).copied().unwrap_or(0.0)
    }

    pub fn required(&self, net: Net) -> f32 {
        self.required
            .get(&net)
            .copied()
            .unwrap_or(self.critical_depth as f32)
    }

    pub fn depth(&self, net: Net) -> i32 {
        self.arrival(net).ceil() as i32
    }

    /// Depth a LUT built over `inputs` would produce.
    pub fn cut_depth<'a>(&self, inputs: impl IntoIterator<Item = &'a Net>) -> i32 {
        let mut depth = 0;
        for &input in inputs {
            depth = depth.max(self.depth(input));
        }
        depth + 1
    }

    pub fn critical_depth(&self) -> i32 {
        self.critical_depth
    }
}
