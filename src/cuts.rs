// priority-cut enumeration, bottom-up over the gate graph
use prjunnamed_netlist::{Design, Net};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::cm::CostModel;
use crate::graph::{decode_gate, GateGraph};

pub const CUT_SIZE: usize = 6;

/// A cut is the set of signals feeding a logic cone. Ordered so that
/// iteration, equality and hashing are all deterministic.
pub type Cut = BTreeSet<Net>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleCut {
    pub inputs: Cut,
    pub output: Net,
}

impl SingleCut {
    /// "The signal is already available, do not re-implement it." Only ever
    /// chosen for boundary signals and loop leftovers.
    pub fn trivial(net: Net) -> Self {
        Self {
            inputs: Cut::from([net]),
            output: net,
        }
    }

    pub fn is_trivial(&self) -> bool {
        self.inputs.len() == 1 && self.inputs.contains(&self.output)
    }

    pub fn sorted_inputs(&self) -> Vec<Net> {
        self.inputs.iter().copied().collect()
    }
}

/// Per-signal priority cuts (K ≤ 6, top P kept), recomputed at the start of
/// every mapping pass under that pass's cost model.
pub struct PriorityCuts {
    priority: HashMap<Net, Vec<SingleCut>>,
    by_size: HashMap<Net, BTreeMap<usize, Vec<Cut>>>,
    keep: usize,
}

impl PriorityCuts {
    pub fn compute(design: &Design, graph: &GateGraph, cost: &CostModel, keep: usize) -> Self {
        let mut this = Self {
            priority: HashMap::new(),
            by_size: HashMap::new(),
            keep,
        };
        for &signal in graph.topo() {
            this.enumerate_signal(design, cost, signal);
        }
        this
    }

    fn enumerate_signal(&mut self, design: &Design, cost: &CostModel, signal: Net) {
        let (_, fanins) = decode_gate(design, signal).expect("gate output must decode");

        // cartesian merge of the fanin cut sets, discarding oversized unions.
        // a trivial cut for the gate itself is never generated here: it would
        // put a self-loop into the mapped DAG
        let mut merged: HashSet<Cut> = HashSet::new();
        merged.insert(Cut::new());
        for fanin in fanins {
            let fanin_cuts: Vec<Cut> = if fanin.is_const() {
                // constants are folded by the truth table, not cut inputs
                vec![Cut::new()]
            } else {
                // the fanin itself is always a usable leaf; its own priority
                // cuts let the union reach deeper
                let mut sets = vec![Cut::from([fanin])];
                if let Some(list) = self.priority.get(&fanin) {
                    sets.extend(list.iter().map(|cut| cut.inputs.clone()));
                }
                sets
            };
            let mut next: HashSet<Cut> = HashSet::new();
            for base in &merged {
                for fanin_cut in &fanin_cuts {
                    let mut union = base.clone();
                    union.extend(fanin_cut.iter().copied());
                    if union.len() <= CUT_SIZE {
                        next.insert(union);
                    }
                }
            }
            merged = next;
        }

        let mut sizes: BTreeMap<usize, Vec<Cut>> = BTreeMap::new();
        for cut in &merged {
            sizes.entry(cut.len()).or_default().push(cut.clone());
        }
        for list in sizes.values_mut() {
            list.sort();
        }

        let mut all: Vec<SingleCut> = merged
            .into_iter()
            .map(|inputs| SingleCut {
                inputs,
                output: signal,
            })
            .collect();
        all.sort_by(|a, b| cost.cmp_cuts(a, b));
        all.truncate(self.keep);

        self.by_size.insert(signal, sizes);
        self.priority.insert(signal, all);
    }

    /// The top-priority cut, or the trivial cut for signals that were never
    /// enumerated (boundaries, loop leftovers).
    pub fn best(&self, signal: Net) -> SingleCut {
        self.priority
            .get(&signal)
            .and_then(|list| list.first())
            .cloned()
            .unwrap_or_else(|| SingleCut::trivial(signal))
    }

    pub fn all(&self, signal: Net) -> &[SingleCut] {
        self.priority.get(&signal).map_or(&[], Vec::as_slice)
    }

    pub fn of_size(&self, signal: Net, size: usize) -> &[Cut] {
        self.by_size
            .get(&signal)
            .and_then(|sizes| sizes.get(&size))
            .map_or(&[], Vec::as_slice)
    }
}
