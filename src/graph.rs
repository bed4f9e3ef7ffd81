// read-only adjacency over the primitive-gate subgraph
use log::warn;
use prjunnamed_netlist::{Cell, Design, Net};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// One-bit primitive gate functions the mapper understands. Everything else
/// in the design is a boundary cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOp {
    Buf,
    Not,
    And,
    Or,
    Xor,
    /// Select low picks the first data leg, select high the second.
    Mux,
    /// And over two edges with the given input complements.
    Aig(bool, bool),
}

/// Decode the driver of `net` as a primitive gate bit. Multi-bit cells are
/// taken apart one output bit at a time.
pub fn decode_gate(design: &Design, net: Net) -> Option<(GateOp, Vec<Net>)> {
    let (cell, index) = design.find_cell(net).ok()?;
    match &*cell.get() {
        Cell::Buf(arg) => Some((GateOp::Buf, vec![arg[index]])),
        Cell::Not(arg) => Some((GateOp::Not, vec![arg[index]])),
        Cell::And(arg1, arg2) => Some((GateOp::And, vec![arg1[index], arg2[index]])),
        Cell::Or(arg1, arg2) => Some((GateOp::Or, vec![arg1[index], arg2[index]])),
        Cell::Xor(arg1, arg2) => Some((GateOp::Xor, vec![arg1[index], arg2[index]])),
        Cell::Mux(sel, arg1, arg2) => Some((GateOp::Mux, vec![*sel, arg1[index], arg2[index]])),
        Cell::Aig(arg1, arg2) => Some((
            GateOp::Aig(arg1.is_negative(), arg2.is_negative()),
            vec![arg1.net(), arg2.net()],
        )),
        _ => None,
    }
}

pub fn eval_gate(op: GateOp, values: &[bool]) -> bool {
    match op {
        GateOp::Buf => values[0],
        GateOp::Not => !values[0],
        GateOp::And => values[0] && values[1],
        GateOp::Or => values[0] || values[1],
        GateOp::Xor => values[0] ^ values[1],
        GateOp::Mux => {
            if values[0] {
                values[2]
            } else {
                values[1]
            }
        }
        GateOp::Aig(c1, c2) => (values[0] ^ c1) && (values[1] ^ c2),
    }
}

/// Adjacency and topological order over the primitive gates of a design.
/// Built once per mapper invocation; read-only afterwards.
pub struct GateGraph {
    gates: Vec<Net>,
    gate_set: HashSet<Net>,
    readers: HashMap<Net, Vec<Net>>,
    roots: BTreeSet<Net>,
    topo: Vec<Net>,
    looped: bool,
}

impl GateGraph {
    pub fn build(design: &Design) -> Self {
        let mut gates = Vec::new();
        let mut roots = BTreeSet::new();
        for cell in design.iter_cells() {
            match &*cell.get() {
                Cell::Buf(_)
                | Cell::Not(_)
                | Cell::And(_, _)
                | Cell::Or(_, _)
                | Cell::Xor(_, _)
                | Cell::Mux(_, _, _)
                | Cell::Aig(_, _) => {
                    for net in cell.output() {
                        gates.push(net);
                    }
                }
                Cell::Debug(_, _) => {}
                _ => {
                    // every net a boundary cell reads is a primary output of
                    // the mapping problem; its driven nets are primary inputs
                    cell.visit(|net| {
                        if !net.is_const() {
                            roots.insert(net);
                        }
                    });
                }
            }
        }

        let gate_set: HashSet<Net> = gates.iter().copied().collect();
        let mut readers: HashMap<Net, Vec<Net>> = HashMap::new();
        let mut indegree: HashMap<Net, usize> = HashMap::new();
        for &gate in &gates {
            let (_, inputs) = decode_gate(design, gate).expect("gate output must decode");
            let mut degree = 0;
            for input in inputs {
                if input.is_const() {
                    continue;
                }
                if gate_set.contains(&input) {
                    degree += 1;
                }
                readers.entry(input).or_default().push(gate);
            }
            indegree.insert(gate, degree);
        }

        // Kahn's algorithm restricted to primitive gates; inputs driven by
        // boundary cells or nothing count as sources
        let mut queue: VecDeque<Net> = gates
            .iter()
            .copied()
            .filter(|gate| indegree[gate] == 0)
            .collect();
        let mut topo = Vec::with_capacity(gates.len());
        while let Some(net) = queue.pop_front() {
            topo.push(net);
            if let Some(list) = readers.get(&net) {
                for &reader in list {
                    let degree = indegree.get_mut(&reader).expect("reader is a gate");
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(reader);
                    }
                }
            }
        }

        let looped = topo.len() != gates.len();
        if looped {
            warn!(
                "combinational loop: ordered {} of {} gate outputs; the rest stay unmapped",
                topo.len(),
                gates.len()
            );
        }

        Self {
            gates,
            gate_set,
            readers,
            roots,
            topo,
            looped,
        }
    }

    /// Every primitive-gate output bit, in design order.
    pub fn gates(&self) -> &[Net] {
        &self.gates
    }

    pub fn is_gate(&self, net: Net) -> bool {
        self.gate_set.contains(&net)
    }

    /// Forward topological order, sources first. Gates caught in a
    /// combinational loop are absent.
    pub fn topo(&self) -> &[Net] {
        &self.topo
    }

    pub fn rtopo(&self) -> impl Iterator<Item = Net> + '_ {
        self.topo.iter().rev().copied()
    }

    /// Nets read by boundary cells: the primary outputs of the mapping problem.
    pub fn roots(&self) -> &BTreeSet<Net> {
        &self.roots
    }

    /// Number of primitive gates reading `net`.
    pub fn reader_count(&self, net: Net) -> usize {
        self.readers.get(&net).map_or(0, Vec::len)
    }

    pub fn has_loop(&self) -> bool {
        self.looped
    }
}
