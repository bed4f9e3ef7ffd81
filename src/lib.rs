pub mod cm;
pub mod cuts;
pub mod graph;
pub mod target;
pub mod timing;
pub mod tt;

use prjunnamed_netlist::Net;
use thiserror::Error;

/// Failures that abort the mapper. When one of these is returned the design
/// has not been modified; combinational loops and over-long buffer chains are
/// only warnings and do not surface here.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("cannot evaluate the cell driving {0:?} to a truth table")]
    UnknownCell(Net),
    #[error("cut for {output:?} has {inputs} inputs, more than a LUT6 can absorb")]
    TableTooLarge { output: Net, inputs: usize },
    #[error("chosen cut for {0:?} lists its own output among its inputs")]
    SelfLoop(Net),
    #[error("dual-output INIT for Z={z:?}, Z5={z5:?} violates the shared-table constraint")]
    DoubleCutMismatch { z: Net, z5: Net },
}
