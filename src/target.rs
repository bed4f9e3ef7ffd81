// LUT cell library for the mapper's output side
use prjunnamed_netlist::{
    Cell, Const, Design, Target, TargetCell, TargetImportError, TargetPrototype,
};
use std::collections::BTreeMap;

pub const LUT6_KIND: &str = "LUT6";
pub const LUT6D_KIND: &str = "LUT6D";

/// The target cell family the mapper emits into, plus the boundary primitives
/// it needs to recognize (registers and the transparent buffer kinds the
/// primary-output traversal may walk through). Built once by the host driver
/// and passed by reference; there is no global registry.
#[derive(Debug)]
pub struct LutTarget {
    cells: BTreeMap<String, TargetPrototype>,
}

fn lut_prototype(ninputs: usize) -> TargetPrototype {
    let mut proto =
        TargetPrototype::new_pure().add_param_bits("INIT", Const::undef(1 << ninputs));
    for index in 0..ninputs {
        proto = proto.add_input(&format!("I{index}"), Const::undef(1));
    }
    proto.add_output("Z", 1)
}

fn lut6d_prototype() -> TargetPrototype {
    let mut proto = TargetPrototype::new_pure().add_param_bits("INIT", Const::undef(64));
    for index in 0..6 {
        proto = proto.add_input(&format!("I{index}"), Const::undef(1));
    }
    proto.add_output("Z", 1).add_output("Z5", 1)
}

fn buffer_prototype() -> TargetPrototype {
    TargetPrototype::new_pure()
        .add_input("I", Const::undef(1))
        .add_output("O", 1)
}

impl LutTarget {
    pub fn new() -> Self {
        let mut cells = BTreeMap::new();
        for ninputs in 1..=6 {
            cells.insert(format!("LUT{ninputs}"), lut_prototype(ninputs));
        }
        cells.insert(LUT6D_KIND.to_owned(), lut6d_prototype());
        cells.insert(
            "DFF".to_owned(),
            TargetPrototype::new_has_state()
                .add_input("CLK", Const::undef(1))
                .add_input("D", Const::undef(1))
                .add_output("Q", 1),
        );
        for kind in ["BUF", "INV", "INBUF", "OUTBUF"] {
            cells.insert(kind.to_owned(), buffer_prototype());
        }
        Self { cells }
    }

    pub fn lut6_prototype(&self) -> &TargetPrototype {
        &self.cells[LUT6_KIND]
    }

    pub fn lut6d_prototype(&self) -> &TargetPrototype {
        &self.cells[LUT6D_KIND]
    }

    /// Single-input single-output cells the traversal follows through instead
    /// of treating as a boundary.
    pub fn is_transparent_buffer(kind: &str) -> bool {
        matches!(kind, "BUF" | "INV" | "INBUF" | "OUTBUF")
    }
}

impl Default for LutTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for LutTarget {
    fn name(&self) -> &str {
        "lut6"
    }

    fn options(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn prototype(&self, name: &str) -> Option<&TargetPrototype> {
        self.cells.get(name)
    }

    fn validate(&self, _design: &Design, _cell: &TargetCell) {}

    fn import(&self, design: &mut Design) -> Result<(), TargetImportError> {
        for cell_ref in design.iter_cells() {
            let Cell::Other(instance) = &*cell_ref.get() else {
                continue;
            };
            if let Some(prototype) = self.prototype(&instance.kind) {
                cell_ref.unalive();
                let (target_cell, value) = prototype
                    .instance_to_target_cell(design, instance, cell_ref.output())
                    .map_err(|cause| TargetImportError::new(cell_ref, cause))?;
                design.replace_value(value, design.add_target(target_cell));
            }
        }
        design.compact();
        Ok(())
    }

    fn export(&self, design: &mut Design) {
        for cell_ref in design.iter_cells() {
            let Cell::Target(target_cell) = &*cell_ref.get() else {
                continue;
            };
            let _guard = design.use_metadata_from(&[cell_ref]);
            let prototype = design.target_prototype(target_cell);
            let instance = prototype.target_cell_to_instance(target_cell);
            let instance_output = design.add_other(instance);
            design.replace_value(cell_ref.output(), instance_output);
            cell_ref.unalive();
        }
        design.compact();
    }

    fn synthesize(&self, _design: &mut Design) -> Result<(), ()> {
        Ok(())
    }
}
