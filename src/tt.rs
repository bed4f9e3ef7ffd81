// truth-table algebra over 64-bit tables
use prjunnamed_netlist::{Design, Net};
use std::collections::HashMap;

use crate::graph::{decode_gate, eval_gate};
use crate::MapError;

pub type Truth6 = u64;

pub fn mask6(ninputs: usize) -> Truth6 {
    if ninputs == 6 {
        0xffffffffffffffff
    } else {
        (1 << (1 << ninputs)) - 1
    }
}

/// Truth table of the logic cone rooted at `output` over the free variables
/// `inputs`: bit k holds the value under the assignment encoded by k, with
/// `inputs[0]` as the least significant position. Evaluation stops at
/// `inputs`; constants fold; anything else in the cone is corrupt input.
pub fn cone_init(design: &Design, output: Net, inputs: &[Net]) -> Result<Truth6, MapError> {
    if inputs.len() > 6 {
        return Err(MapError::TableTooLarge {
            output,
            inputs: inputs.len(),
        });
    }
    let mut init: Truth6 = 0;
    for combo in 0..(1u32 << inputs.len()) {
        let mut env: HashMap<Net, bool> = HashMap::new();
        for (position, &input) in inputs.iter().enumerate() {
            env.insert(input, combo & (1 << position) != 0);
        }
        if eval_cone(design, output, &mut env)? {
            init |= 1 << combo;
        }
    }
    Ok(init)
}

fn eval_cone(design: &Design, net: Net, env: &mut HashMap<Net, bool>) -> Result<bool, MapError> {
    if net == Net::ONE {
        return Ok(true);
    }
    if net == Net::ZERO || net == Net::UNDEF {
        return Ok(false);
    }
    if let Some(&value) = env.get(&net) {
        return Ok(value);
    }
    let Some((op, args)) = decode_gate(design, net) else {
        return Err(MapError::UnknownCell(net));
    };
    let mut values = [false; 3];
    for (slot, &arg) in args.iter().enumerate() {
        values[slot] = eval_cone(design, arg, env)?;
    }
    let value = eval_gate(op, &values[..args.len()]);
    env.insert(net, value);
    Ok(value)
}

/// True iff the table does not depend on any of the `dont_care` variables.
pub fn is_independent(init: Truth6, ninputs: usize, dont_care: &[usize]) -> bool {
    for combo in 0..(1u32 << ninputs) {
        for &index in dont_care {
            let flipped = combo ^ (1 << index);
            if flipped < combo {
                continue;
            }
            if (init >> combo) & 1 != (init >> flipped) & 1 {
                return false;
            }
        }
    }
    true
}

/// Restrict a table to the variables not in `fixed`, splicing the fixed bits
/// into every assignment. The result has `ninputs - fixed.len()` variables.
pub fn project(init: Truth6, ninputs: usize, fixed: &[(usize, bool)]) -> Truth6 {
    let free: Vec<usize> = (0..ninputs)
        .filter(|index| !fixed.iter().any(|&(fixed_index, _)| fixed_index == *index))
        .collect();
    let mut projected: Truth6 = 0;
    for combo in 0..(1u32 << free.len()) {
        let mut full = 0u32;
        for &(index, value) in fixed {
            if value {
                full |= 1 << index;
            }
        }
        for (position, &index) in free.iter().enumerate() {
            if combo & (1 << position) != 0 {
                full |= 1 << index;
            }
        }
        if (init >> full) & 1 != 0 {
            projected |= 1 << combo;
        }
    }
    projected
}
