//! Diagonal-gate fast path (C8): for gate families whose action is a
//! pure phase multiplier (no amplitude movement), skip the interchange
//! protocol and the general gate iterator entirely and scan the local
//! array once, since a diagonal gate never needs an off-cache operated
//! qubit to be relocated — only the matching local bit of each index.
//!
//! Grounded on `ket`'s diagonal-gate specialization
//! (`examples/original_source/ket/include/ket/mpi/gate/detail/exponential_pauli_z_diagonal.hpp`),
//! which likewise short-circuits the distributed apply when every
//! control bit sits on a global qubit that this process does not hold
//! as `1`: such a process contributes nothing and can skip the local
//! scan, and no communication is needed to discover that, since a
//! process always knows its own rank bits.
//!
//! The teacher's "up to four per-target-state closures" become a single
//! `multiplier(pattern) -> C` closure here: `pattern` is the bit pattern
//! of the local target positions, in the caller's argument order, and
//! the closure returns the phase (or more general diagonal entry) to
//! multiply the amplitude by.

use crate::permutation::PermutationMap;
use crate::types::C;

/// Apply a diagonal gate in place over `psi`. `targets` and `global_controls`
/// are logical qubit indices; `multiplier` is called once per distinct
/// local target bit-pattern actually present (not once per amplitude),
/// matched by index into `psi` via its local physical position.
///
/// P12: if `global_controls` names any qubit whose global (off-local)
/// bit is `0` on this process/rank, the gate contributes nothing here
/// and the function returns immediately without touching `psi` or
/// issuing any `Transport` call.
pub fn diagonal_loop<F: Fn(usize) -> C>(
    psi: &mut [C],
    pi: &PermutationMap,
    targets: &[usize],
    global_controls: &[usize],
    l: usize,
    rank: usize,
    multiplier: F,
) {
    for &control in global_controls {
        let physical = pi.physical_of(control);
        if physical < l {
            // A local control still gates per-amplitude below; only
            // *global* controls can be resolved against this rank ahead
            // of time.
            continue;
        }
        let global_bit = physical - l;
        if (rank >> global_bit) & 1 == 0 {
            return;
        }
    }

    let local_controls: Vec<usize> = global_controls
        .iter()
        .map(|&q| pi.physical_of(q))
        .filter(|&p| p < l)
        .collect();
    let local_control_mask: usize = local_controls.iter().map(|&p| 1usize << p).sum();

    let target_positions: Vec<usize> = targets.iter().map(|&q| pi.physical_of(q)).collect();
    debug_assert!(target_positions.iter().all(|&p| p < l), "diagonal targets must be local");

    for idx in 0..psi.len() {
        if idx & local_control_mask != local_control_mask {
            continue;
        }
        let mut pattern = 0usize;
        for (bit, &p) in target_positions.iter().enumerate() {
            if (idx >> p) & 1 == 1 {
                pattern |= 1 << bit;
            }
        }
        psi[idx] *= multiplier(pattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{C_ONE, C_ZERO};

    #[test]
    fn rz_style_phase_applies_only_where_target_bit_is_one() {
        let mut psi = vec![C_ONE, C_ONE, C_ONE, C_ONE];
        let pi = PermutationMap::identity(2);
        let phase = C::new(0.0, 1.0);
        diagonal_loop(&mut psi, &pi, &[0], &[], 2, 0, |pattern| if pattern == 1 { phase } else { C_ONE });
        assert_eq!(psi[0], C_ONE);
        assert_eq!(psi[1], phase);
        assert_eq!(psi[2], C_ONE);
        assert_eq!(psi[3], phase);
    }

    #[test]
    fn unmet_global_control_short_circuits_without_touching_psi() {
        let mut psi = vec![C_ONE, C_ZERO, C_ZERO, C_ZERO];
        let before = psi.clone();
        // qubit 2 sits at physical position 2, which is global when l = 2.
        let pi = PermutationMap::identity(3);
        diagonal_loop(&mut psi, &pi, &[0], &[2], 2, /* rank = */ 0, |_| C::new(-1.0, 0.0));
        assert_eq!(psi, before);
    }
}
