//! Per-gate amplitude kernels (C6).
//!
//! A kernel is the innermost unit of work the gate iterator (C5) drives:
//! given the `2^k` amplitudes addressed by one compressed index and the
//! full bit-pattern space, it produces the `2^k` output amplitudes. The
//! iterator itself never inspects which gate family it is running; it
//! only calls `GateKernel::apply_block`, the same split the teacher
//! crate draws between its `enum_dispatch`-based kernel enum
//! (`operator/atomic/dispatch.rs`) and the generic apply loop in
//! `backend/single_thread.rs`.
//!
//! Two concrete kernels cover every gate family in this crate:
//! [`MatrixKernel`] (every family whose action is a small dense unitary,
//! optionally gated by control qubits) and [`PermutationKernel`] (the
//! generalized-SWAP / "Shor box" family, whose action is an opaque
//! index permutation over the target bits rather than a linear map).

use crate::index::index_with_qubits;
use crate::mask::GateMasks;
use crate::types::{C, C_ZERO};

pub trait GateKernel: Sync {
    fn arity(&self) -> usize;

    /// Number of target (non-control) qubits this kernel's matrix/
    /// permutation acts over. Paired with [`Self::control_count`] so
    /// callers can classify a gate into the per-family arity limit §6
    /// names (n-Pauli vs. n-controlled-single vs. multi-controlled
    /// n-Pauli) without the kernel needing to know about that
    /// classification itself.
    fn target_count(&self) -> usize;

    /// Number of control qubits gating this kernel's action.
    fn control_count(&self) -> usize;

    /// Apply this kernel to the single `2^k`-amplitude block selected by
    /// `index_wo_qubits`, reading from `psi_in` and writing to
    /// `psi_out`. `masks` must have been built from the same position
    /// list (and order) the kernel was constructed against.
    fn apply_block(&self, psi_in: &[C], psi_out: &mut [C], index_wo_qubits: usize, masks: &GateMasks);
}

/// Dense-unitary kernel over `target_count` target qubits, optionally
/// controlled by `control_count` further qubits. Positions passed to
/// [`crate::mask::build_masks`] (and so `masks.qubit_masks`) must list
/// targets first, then controls, in that order — `apply_block` relies
/// on it to split `B`'s bits into target bits and control bits.
///
/// This single struct represents every linear-action gate family named
/// in this crate: Pauli rotations, phase shift, exp-Pauli-Z/X/Y,
/// Hadamard, SWAP family, controlled variants and n-Pauli/Toffoli-style
/// multi-qubit gates — the unitary itself, not the control-handling, is
/// what distinguishes them, so it is the only thing that varies between
/// constructors.
pub struct MatrixKernel {
    target_count: usize,
    control_count: usize,
    /// Row-major `2^target_count` square matrix.
    matrix: Vec<C>,
}

impl MatrixKernel {
    pub fn new(target_count: usize, control_count: usize, matrix: Vec<C>) -> Self {
        let dim = 1usize << target_count;
        debug_assert_eq!(matrix.len(), dim * dim);
        MatrixKernel {
            target_count,
            control_count,
            matrix,
        }
    }

    fn dim(&self) -> usize {
        1usize << self.target_count
    }
}

impl GateKernel for MatrixKernel {
    fn arity(&self) -> usize {
        self.target_count + self.control_count
    }

    fn target_count(&self) -> usize {
        self.target_count
    }

    fn control_count(&self) -> usize {
        self.control_count
    }

    fn apply_block(&self, psi_in: &[C], psi_out: &mut [C], index_wo_qubits: usize, masks: &GateMasks) {
        let t = self.target_count;
        let k = self.arity();
        let dim = self.dim();
        let all_controls_mask = (1usize << k) - (1usize << t);

        // Controls not all 1: identity copy-through for every bit
        // pattern in this family.
        for b in 0..(1usize << k) {
            if (b & all_controls_mask) != all_controls_mask {
                let idx = index_with_qubits(index_wo_qubits, b, masks);
                psi_out[idx] = psi_in[idx];
            }
        }

        let base_b = all_controls_mask; // all controls = 1, all target bits = 0

        let mut vec_in = [C_ZERO; 1 << 6];
        for row in 0..dim {
            let idx = index_with_qubits(index_wo_qubits, base_b | row, masks);
            vec_in[row] = psi_in[idx];
        }
        for row in 0..dim {
            let mut acc = C_ZERO;
            for col in 0..dim {
                acc += self.matrix[row * dim + col] * vec_in[col];
            }
            let idx = index_with_qubits(index_wo_qubits, base_b | row, masks);
            psi_out[idx] = acc;
        }
    }
}

/// Generalized-SWAP kernel: permutes the `2^target_count` amplitudes of
/// the active (all-controls-satisfied) block through an arbitrary
/// bijection rather than a dense matrix product. Grounds the "Shor box"
/// family and ordinary SWAP/controlled-SWAP (whose permutation is the
/// identity with two entries transposed).
pub struct PermutationKernel<F: Fn(usize) -> usize + Sync> {
    target_count: usize,
    control_count: usize,
    permutation: F,
}

impl<F: Fn(usize) -> usize + Sync> PermutationKernel<F> {
    pub fn new(target_count: usize, control_count: usize, permutation: F) -> Self {
        PermutationKernel {
            target_count,
            control_count,
            permutation,
        }
    }
}

impl<F: Fn(usize) -> usize + Sync> GateKernel for PermutationKernel<F> {
    fn arity(&self) -> usize {
        self.target_count + self.control_count
    }

    fn target_count(&self) -> usize {
        self.target_count
    }

    fn control_count(&self) -> usize {
        self.control_count
    }

    fn apply_block(&self, psi_in: &[C], psi_out: &mut [C], index_wo_qubits: usize, masks: &GateMasks) {
        let t = self.target_count;
        let k = self.arity();
        let dim = 1usize << t;
        let all_controls_mask = (1usize << k) - dim;

        for b in 0..(1usize << k) {
            let idx = index_with_qubits(index_wo_qubits, b, masks);
            if (b & all_controls_mask) != all_controls_mask {
                psi_out[idx] = psi_in[idx];
                continue;
            }
            let target_bits = b & (dim - 1);
            let mapped = (self.permutation)(target_bits);
            debug_assert!(mapped < dim, "permutation kernel must stay within target range");
            let src_b = all_controls_mask | mapped;
            let src_idx = index_with_qubits(index_wo_qubits, src_b, masks);
            psi_out[idx] = psi_in[src_idx];
        }
    }
}
