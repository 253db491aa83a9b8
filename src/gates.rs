//! Named gate-kernel constructors (C6).
//!
//! Everything here is a thin constructor around [`MatrixKernel`] or
//! [`PermutationKernel`] (see `kernel.rs`) — the unitary (or permutation)
//! is the only thing that varies between gate families, following the
//! split the teacher crate draws between its per-gate `operator/atomic/*`
//! modules and the single generic apply loop in `backend/single_thread.rs`.
//!
//! Positions passed by callers (targets, then controls) become the
//! `masks.qubit_masks` order `MatrixKernel`/`PermutationKernel` rely on.

use std::f64::consts::FRAC_1_SQRT_2;

use crate::kernel::{GateKernel, MatrixKernel, PermutationKernel};
use crate::types::{C, C_IMAG, C_ONE, C_ZERO};

const SQRT_1_2: C = C {
    re: FRAC_1_SQRT_2,
    im: 0.0,
};

/// Kronecker power of a single-qubit 2x2 matrix (row-major, `[a,b,c,d]`),
/// used by the n-Pauli gate families (`x_n`, `y_n`, `z_n`).
pub fn kron_pow(base: [C; 4], k: usize) -> Vec<C> {
    let mut acc = vec![C_ONE];
    for _ in 0..k {
        let dim = (acc.len() as f64).sqrt() as usize;
        let new_dim = dim * 2;
        let mut next = vec![C_ZERO; new_dim * new_dim];
        for r in 0..dim {
            for c in 0..dim {
                let v = acc[r * dim + c];
                for br in 0..2 {
                    for bc in 0..2 {
                        let nr = r * 2 + br;
                        let nc = c * 2 + bc;
                        next[nr * new_dim + nc] = v * base[br * 2 + bc];
                    }
                }
            }
        }
        acc = next;
    }
    acc
}

fn pauli_x() -> [C; 4] {
    [C_ZERO, C_ONE, C_ONE, C_ZERO]
}

fn pauli_y() -> [C; 4] {
    [C_ZERO, -C_IMAG, C_IMAG, C_ZERO]
}

fn pauli_z() -> [C; 4] {
    [C_ONE, C_ZERO, C_ZERO, -C_ONE]
}

/// Hadamard, 0 controls.
pub fn hadamard(control_count: usize) -> MatrixKernel {
    MatrixKernel::new(1, control_count, vec![SQRT_1_2, SQRT_1_2, SQRT_1_2, -SQRT_1_2])
}

/// Pauli-X ("NOT"), optionally controlled (`control_count` controls
/// makes this a Toffoli for `control_count == 2`).
pub fn pauli_x_gate(control_count: usize) -> MatrixKernel {
    MatrixKernel::new(1, control_count, pauli_x().to_vec())
}

pub fn pauli_y_gate(control_count: usize) -> MatrixKernel {
    MatrixKernel::new(1, control_count, pauli_y().to_vec())
}

pub fn pauli_z_gate(control_count: usize) -> MatrixKernel {
    MatrixKernel::new(1, control_count, pauli_z().to_vec())
}

/// `k`-qubit tensor power of Pauli-X/Y/Z, `k <= MAX_ARITY`.
pub fn pauli_x_n(k: usize, control_count: usize) -> MatrixKernel {
    MatrixKernel::new(k, control_count, kron_pow(pauli_x(), k))
}

pub fn pauli_y_n(k: usize, control_count: usize) -> MatrixKernel {
    MatrixKernel::new(k, control_count, kron_pow(pauli_y(), k))
}

pub fn pauli_z_n(k: usize, control_count: usize) -> MatrixKernel {
    MatrixKernel::new(k, control_count, kron_pow(pauli_z(), k))
}

/// `exp(-i * angle/2 * X)`.
pub fn rx(angle: f64, control_count: usize) -> MatrixKernel {
    let half = angle / 2.0;
    let cos = C::new(half.cos(), 0.0);
    let i_sin = C::new(0.0, half.sin());
    MatrixKernel::new(1, control_count, vec![cos, -i_sin, -i_sin, cos])
}

/// `exp(-i * angle/2 * Y)`.
pub fn ry(angle: f64, control_count: usize) -> MatrixKernel {
    let half = angle / 2.0;
    let cos = C::new(half.cos(), 0.0);
    let sin = C::new(half.sin(), 0.0);
    MatrixKernel::new(1, control_count, vec![cos, -sin, sin, cos])
}

/// `exp(-i * angle/2 * Z)`.
pub fn rz(angle: f64, control_count: usize) -> MatrixKernel {
    let half = angle / 2.0;
    let phase = C::new(half.cos(), -half.sin());
    MatrixKernel::new(1, control_count, vec![phase.conj(), C_ZERO, C_ZERO, phase])
}

/// Phase shift `diag(1, exp(i * angle))` — S (`angle = pi/2`) and T
/// (`angle = pi/4`) are the conventional special cases, exposed below.
pub fn phase_shift(angle: f64, control_count: usize) -> MatrixKernel {
    let phase = C::from_polar(1.0, angle);
    MatrixKernel::new(1, control_count, vec![C_ONE, C_ZERO, C_ZERO, phase])
}

pub fn s_gate(control_count: usize) -> MatrixKernel {
    phase_shift(std::f64::consts::FRAC_PI_2, control_count)
}

pub fn t_gate(control_count: usize) -> MatrixKernel {
    phase_shift(std::f64::consts::FRAC_PI_4, control_count)
}

/// Arbitrary single-qubit unitary supplied by the caller (row-major 2x2),
/// grounds the teacher's `U1` family.
pub fn u1(matrix: [C; 4], control_count: usize) -> MatrixKernel {
    MatrixKernel::new(1, control_count, matrix.to_vec())
}

/// Phase shift in coefficient form: `diag(1, coeff)` for an arbitrary
/// unit-modulus `coeff`, rather than the angle form `phase_shift` takes.
/// `coeff` is not checked to lie on the unit circle — a caller supplying
/// one that doesn't gets a non-unitary (but otherwise well-defined)
/// diagonal kernel, same contract as `phase_shift`'s angle form.
pub fn phase_shift_coeff(coeff: C, control_count: usize) -> MatrixKernel {
    MatrixKernel::new(1, control_count, vec![C_ONE, C_ZERO, C_ZERO, coeff])
}

/// Two-angle phase-shift form (the conventional `U2(phi, lambda)`):
/// `1/sqrt(2) * [[1, -e^{i lambda}], [e^{i phi}, e^{i(phi+lambda)}]]`.
pub fn u2(phi: f64, lambda: f64, control_count: usize) -> MatrixKernel {
    let e_phi = C::from_polar(1.0, phi);
    let e_lambda = C::from_polar(1.0, lambda);
    let matrix = vec![SQRT_1_2, -SQRT_1_2 * e_lambda, SQRT_1_2 * e_phi, SQRT_1_2 * e_phi * e_lambda];
    MatrixKernel::new(1, control_count, matrix)
}

/// Three-angle phase-shift form (the conventional `U3(theta, phi, lambda)`),
/// the most general single-qubit unitary up to a global phase.
pub fn u3(theta: f64, phi: f64, lambda: f64, control_count: usize) -> MatrixKernel {
    let half = theta / 2.0;
    let cos = C::new(half.cos(), 0.0);
    let sin = C::new(half.sin(), 0.0);
    let e_phi = C::from_polar(1.0, phi);
    let e_lambda = C::from_polar(1.0, lambda);
    let matrix = vec![cos, -sin * e_lambda, sin * e_phi, cos * e_phi * e_lambda];
    MatrixKernel::new(1, control_count, matrix)
}

/// `exp(i * theta * P)` for a single-qubit Pauli axis `P`, the
/// "exponential Pauli" family distinct from the half-angle rotation
/// convention `rx`/`ry`/`rz` use (those are `exp(-i * angle/2 * P)`).
/// `axis` selects X (0), Y (1) or Z (2).
pub fn exp_pauli(axis: u8, theta: f64, control_count: usize) -> MatrixKernel {
    let cos = C::new(theta.cos(), 0.0);
    let sin = C::new(theta.sin(), 0.0);
    let i_sin = C::new(0.0, theta.sin());
    let matrix = match axis {
        0 => vec![cos, i_sin, i_sin, cos],
        1 => vec![cos, sin, -sin, cos],
        2 => vec![cos + i_sin, C_ZERO, C_ZERO, cos - i_sin],
        other => panic!("exp_pauli: axis must be 0 (X), 1 (Y) or 2 (Z), got {other}"),
    };
    MatrixKernel::new(1, control_count, matrix)
}

/// `X` rotation by a fixed `pi/2`, the conventional "square root of X"
/// member of the rotation family named directly in the gate catalogue.
pub fn sqrt_x(control_count: usize) -> MatrixKernel {
    rx(std::f64::consts::FRAC_PI_2, control_count)
}

/// `Y` rotation by a fixed `pi/2`.
pub fn sqrt_y(control_count: usize) -> MatrixKernel {
    ry(std::f64::consts::FRAC_PI_2, control_count)
}

/// Explicit alias for Pauli-X under its classical-logic-gate name.
pub fn not_gate(control_count: usize) -> MatrixKernel {
    pauli_x_gate(control_count)
}

/// The "V" gate (`sqrt(X)` up to a global phase): `1/2 * [[1+i, 1-i], [1-i, 1+i]]`.
/// Two-qubit family member is this kernel with `control_count >= 1`
/// ("controlled-V").
pub fn v_gate(control_count: usize) -> MatrixKernel {
    let half = C::new(0.5, 0.0);
    let p = half * C::new(1.0, 1.0);
    let m = half * C::new(1.0, -1.0);
    MatrixKernel::new(1, control_count, vec![p, m, m, p])
}

/// SWAP over two targets, no controls beyond `control_count` further
/// ones (Fredkin for `control_count == 1`).
pub fn swap(control_count: usize) -> PermutationKernel<impl Fn(usize) -> usize + Sync> {
    PermutationKernel::new(2, control_count, |b: usize| match b {
        0b01 => 0b10,
        0b10 => 0b01,
        other => other,
    })
}

/// `exp(-i * angle/2 * SWAP)`: interpolates between identity and SWAP on
/// the odd-parity subspace, fixes the even-parity one.
pub fn exp_swap(angle: f64, control_count: usize) -> MatrixKernel {
    let half = angle / 2.0;
    let cos = C::new(half.cos(), 0.0);
    let i_sin = C::new(0.0, half.sin());
    #[rustfmt::skip]
    let matrix = vec![
        C_ONE, C_ZERO, C_ZERO, C_ZERO,
        C_ZERO, cos,   -i_sin, C_ZERO,
        C_ZERO, -i_sin, cos,  C_ZERO,
        C_ZERO, C_ZERO, C_ZERO, C_ONE,
    ];
    MatrixKernel::new(2, control_count, matrix)
}

/// Arbitrary index permutation over `target_count` target qubits —
/// grounds the teacher's Shor-box family, where the action is defined
/// by the modular-exponentiation circuit rather than a fixed matrix.
pub fn shor_box<F: Fn(usize) -> usize + Sync>(
    target_count: usize,
    control_count: usize,
    permutation: F,
) -> PermutationKernel<F> {
    PermutationKernel::new(target_count, control_count, permutation)
}

/// Every kernel in this module is a [`GateKernel`]; re-exported to make
/// call sites generic over "some gate" without naming the concrete type.
pub fn arity_of(kernel: &dyn GateKernel) -> usize {
    kernel.arity()
}
