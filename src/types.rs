//! Scalar type aliases shared by every module.
//!
//! Mirrors the teacher crate's `math::types` module: a handful of short
//! aliases rather than a generic-over-float-width design, since every
//! caller in this ecosystem works in `f64`.

pub use num_complex::Complex64 as C;

/// Qubit count / position index.
pub type N = usize;
/// Signed counterpart, used for address-difference arithmetic (C1's `difference`).
pub type Z = isize;
/// Real scalar (probabilities, angles, norms).
pub type R = f64;
/// Bitmask over qubit positions (and, doubling as the same representation,
/// over full amplitude indices).
pub type Mask = usize;

pub const C_ZERO: C = C { re: 0.0, im: 0.0 };
pub const C_ONE: C = C { re: 1.0, im: 0.0 };
pub const C_IMAG: C = C { re: 0.0, im: 1.0 };

/// Hard arity ceiling shared by every per-family limit in the error domain:
/// 6 for n-Pauli families, 6 total qubits for multi-controlled n-Pauli
/// families, 5 targets + 1 control etc. Fixed-capacity arrays throughout the
/// crate are sized off this constant instead of a generic integer-width
/// template parameter (see DESIGN.md, REDESIGN FLAGS).
pub const MAX_ARITY: usize = 6;

/// Per-family arity limits named in §6's error domain. A gate family is
/// classified by its kernel's `(target_count, control_count)` split
/// (see [`crate::kernel::GateKernel`]):
///   - no controls: an n-Pauli family, target count alone is bounded by
///     [`MAX_N_PAULI_TARGETS`];
///   - a single target with one or more controls: an n-controlled-single
///     family, control count alone is bounded by [`MAX_CONTROLLED_SINGLE_CONTROLS`];
///   - more than one target with one or more controls: a multi-controlled
///     n-Pauli family, whose *total* qubit count is bounded by [`MAX_ARITY`].
pub const MAX_N_PAULI_TARGETS: usize = 6;
pub const MAX_CONTROLLED_SINGLE_CONTROLS: usize = 5;
