//! Error domain for the simulator core.
//!
//! Most contracts in this crate (qubit ranges, mask arity, permutation
//! bijectivity) are caller-side invariants and are enforced with
//! `debug_assert!` rather than `Result`, the same treatment applied to
//! register-size/qubit-index mismatches elsewhere in this crate. `SimError` is reserved for
//! the handful of entry points whose failure is a legitimate runtime
//! condition: a gate family pushed past its documented qubit-count limit,
//! or a `Transport` implementation reporting a collective failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("{family} accepts at most {limit} qubits, got {requested}")]
    TooManyQubits {
        family: &'static str,
        requested: usize,
        limit: usize,
    },

    #[error("qubit position {qubit} is out of range for a {n}-qubit register")]
    InvalidQubit { qubit: usize, n: usize },

    #[error("{what} must be a power of two, got {value}")]
    NotAPowerOfTwo { what: &'static str, value: usize },

    #[error("transport operation failed: {0}")]
    Transport(String),
}

pub type SimResult<T = ()> = Result<T, SimError>;
