#![allow(dead_code)]
#![warn(clippy::cargo)]
#![allow(clippy::comparison_chain)]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod diagonal;
pub mod error;
pub mod gates;
pub mod index;
pub mod interchange;
pub mod iterator;
pub mod kernel;
pub mod mask;
pub mod measurement;
pub mod permutation;
pub mod qubit;
pub mod simulator;
pub mod transport;
pub mod types;

#[doc(hidden)]
pub mod prelude {
    pub use crate::config::SimConfig;
    pub use crate::error::{SimError, SimResult};
    pub use crate::simulator::Simulator;
    pub use crate::transport::{LocalTransport, Transport};
}
