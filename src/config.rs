//! Run-time configuration for a [`crate::simulator::Simulator`].
//!
//! A plain struct with a builder-style `with_*` API, in the style of a
//! `BackendBuilder` but without the trait indirection: there is only
//! ever one shape of configuration here, so a builder trait would add
//! a layer with nothing to abstract over.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimConfig {
    /// log2 of the per-process cache size C. Gates whose operated qubits
    /// all sit below this boundary take the in-place windowed path.
    pub num_on_cache_qubits: usize,
    /// Case 2/3 dispatch strategy: `true` relocates off-cache operated
    /// qubits onto free on-cache slots and runs the Case-1 windowed
    /// algorithm against them (`run_case23_relocated`); `false` leaves
    /// every qubit where it is and recomputes `index_with_qubits`
    /// against the unrelocated positions on every amplitude
    /// (`run_case23_transform`).
    pub use_on_cache_state_vector: bool,
    /// Master switch for the cache-tiered gate iterator. When `false`,
    /// every gate takes the nocache path regardless of qubit positions.
    pub enable_cache_aware_gate_function: bool,
    /// Prefer MPI-style collective calls over point-to-point exchange
    /// during interchange, where the `Transport` backend supports it.
    pub use_collective_communications: bool,
    /// Route diagonal gate families through the communication-free
    /// diagonal loop instead of the general interchange + iterator path.
    pub use_diagonal_loop: bool,
    /// Insert a transport barrier immediately before each interchange
    /// round that actually moves a qubit (a no-op interchange call
    /// fires neither the barrier nor the log pair).
    pub use_barrier: bool,
    pub num_threads_per_process: usize,
    pub print_log: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            num_on_cache_qubits: 16,
            use_on_cache_state_vector: true,
            enable_cache_aware_gate_function: true,
            use_collective_communications: false,
            use_diagonal_loop: true,
            use_barrier: false,
            num_threads_per_process: 1,
            print_log: false,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_on_cache_qubits(mut self, n: usize) -> Self {
        self.num_on_cache_qubits = n;
        self
    }

    pub fn with_use_on_cache_state_vector(mut self, v: bool) -> Self {
        self.use_on_cache_state_vector = v;
        self
    }

    pub fn with_enable_cache_aware_gate_function(mut self, v: bool) -> Self {
        self.enable_cache_aware_gate_function = v;
        self
    }

    pub fn with_use_collective_communications(mut self, v: bool) -> Self {
        self.use_collective_communications = v;
        self
    }

    pub fn with_use_diagonal_loop(mut self, v: bool) -> Self {
        self.use_diagonal_loop = v;
        self
    }

    pub fn with_use_barrier(mut self, v: bool) -> Self {
        self.use_barrier = v;
        self
    }

    pub fn with_num_threads_per_process(mut self, n: usize) -> Self {
        self.num_threads_per_process = n;
        self
    }

    pub fn with_print_log(mut self, v: bool) -> Self {
        self.print_log = v;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.num_on_cache_qubits, 16);
        assert!(cfg.use_on_cache_state_vector);
        assert!(cfg.enable_cache_aware_gate_function);
        assert!(!cfg.use_collective_communications);
        assert!(cfg.use_diagonal_loop);
        assert!(!cfg.use_barrier);
        assert_eq!(cfg.num_threads_per_process, 1);
        assert!(!cfg.print_log);
    }

    #[test]
    fn builder_chains() {
        let cfg = SimConfig::new()
            .with_num_on_cache_qubits(4)
            .with_use_diagonal_loop(false);
        assert_eq!(cfg.num_on_cache_qubits, 4);
        assert!(!cfg.use_diagonal_loop);
    }
}
