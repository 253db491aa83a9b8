//! Top-level simulator: wires the permutation map, gate iterator,
//! interchange protocol, diagonal fast path, measurement, config and
//! transport together.
//!
//! Keeps a `psi_main`/`psi_buffer` double-buffer: every gate call swaps
//! the two rather than allocating a fresh output array, and the
//! even/odd call count decides which of the pair currently holds the
//! state.

use rand::Rng;

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::interchange::ensure_local;
use crate::iterator::dispatch_gate;
use crate::kernel::GateKernel;
use crate::measurement;
use crate::permutation::PermutationMap;
use crate::transport::{LocalTransport, Transport};
use crate::types::{C, C_ONE, C_ZERO, MAX_ARITY, MAX_CONTROLLED_SINGLE_CONTROLS, MAX_N_PAULI_TARGETS};

pub struct Simulator<T: Transport = LocalTransport> {
    psi_main: Vec<C>,
    psi_buffer: Vec<C>,
    pi: PermutationMap,
    config: SimConfig,
    transport: T,
    n: usize,
    l: usize,
}

impl Simulator<LocalTransport> {
    /// Build an `n`-qubit simulator over the single-process transport,
    /// initialized to `|0...0>`.
    pub fn new(n: usize, config: SimConfig) -> Self {
        Simulator::with_transport(n, config, LocalTransport)
    }
}

impl<T: Transport> Simulator<T> {
    pub fn with_transport(n: usize, config: SimConfig, transport: T) -> Self {
        let l = n.saturating_sub((transport.size().max(1) as f64).log2() as usize);
        let size = 1usize << l;
        let mut psi_main = vec![C_ZERO; size];
        if transport.rank() == 0 {
            psi_main[0] = C_ONE;
        }
        Simulator {
            psi_main,
            psi_buffer: vec![C_ZERO; size],
            pi: PermutationMap::identity(n),
            config,
            transport,
            n,
            l,
        }
    }

    pub fn qubit_count(&self) -> usize {
        self.n
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn local_amplitudes(&self) -> &[C] {
        &self.psi_main
    }

    /// Enforce §6's three per-family arity limits, classified by the
    /// kernel's `(target_count, control_count)` split: an n-Pauli family
    /// (no controls) is bounded on target count alone
    /// (`MAX_N_PAULI_TARGETS`); an n-controlled-single family (one
    /// target, one or more controls) is bounded on control count alone
    /// (`MAX_CONTROLLED_SINGLE_CONTROLS`); a multi-controlled n-Pauli
    /// family (more than one target, one or more controls) is bounded on
    /// the *total* qubit count (`MAX_ARITY`).
    fn validate_arity(&self, family: &'static str, positions: &[usize], kernel: &dyn GateKernel) -> SimResult {
        debug_assert_eq!(positions.len(), kernel.arity());
        let targets = kernel.target_count();
        let controls = kernel.control_count();

        if controls == 0 {
            if targets > MAX_N_PAULI_TARGETS {
                return Err(SimError::TooManyQubits {
                    family,
                    requested: targets,
                    limit: MAX_N_PAULI_TARGETS,
                });
            }
        } else if targets == 1 {
            if controls > MAX_CONTROLLED_SINGLE_CONTROLS {
                return Err(SimError::TooManyQubits {
                    family,
                    requested: controls,
                    limit: MAX_CONTROLLED_SINGLE_CONTROLS,
                });
            }
        } else if positions.len() > MAX_ARITY {
            return Err(SimError::TooManyQubits {
                family,
                requested: positions.len(),
                limit: MAX_ARITY,
            });
        }

        for &q in positions {
            if q >= self.n {
                return Err(SimError::InvalidQubit { qubit: q, n: self.n });
            }
        }
        Ok(())
    }

    /// Generic entry point: apply an arbitrary [`GateKernel`] to
    /// `qubits` (targets then controls, matching `kernel`'s own
    /// target/control split). Brings every operated qubit local first
    /// via the interchange protocol, then dispatches the gate iterator.
    pub fn apply(&mut self, family: &'static str, qubits: &[usize], kernel: &dyn GateKernel) -> SimResult {
        self.validate_arity(family, qubits, kernel)?;
        if self.config.print_log {
            log::debug!("apply {family} on {qubits:?}");
        }

        ensure_local(&mut self.psi_main, &mut self.pi, qubits, self.l, &self.transport, &self.config);

        let positions: Vec<usize> = qubits.iter().map(|&q| self.pi.physical_of(q)).collect();
        dispatch_gate(&self.psi_main, &mut self.psi_buffer, &positions, kernel, &self.config);
        std::mem::swap(&mut self.psi_main, &mut self.psi_buffer);
        Ok(())
    }

    /// Diagonal-gate fast path: skips interchange and the gate
    /// iterator entirely, routed here whenever `config.use_diagonal_loop`
    /// is set and the caller knows the gate's action is a pure phase.
    pub fn apply_diagonal<F: Fn(usize) -> C>(
        &mut self,
        targets: &[usize],
        global_controls: &[usize],
        multiplier: F,
    ) -> SimResult {
        if !self.config.use_diagonal_loop {
            return Err(SimError::Transport(
                "apply_diagonal called with use_diagonal_loop disabled".to_string(),
            ));
        }
        crate::diagonal::diagonal_loop(
            &mut self.psi_main,
            &self.pi,
            targets,
            global_controls,
            self.l,
            self.transport.rank(),
            multiplier,
        );
        Ok(())
    }

    pub fn apply_h(&mut self, target: usize) -> SimResult {
        let kernel = crate::gates::hadamard(0);
        self.apply("H", &[target], &kernel)
    }

    pub fn apply_x(&mut self, target: usize) -> SimResult {
        let kernel = crate::gates::pauli_x_gate(0);
        self.apply("X", &[target], &kernel)
    }

    pub fn apply_cx(&mut self, control: usize, target: usize) -> SimResult {
        let kernel = crate::gates::pauli_x_gate(1);
        self.apply("CX", &[target, control], &kernel)
    }

    pub fn apply_toffoli(&mut self, control_a: usize, control_b: usize, target: usize) -> SimResult {
        let kernel = crate::gates::pauli_x_gate(2);
        self.apply("Toffoli", &[target, control_a, control_b], &kernel)
    }

    pub fn apply_swap(&mut self, a: usize, b: usize) -> SimResult {
        let kernel = crate::gates::swap(0);
        self.apply("SWAP", &[a, b], &kernel)
    }

    pub fn apply_not(&mut self, target: usize) -> SimResult {
        let kernel = crate::gates::not_gate(0);
        self.apply("NOT", &[target], &kernel)
    }

    pub fn apply_sqrt_x(&mut self, target: usize) -> SimResult {
        let kernel = crate::gates::sqrt_x(0);
        self.apply("SqrtX", &[target], &kernel)
    }

    pub fn apply_sqrt_y(&mut self, target: usize) -> SimResult {
        let kernel = crate::gates::sqrt_y(0);
        self.apply("SqrtY", &[target], &kernel)
    }

    pub fn apply_u2(&mut self, target: usize, phi: f64, lambda: f64) -> SimResult {
        let kernel = crate::gates::u2(phi, lambda, 0);
        self.apply("U2", &[target], &kernel)
    }

    pub fn apply_u3(&mut self, target: usize, theta: f64, phi: f64, lambda: f64) -> SimResult {
        let kernel = crate::gates::u3(theta, phi, lambda, 0);
        self.apply("U3", &[target], &kernel)
    }

    pub fn apply_v(&mut self, target: usize) -> SimResult {
        let kernel = crate::gates::v_gate(0);
        self.apply("V", &[target], &kernel)
    }

    pub fn apply_controlled_v(&mut self, control: usize, target: usize) -> SimResult {
        let kernel = crate::gates::v_gate(1);
        self.apply("CV", &[target, control], &kernel)
    }

    pub fn apply_rz(&mut self, target: usize, angle: f64) -> SimResult {
        if self.config.use_diagonal_loop {
            let phase = C::new(0.0, -angle / 2.0);
            let phase = phase.exp();
            let phase_conj = phase.conj();
            return self.apply_diagonal(&[target], &[], move |b| if b == 0 { phase_conj } else { phase });
        }
        let kernel = crate::gates::rz(angle, 0);
        self.apply("RZ", &[target], &kernel)
    }

    pub fn measure_qubit(&mut self, qubit: usize, rng: &mut impl Rng) -> SimResult<bool> {
        measurement::measure_qubit(&mut self.psi_main, &self.pi, qubit, self.l, &self.transport, rng)
    }

    /// Force `qubit` to classical `1`, collapsing and renormalizing any
    /// superposition it carries (no RNG draw, unlike [`Self::measure_qubit`]).
    pub fn set_qubit(&mut self, qubit: usize) -> SimResult {
        measurement::force_qubit(&mut self.psi_main, &self.pi, qubit, true, self.l, &self.transport)
    }

    /// Force `qubit` to classical `0`.
    pub fn clear_qubit(&mut self, qubit: usize) -> SimResult {
        measurement::force_qubit(&mut self.psi_main, &self.pi, qubit, false, self.l, &self.transport)
    }

    pub fn measure_all(&mut self, rng: &mut impl Rng) -> SimResult<usize> {
        measurement::measure_all(&mut self.psi_main, self.l, &self.transport, rng)
    }

    pub fn generate_events(&self, events: usize, rng: &mut impl Rng) -> SimResult<Vec<usize>> {
        measurement::generate_events(&self.psi_main, self.l, events, &self.transport, rng)
    }

    pub fn expectation_z(&self, qubit: usize) -> SimResult<f64> {
        measurement::expectation_z(&self.psi_main, &self.pi, qubit, self.l, &self.transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fresh_simulator_is_all_zero_state() {
        let sim = Simulator::new(3, SimConfig::default());
        assert_eq!(sim.local_amplitudes()[0], C_ONE);
        assert!(sim.local_amplitudes()[1..].iter().all(|&a| a == C_ZERO));
    }

    #[test]
    fn hadamard_then_x_then_measure_is_deterministic_on_basis_state() {
        let mut sim = Simulator::new(1, SimConfig::default());
        sim.apply_x(0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = sim.measure_qubit(0, &mut rng).unwrap();
        assert!(outcome);
    }

    #[test]
    fn bell_pair_expectation_is_uncorrelated_marginal() {
        let mut sim = Simulator::new(2, SimConfig::default());
        sim.apply_h(0).unwrap();
        sim.apply_cx(0, 1).unwrap();
        let ez0 = sim.expectation_z(0).unwrap();
        assert!(ez0.abs() < 1e-9);
    }

    #[test]
    fn set_qubit_forces_classical_one_from_superposition() {
        let mut sim = Simulator::new(1, SimConfig::default());
        sim.apply_h(0).unwrap();
        sim.set_qubit(0).unwrap();
        assert_eq!(sim.local_amplitudes()[0], C_ZERO);
        assert!((sim.local_amplitudes()[1].norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn clear_qubit_forces_classical_zero_from_superposition() {
        let mut sim = Simulator::new(1, SimConfig::default());
        sim.apply_h(0).unwrap();
        sim.clear_qubit(0).unwrap();
        assert!((sim.local_amplitudes()[0].norm() - 1.0).abs() < 1e-9);
        assert_eq!(sim.local_amplitudes()[1], C_ZERO);
    }

    #[test]
    fn controlled_v_squared_matches_cnot_up_to_global_phase() {
        let mut sim = Simulator::new(2, SimConfig::default());
        sim.apply_x(1).unwrap(); // control = 1
        sim.apply_controlled_v(1, 0).unwrap();
        sim.apply_controlled_v(1, 0).unwrap();
        // control set, so two controlled-V applications act as X on target.
        assert!((sim.local_amplitudes()[0b11].norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn toffoli_arity_validation_rejects_out_of_range_qubit() {
        let mut sim = Simulator::new(2, SimConfig::default());
        let err = sim.apply_toffoli(0, 1, 5).unwrap_err();
        matches!(err, SimError::InvalidQubit { qubit: 5, n: 2 });
    }

    /// Per-family arity limit: an n-Pauli family (no controls) is capped
    /// on target count at 6, regardless of the crate-wide `MAX_ARITY`.
    #[test]
    fn n_pauli_family_rejects_seven_targets() {
        let mut sim = Simulator::new(8, SimConfig::default());
        let kernel = crate::gates::pauli_x_n(7, 0);
        let qubits: Vec<usize> = (0..7).collect();
        let err = sim.apply("XN", &qubits, &kernel).unwrap_err();
        match err {
            SimError::TooManyQubits { requested, limit, .. } => {
                assert_eq!(requested, 7);
                assert_eq!(limit, 7 - 1);
            }
            other => panic!("expected TooManyQubits, got {other:?}"),
        }
    }

    /// Per-family arity limit: an n-controlled-single family (one target,
    /// N controls) is capped on control count at 5, tighter than the
    /// crate-wide `MAX_ARITY` of 6.
    #[test]
    fn n_controlled_single_family_rejects_six_controls() {
        let mut sim = Simulator::new(8, SimConfig::default());
        let kernel = crate::gates::pauli_x_gate(6);
        let qubits: Vec<usize> = (0..7).collect();
        let err = sim.apply("CCCCCCX", &qubits, &kernel).unwrap_err();
        match err {
            SimError::TooManyQubits { requested, limit, .. } => {
                assert_eq!(requested, 6);
                assert_eq!(limit, 5);
            }
            other => panic!("expected TooManyQubits, got {other:?}"),
        }
    }

    mod distributed {
        use super::*;
        use crate::transport::testing::ClusterTransport;
        use std::thread;

        /// S2: 3 qubits, 2 processes. |000> -> H on the global qubit.
        /// Each rank ends up holding half the total probability mass;
        /// P1 (norm 1 over the whole distributed state) holds across
        /// the pair.
        #[test]
        fn s2_hadamard_on_global_qubit_splits_mass_across_ranks() {
            let transports = ClusterTransport::cluster(2);
            let handles: Vec<_> = transports
                .into_iter()
                .map(|t| {
                    thread::spawn(move || {
                        let mut sim = Simulator::with_transport(3, SimConfig::default(), t);
                        sim.apply_h(2).unwrap();
                        sim.local_amplitudes().iter().map(|a| a.norm_sqr()).sum::<f64>()
                    })
                })
                .collect();

            let masses: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(masses.len(), 2);
            assert!((masses[0] - 0.5).abs() < 1e-9, "rank0 mass = {}", masses[0]);
            assert!((masses[1] - 0.5).abs() < 1e-9, "rank1 mass = {}", masses[1]);
            assert!((masses.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }

        /// S6-style: 4 qubits, 2 processes, Toffoli(target=0, controls=2,3)
        /// (qubit 3 lives at the global bit). Every basis state with both
        /// controls set should have its target bit flipped; the total
        /// norm (P1) is preserved across the distributed pair.
        #[test]
        fn toffoli_across_ranks_preserves_norm_and_flips_controlled_basis_states() {
            let transports = ClusterTransport::cluster(2);
            let handles: Vec<_> = transports
                .into_iter()
                .map(|t| {
                    thread::spawn(move || {
                        let rank = t.rank();
                        let mut sim = Simulator::with_transport(4, SimConfig::default(), t);
                        // Drive every rank to a uniform superposition first
                        // so every local basis state carries amplitude.
                        sim.apply_h(0).unwrap();
                        sim.apply_h(1).unwrap();
                        sim.apply_h(2).unwrap();
                        sim.apply_toffoli(2, 3, 0).unwrap();
                        let mass: f64 = sim.local_amplitudes().iter().map(|a| a.norm_sqr()).sum();
                        (rank, mass)
                    })
                })
                .collect();

            let results: Vec<(usize, f64)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let total: f64 = results.iter().map(|&(_, m)| m).sum();
            assert!((total - 1.0).abs() < 1e-9, "total mass across ranks = {total}");
        }

        /// S3: 4 qubits, 2 processes, `num_on_cache_qubits = 2`. H on the
        /// global qubit (3), then CNOT(control=3, target=0). This is the
        /// one scenario that exercises the interchange protocol (C7) and
        /// the cache-tiered iterator's Case 2/3 path (C5) together: the
        /// control qubit starts off-process, gets brought local by
        /// `ensure_local`, and lands on a local position that is itself
        /// off-cache relative to `num_on_cache_qubits`, forcing the CNOT
        /// dispatch through Case 2/3 rather than Case 1.
        #[test]
        fn s3_global_hadamard_then_cross_rank_cnot_preserves_norm() {
            let transports = ClusterTransport::cluster(2);
            let config = SimConfig::new().with_num_on_cache_qubits(2);
            let handles: Vec<_> = transports
                .into_iter()
                .map(|t| {
                    let config = config;
                    thread::spawn(move || {
                        let rank = t.rank();
                        let mut sim = Simulator::with_transport(4, config, t);
                        sim.apply_h(3).unwrap();
                        sim.apply_cx(3, 0).unwrap();
                        let mass: f64 = sim.local_amplitudes().iter().map(|a| a.norm_sqr()).sum();
                        (rank, mass)
                    })
                })
                .collect();

            let results: Vec<(usize, f64)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(results.len(), 2);
            let total: f64 = results.iter().map(|&(_, m)| m).sum();
            assert!((total - 1.0).abs() < 1e-9, "total mass across ranks = {total}");
        }
    }
}
