//! Measurement and statistics (C9).
//!
//! `measure_qubit` and `measure_all` both reduce to the same shape: sum
//! local probability mass per outcome, combine across ranks via
//! `Transport::all_reduce_sum`, have rank 0 draw from the resulting
//! distribution, then broadcast the draw back out so every rank can
//! collapse its local amplitudes consistently — the same
//! local-sum/root-draw/broadcast structure the teacher crate's
//! `register::QReg::measure` uses for its single-process case, lifted
//! across `Transport`.
//!
//! Grounded on `paged_simple_mpi_state::do_projective_measurement`/
//! `do_measure`
//! (`examples/original_source/bra/src/paged_simple_mpi_state.cpp`),
//! both of which thread a `root` rank and the process's RNG down into
//! a `ket::mpi::gate`/`ket::mpi::measure` call rather than measuring
//! locally on every rank independently.
//!
//! `Transport` (C13) deliberately carries no gather/scan primitive
//! (SPEC_FULL.md keeps the collective surface to what `ket`'s MPI usage
//! needs), so `measure_all`'s full-distribution sampling gathers each
//! rank's local distribution by looping a broadcast over every rank in
//! turn instead of a native `Allgather`.

use rand::Rng;

use crate::error::SimResult;
use crate::permutation::PermutationMap;
use crate::transport::Transport;
use crate::types::{R, C};

/// Probability mass falls below this threshold is logged (not treated as
/// an error) since it usually means an earlier gate left the state
/// numerically unnormalized rather than that the measured qubit is
/// genuinely near-deterministic.
const MIN_BRANCH_PROBABILITY: R = 1e-12;

/// Projective measurement of a single logical qubit, collapsing `psi`
/// and returning the observed bit. `rng` is only consulted on the root
/// rank; every other rank receives the outcome via `broadcast_usize`.
pub fn measure_qubit<T: Transport>(
    psi: &mut [C],
    pi: &PermutationMap,
    qubit: usize,
    l: usize,
    transport: &T,
    rng: &mut impl Rng,
) -> SimResult<bool> {
    let physical = pi.physical_of(qubit);
    let local_prob_one = if physical < l {
        let mask = 1usize << physical;
        psi.iter().enumerate().filter(|(idx, _)| idx & mask != 0).map(|(_, a)| a.norm_sqr()).sum()
    } else {
        let global_bit = physical - l;
        if (transport.rank() >> global_bit) & 1 == 1 {
            psi.iter().map(|a| a.norm_sqr()).sum()
        } else {
            0.0
        }
    };

    let prob_one: R = transport.all_reduce_sum(local_prob_one)?;
    if prob_one < MIN_BRANCH_PROBABILITY || prob_one > 1.0 - MIN_BRANCH_PROBABILITY {
        log::warn!("measure_qubit: near-deterministic branch (P(1) = {prob_one}), check normalization");
    }

    let draw = if transport.rank() == 0 {
        rng.gen::<R>() < prob_one
    } else {
        false
    };
    let draw_as_usize = transport.broadcast_usize(draw as usize, 0)?;
    let outcome = draw_as_usize == 1;

    collapse_and_rescale(psi, pi, physical, l, transport, outcome, prob_one)?;
    Ok(outcome)
}

fn collapse_and_rescale<T: Transport>(
    psi: &mut [C],
    _pi: &PermutationMap,
    physical: usize,
    l: usize,
    transport: &T,
    outcome: bool,
    prob_one: R,
) -> SimResult {
    let keep_prob = if outcome { prob_one } else { 1.0 - prob_one };
    let norm = keep_prob.sqrt().max(f64::MIN_POSITIVE);

    if physical < l {
        let mask = 1usize << physical;
        for (idx, amp) in psi.iter_mut().enumerate() {
            let bit = idx & mask != 0;
            if bit == outcome {
                *amp /= norm;
            } else {
                *amp = crate::types::C_ZERO;
            }
        }
    } else {
        let global_bit = physical - l;
        let this_rank_matches = ((transport.rank() >> global_bit) & 1 == 1) == outcome;
        for amp in psi.iter_mut() {
            if this_rank_matches {
                *amp /= norm;
            } else {
                *amp = crate::types::C_ZERO;
            }
        }
    }
    Ok(())
}

/// Forces a logical qubit to a fixed classical value, collapsing and
/// renormalizing exactly like [`measure_qubit`] but without an RNG draw —
/// the outcome is the caller's `value`, not a sample. Grounds the `set`/
/// `clear` gate family (SPEC_FULL.md §4.6): "set" is `force_qubit(..,
/// true)`, "clear" is `force_qubit(.., false)`, mirroring the teacher
/// crate's classical-register `Reg::set` (`register/class.rs`), lifted
/// to a quantum register by renormalizing the surviving branch instead
/// of just flipping a classical bit.
///
/// If the pre-collapse probability of `value` is at or below
/// [`MIN_BRANCH_PROBABILITY`], this still proceeds (renormalizing
/// against a near-zero weight) and logs a warning, matching §7's
/// "amplitudes are renormalized unconditionally" rule for measurement.
pub fn force_qubit<T: Transport>(
    psi: &mut [C],
    pi: &PermutationMap,
    qubit: usize,
    value: bool,
    l: usize,
    transport: &T,
) -> SimResult {
    let physical = pi.physical_of(qubit);
    let local_prob_one = if physical < l {
        let mask = 1usize << physical;
        psi.iter().enumerate().filter(|(idx, _)| idx & mask != 0).map(|(_, a)| a.norm_sqr()).sum()
    } else {
        let global_bit = physical - l;
        if (transport.rank() >> global_bit) & 1 == 1 {
            psi.iter().map(|a| a.norm_sqr()).sum()
        } else {
            0.0
        }
    };
    let prob_one: R = transport.all_reduce_sum(local_prob_one)?;
    let prob_target = if value { prob_one } else { 1.0 - prob_one };
    if prob_target < MIN_BRANCH_PROBABILITY {
        log::warn!("force_qubit: forcing a branch with near-zero weight (P = {prob_target}), check normalization");
    }
    collapse_and_rescale(psi, pi, physical, l, transport, value, prob_one)
}

/// Full-register projective measurement: samples one `n`-bit outcome
/// from `|psi|^2` (collapsing to it) and returns it as a global index
/// (`rank << l | local_index`, per SPEC_FULL.md's global-index
/// convention).
pub fn measure_all<T: Transport>(psi: &mut [C], l: usize, transport: &T, rng: &mut impl Rng) -> SimResult<usize> {
    let local_total: R = psi.iter().map(|a| a.norm_sqr()).sum();
    let mut rank_totals = vec![0.0; transport.size()];
    for root in 0..transport.size() {
        let contribution = if transport.rank() == root { local_total } else { 0.0 };
        rank_totals[root] = transport.all_reduce_sum(contribution)?;
    }

    let draw_root = if transport.rank() == 0 {
        sample_from_weights(&rank_totals, rng)
    } else {
        0
    };
    let draw_root = transport.broadcast_usize(draw_root, 0)?;

    let local_index = if transport.rank() == draw_root {
        let r: R = rng.gen::<R>() * rank_totals[draw_root];
        Some(sample_local_index(psi, r))
    } else {
        None
    };
    let local_index = local_index.unwrap_or(0);
    let local_index = transport.broadcast_usize(local_index, draw_root)?;

    let global_index = (draw_root << l) | local_index;

    // Collapse: every rank zeroes its state except the winning amplitude.
    if transport.rank() == draw_root {
        let amp = psi[local_index];
        for a in psi.iter_mut() {
            *a = crate::types::C_ZERO;
        }
        psi[local_index] = amp / amp.norm();
    } else {
        for a in psi.iter_mut() {
            *a = crate::types::C_ZERO;
        }
    }

    Ok(global_index)
}

fn sample_from_weights(weights: &[R], rng: &mut impl Rng) -> usize {
    let total: R = weights.iter().sum();
    let mut r = rng.gen::<R>() * total;
    for (i, &w) in weights.iter().enumerate() {
        if r < w {
            return i;
        }
        r -= w;
    }
    weights.len().saturating_sub(1)
}

fn sample_local_index(psi: &[C], mut r: R) -> usize {
    for (idx, amp) in psi.iter().enumerate() {
        let w = amp.norm_sqr();
        if r < w {
            return idx;
        }
        r -= w;
    }
    psi.len().saturating_sub(1)
}

/// Sample `events` independent full-register outcomes without collapsing
/// `psi` (a snapshot is measured `events` times, each draw discarded
/// after recording) — grounds the teacher's `histogram`/sampling-only
/// measurement mode as distinct from the collapsing `measure_all`.
pub fn generate_events<T: Transport>(
    psi: &[C],
    l: usize,
    events: usize,
    transport: &T,
    rng: &mut impl Rng,
) -> SimResult<Vec<usize>> {
    let mut out = Vec::with_capacity(events);
    for _ in 0..events {
        let mut snapshot = psi.to_vec();
        out.push(measure_all(&mut snapshot, l, transport, rng)?);
    }
    Ok(out)
}

/// `<Z>` expectation value of a single logical qubit: `P(0) - P(1)`,
/// without collapsing `psi`.
pub fn expectation_z<T: Transport>(psi: &[C], pi: &PermutationMap, qubit: usize, l: usize, transport: &T) -> SimResult<R> {
    let physical = pi.physical_of(qubit);
    let local_signed_sum: R = if physical < l {
        let mask = 1usize << physical;
        psi.iter()
            .enumerate()
            .map(|(idx, a)| if idx & mask == 0 { a.norm_sqr() } else { -a.norm_sqr() })
            .sum()
    } else {
        let global_bit = physical - l;
        let sign = if (transport.rank() >> global_bit) & 1 == 0 { 1.0 } else { -1.0 };
        sign * psi.iter().map(|a| a.norm_sqr()).sum::<R>()
    };
    transport.all_reduce_sum(local_signed_sum)
}
