//! The MPI-shaped substrate this crate talks to, modeled as a trait
//! boundary rather than a real dependency.
//!
//! No MPI bindings ship in this crate's dependency graph: the real
//! substrate is an external collaborator reached through whatever
//! process launcher the embedding application uses, exactly as the
//! distributed interchange protocol describes it. `Transport` is the
//! seam; it is written in the same shape as a `Backend` trait with a
//! small set of required methods plus a single-process reference
//! implementation (`LocalTransport`).

use crate::error::{SimError, SimResult};
use crate::types::C;

pub trait Transport: Send + Sync {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Exchange `buf` in place with the process at `peer_rank`: what
    /// this rank sends, it receives back from the peer, and vice versa.
    fn send_receive_replace(&self, buf: &mut [C], peer_rank: usize) -> SimResult;

    /// Sum `local` across every process, returning the total to all of
    /// them.
    fn all_reduce_sum(&self, local: f64) -> SimResult<f64>;

    fn broadcast_usize(&self, value: usize, root: usize) -> SimResult<usize>;
    fn broadcast_f64(&self, value: f64, root: usize) -> SimResult<f64>;

    /// All-to-all-style exchange used by the collective-communications
    /// interchange variant: `buf` is reinterpreted as `size()` chunks of
    /// length `chunk`, each rank's chunk `r` swapping with rank `r`'s
    /// chunk for this rank.
    fn complete_exchange(&self, buf: &mut [C], chunk: usize) -> SimResult;

    fn barrier(&self) -> SimResult;

    /// Partition this transport's processes into new communicators by
    /// `color`, ordered within each by `key`. Used by the
    /// collective-communications interchange variant to scope
    /// `complete_exchange` to exactly the processes that share a round
    /// of qubit exchange, rather than the whole cluster.
    fn split(&self, color: usize, key: usize) -> Self
    where
        Self: Sized;
}

/// Single-process transport: every collective is a no-op or identity.
/// This is the only `Transport` implementation this crate ships; it
/// makes the gate iterator and interchange protocol exercisable and
/// testable without a real MPI runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalTransport;

impl Transport for LocalTransport {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn send_receive_replace(&self, _buf: &mut [C], peer_rank: usize) -> SimResult {
        debug_assert!(
            false,
            "send_receive_replace is unreachable with a single rank (peer {peer_rank})"
        );
        Ok(())
    }

    fn all_reduce_sum(&self, local: f64) -> SimResult<f64> {
        Ok(local)
    }

    fn broadcast_usize(&self, value: usize, _root: usize) -> SimResult<usize> {
        Ok(value)
    }

    fn broadcast_f64(&self, value: f64, _root: usize) -> SimResult<f64> {
        Ok(value)
    }

    fn complete_exchange(&self, _buf: &mut [C], _chunk: usize) -> SimResult {
        Ok(())
    }

    fn barrier(&self) -> SimResult {
        Ok(())
    }

    fn split(&self, _color: usize, _key: usize) -> Self {
        LocalTransport
    }
}

/// Surfaced to callers composing a `Transport` error out of a lower-level
/// failure (e.g. a hand-rolled MPI wrapper supplied by the embedder).
pub fn transport_error(msg: impl Into<String>) -> SimError {
    SimError::Transport(msg.into())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_transport_is_rank_zero_of_one() {
        let t = LocalTransport;
        assert_eq!(t.rank(), 0);
        assert_eq!(t.size(), 1);
    }

    #[test]
    fn local_transport_collectives_are_identity() {
        let t = LocalTransport;
        assert_eq!(t.all_reduce_sum(3.5).unwrap(), 3.5);
        assert_eq!(t.broadcast_usize(7, 0).unwrap(), 7);
        assert_eq!(t.broadcast_f64(1.25, 0).unwrap(), 1.25);
        assert!(t.barrier().is_ok());
    }
}
