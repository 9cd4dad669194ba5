//! Channel loss simulation for protocol evaluation.
//!
//! Real networks drop datagrams; to exercise the retransmission machinery
//! without depending on actual network conditions, the receiver passes every
//! inbound frame through a [`LossModel`] first.  Each frame — including
//! retransmissions — is dropped independently with probability `p`
//! (a Bernoulli trial), which emulates an unreliable channel without being
//! part of the wire protocol itself.
//!
//! The model can be seeded so lossy-channel tests are reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Rejected loss-model configuration.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("loss probability must be strictly between 0 and 1, got {0}")]
pub struct InvalidLossProbability(pub f64);

/// Independent Bernoulli drop filter with probability `p`.
#[derive(Debug)]
pub struct LossModel {
    p: f64,
    rng: StdRng,
}

impl LossModel {
    /// Build a loss model with probability `p`, drawn from OS entropy.
    ///
    /// `p` must lie strictly inside `(0, 1)`; a lossless channel is modeled
    /// by having no [`LossModel`] at all, and `p = 1` would make the
    /// transfer unable to terminate.
    pub fn new(p: f64) -> Result<Self, InvalidLossProbability> {
        Self::from_rng(p, StdRng::from_os_rng())
    }

    /// Build a seeded loss model for reproducible runs.
    pub fn with_seed(p: f64, seed: u64) -> Result<Self, InvalidLossProbability> {
        Self::from_rng(p, StdRng::seed_from_u64(seed))
    }

    fn from_rng(p: f64, rng: StdRng) -> Result<Self, InvalidLossProbability> {
        if !(p > 0.0 && p < 1.0) {
            return Err(InvalidLossProbability(p));
        }
        Ok(Self { p, rng })
    }

    /// Configured drop probability.
    pub fn probability(&self) -> f64 {
        self.p
    }

    /// Draw one Bernoulli trial: `true` means the frame is discarded
    /// unprocessed.  A uniform draw falling within `[0, p]` (inclusive)
    /// counts as a drop.
    pub fn should_drop(&mut self) -> bool {
        self.rng.random::<f64>() <= self.p
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_probabilities() {
        for p in [0.0, 1.0, -0.3, 1.5, f64::NAN] {
            assert!(LossModel::new(p).is_err(), "p = {p} should be rejected");
        }
    }

    #[test]
    fn accepts_open_interval() {
        for p in [0.001, 0.5, 0.999] {
            assert_eq!(LossModel::new(p).unwrap().probability(), p);
        }
    }

    #[test]
    fn same_seed_same_drop_sequence() {
        let mut a = LossModel::with_seed(0.5, 42).unwrap();
        let mut b = LossModel::with_seed(0.5, 42).unwrap();
        let draws_a: Vec<bool> = (0..64).map(|_| a.should_drop()).collect();
        let draws_b: Vec<bool> = (0..64).map(|_| b.should_drop()).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn drop_rate_tracks_probability() {
        let mut model = LossModel::with_seed(0.3, 7).unwrap();
        let trials = 20_000;
        let drops = (0..trials).filter(|_| model.should_drop()).count();
        let rate = drops as f64 / trials as f64;
        assert!(
            (rate - 0.3).abs() < 0.02,
            "observed drop rate {rate} too far from 0.3"
        );
    }
}
