//! The simulated lossy channel.
//!
//! Four independent Bernoulli samplers, each drawing one uniform value
//! in [0,1) per invocation and comparing against a fixed threshold. The
//! random source is injected rather than ambient, so runs are
//! reproducible from a seed and tests can script exact outcomes.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Probability a frame is lost in transit.
pub const LOSS_PROBABILITY: f64 = 0.10;

/// Probability a frame arrives corrupted.
pub const CORRUPTION_PROBABILITY: f64 = 0.20;

/// Probability a delivered frame's acknowledgment is lost.
pub const ACK_LOSS_PROBABILITY: f64 = 0.15;

/// Probability the checksum trailer frame arrives corrupted.
pub const CHECKSUM_CORRUPTION_PROBABILITY: f64 = 0.05;

/// A source of uniform values in [0,1).
///
/// Every [`RngCore`] qualifies; tests substitute constant or scripted
/// implementations.
pub trait Sampler {
    fn sample_unit(&mut self) -> f64;
}

impl<R: RngCore> Sampler for R {
    fn sample_unit(&mut self) -> f64 {
        self.gen()
    }
}

/// The channel itself: owns its random source, no other state.
#[derive(Debug)]
pub struct Channel<S> {
    sampler: S,
}

impl Channel<ChaCha8Rng> {
    /// Channel with a reproducible ChaCha8 source.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Channel seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<S: Sampler> Channel<S> {
    pub fn new(sampler: S) -> Self {
        Self { sampler }
    }

    /// Roll for frame loss.
    pub fn frame_lost(&mut self) -> bool {
        self.sampler.sample_unit() < LOSS_PROBABILITY
    }

    /// Roll for frame corruption.
    pub fn frame_corrupted(&mut self) -> bool {
        self.sampler.sample_unit() < CORRUPTION_PROBABILITY
    }

    /// Roll for acknowledgment loss.
    pub fn ack_lost(&mut self) -> bool {
        self.sampler.sample_unit() < ACK_LOSS_PROBABILITY
    }

    /// Roll for checksum-frame corruption.
    pub fn checksum_corrupted(&mut self) -> bool {
        self.sampler.sample_unit() < CHECKSUM_CORRUPTION_PROBABILITY
    }
}
