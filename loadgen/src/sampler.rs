//! User identity sampling.
//!
//! The width of the id range is the contention knob: a narrow range such as
//! `1..=1000` funnels concurrent workers onto the same few leaderboard rows,
//! while `1..=1000000` spreads them out like ordinary traffic.

use rand::Rng;

use crate::config::{IdentityMode, Range};

/// Uniform sampler over an inclusive user id range. Holds no state between draws.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IdentitySampler {
    range: Range<u64>,
}

impl IdentitySampler {
    #[inline]
    #[must_use]
    pub fn new(range: Range<u64>) -> Self {
        Self { range }
    }

    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.random_range(self.range.min..=self.range.max)
    }

    /// Binds the sampler to one worker according to `mode`.
    pub fn for_worker<R: Rng + ?Sized>(&self, mode: IdentityMode, rng: &mut R) -> WorkerIdentity {
        match mode {
            IdentityMode::PerIteration => WorkerIdentity::Sampled(*self),
            IdentityMode::PerWorker => WorkerIdentity::Pinned(self.sample(rng)),
        }
    }
}

/// The identity source a single worker draws from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WorkerIdentity {
    Sampled(IdentitySampler),
    Pinned(u64),
}

impl WorkerIdentity {
    #[inline]
    pub fn next<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        match self {
            WorkerIdentity::Sampled(sampler) => sampler.sample(rng),
            WorkerIdentity::Pinned(user_id) => *user_id,
        }
    }
}
