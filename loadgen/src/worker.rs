//! A single simulated user.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::RequestIssuer;
use crate::config::{IdentityMode, Range, RunConfig, StopCondition};
use crate::error::ConfigError;
use crate::policy::ActionPolicy;
use crate::sampler::IdentitySampler;
use crate::statistics::{ActionKind, ActionOutcome, WorkerStats};

/// Everything a worker needs from the [`RunConfig`], copied out so workers share nothing.
#[derive(Debug, Clone)]
pub struct WorkerParams {
    pub stop: StopCondition,
    pub policy: ActionPolicy,
    pub sampler: IdentitySampler,
    pub identity: IdentityMode,
    pub scores: Range<u32>,
    pub think_time_ms: Option<Range<u64>>,
}

impl WorkerParams {
    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            stop: config.stop,
            policy: ActionPolicy::new(config.mix)?,
            sampler: IdentitySampler::new(config.user_ids),
            identity: config.identity,
            scores: config.scores,
            think_time_ms: config.think_time_ms,
        })
    }
}

pub struct Worker<I> {
    id: usize,
    issuer: I,
    params: WorkerParams,
    rng: SmallRng,
}

impl<I: RequestIssuer> Worker<I> {
    #[must_use]
    pub fn new(id: usize, issuer: I, params: WorkerParams, seed: u64) -> Self {
        Self {
            id,
            issuer,
            params,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Loops until the stop condition fires. Failed requests are logged and counted, never fatal.
    pub async fn run(self) -> WorkerStats {
        let Worker {
            id,
            issuer,
            params,
            mut rng,
        } = self;

        let started = Instant::now();
        let deadline = match params.stop {
            StopCondition::Duration(duration) => Some(started + duration),
            StopCondition::Iterations(_) => None,
        };
        let identity = params.sampler.for_worker(params.identity, &mut rng);
        let mut stats = WorkerStats::default();

        loop {
            if stop_reached(params.stop, started, stats.iterations) {
                break;
            }

            let plan = params.policy.plan(&mut rng);
            let user_id = identity.next(&mut rng);
            for kind in plan.actions() {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    break;
                }
                let outcome = match kind {
                    ActionKind::Submit => {
                        let score = rng.random_range(params.scores.min..=params.scores.max);
                        issuer.submit_score(user_id, score).await
                    }
                    ActionKind::Rank => issuer.get_rank(user_id).await,
                    ActionKind::Top => issuer.get_top().await,
                };
                log_outcome(id, user_id, &outcome);
                stats.record(&outcome);
            }
            stats.iterations += 1;
            // Think time only separates iterations; none after the last one.
            if stop_reached(params.stop, started, stats.iterations) {
                break;
            }

            if let Some(think) = params.think_time_ms {
                let mut pause = Duration::from_millis(rng.random_range(think.min..=think.max));
                if let Some(deadline) = deadline {
                    pause = pause.min(deadline.saturating_duration_since(Instant::now()));
                }
                tokio::time::sleep(pause).await;
            }
        }

        debug!(
            worker = id,
            iterations = stats.iterations,
            elapsed = ?started.elapsed(),
            "worker stopped"
        );
        stats
    }
}

fn stop_reached(stop: StopCondition, started: Instant, iterations: u64) -> bool {
    match stop {
        StopCondition::Duration(duration) => started.elapsed() >= duration,
        StopCondition::Iterations(limit) => iterations >= limit,
    }
}

fn log_outcome(worker: usize, user_id: u64, outcome: &ActionOutcome) {
    match &outcome.result {
        Ok(()) => debug!(
            worker,
            action = %outcome.kind,
            user_id,
            latency = ?outcome.latency,
            "request ok"
        ),
        Err(e) => warn!(
            worker,
            action = %outcome.kind,
            user_id,
            error = %e,
            "request failed"
        ),
    }
}
