use tokio::time::Instant;
use tracing::{info, info_span, Instrument};

use crate::client::RequestIssuer;
use crate::config::RunConfig;
use crate::error::HarnessError;
use crate::statistics::{RunSummary, WorkerStats};
use crate::worker::{Worker, WorkerParams};

/// Spawns `config.workers` simulated users, waits for every one to stop and sums their tallies.
///
/// The config is validated first, so a bad range is reported as [`HarnessError::Config`]
/// rather than as a worker failure.
///
/// Workers share nothing but a clone of `issuer`. Each gets its own RNG, seeded from
/// `config.seed + index` when a seed is configured.
pub async fn run<I: RequestIssuer>(
    config: &RunConfig,
    issuer: I,
) -> Result<RunSummary, HarnessError> {
    let config = &config.clone().validated()?;
    let params = WorkerParams::from_config(config)?;
    info!(
        workers = config.workers,
        stop = ?config.stop,
        mix = ?config.mix,
        user_ids = %config.user_ids,
        "Starting load test with {} concurrent users...",
        config.workers
    );

    let start = Instant::now();
    let mut tasks = Vec::with_capacity(config.workers);
    for id in 0..config.workers {
        let seed = config
            .seed
            .map_or_else(rand::random, |seed| seed.wrapping_add(id as u64));
        let worker = Worker::new(id, issuer.clone(), params.clone(), seed);
        tasks.push(tokio::spawn(
            worker.run().instrument(info_span!("worker", id)),
        ));
    }

    let mut totals = WorkerStats::default();
    let mut tasks = tasks.into_iter().enumerate();
    while let Some((worker, task)) = tasks.next() {
        match task.await {
            Ok(stats) => totals.merge(&stats),
            Err(source) => {
                for (_, rest) in tasks {
                    rest.abort();
                }
                return Err(HarnessError::WorkerJoin { worker, source });
            }
        }
    }
    let elapsed = start.elapsed();

    let summary = RunSummary {
        elapsed,
        workers: config.workers,
        totals,
    };
    info!(
        requests = summary.total_requests(),
        failures = summary.total_failures(),
        elapsed = ?elapsed,
        "all workers joined"
    );
    Ok(summary)
}
