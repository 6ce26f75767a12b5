use std::fmt;
use std::time::Duration;

use crate::error::IssueError;

/// The request types a worker can issue.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Submit,
    Rank,
    Top,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Submit, ActionKind::Rank, ActionKind::Top];

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            ActionKind::Submit => 0,
            ActionKind::Rank => 1,
            ActionKind::Top => 2,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Submit => f.pad("submit"),
            ActionKind::Rank => f.pad("rank"),
            ActionKind::Top => f.pad("top"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The service could not be reached or did not answer in time.
    Transport,
    /// The service answered with a non-2xx status or an unusable body.
    Protocol,
}

/// Result of one issued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    pub latency: Duration,
    pub result: Result<(), IssueError>,
}

impl ActionOutcome {
    #[inline]
    #[must_use]
    pub fn success(kind: ActionKind, latency: Duration) -> Self {
        Self {
            kind,
            latency,
            result: Ok(()),
        }
    }

    #[inline]
    #[must_use]
    pub fn failure(kind: ActionKind, latency: Duration, error: IssueError) -> Self {
        Self {
            kind,
            latency,
            result: Err(error),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&IssueError> {
        self.result.as_ref().err()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LatencyStats {
    pub count: u64,
    pub min: Duration,
    pub max: Duration,
    pub total: Duration,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self {
            count: 0,
            min: Duration::MAX,
            max: Duration::ZERO,
            total: Duration::ZERO,
        }
    }
}

impl LatencyStats {
    pub fn record(&mut self, latency: Duration) {
        self.count += 1;
        if latency < self.min {
            self.min = latency;
        }
        if latency > self.max {
            self.max = latency;
        }
        self.total += latency;
    }

    pub fn merge(&mut self, other: &LatencyStats) {
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.total += other.total;
    }

    #[must_use]
    pub fn mean(&self) -> Option<Duration> {
        if self.count == 0 {
            return None;
        }
        Some(Duration::from_nanos(
            (self.total.as_nanos() / u128::from(self.count)) as u64,
        ))
    }
}

/// Counts for a single [`ActionKind`]. Latency covers successful requests only.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct KindStats {
    pub successes: u64,
    pub transport_failures: u64,
    pub protocol_failures: u64,
    pub latency: LatencyStats,
}

impl KindStats {
    pub fn record(&mut self, outcome: &ActionOutcome) {
        match &outcome.result {
            Ok(()) => {
                self.successes += 1;
                self.latency.record(outcome.latency);
            }
            Err(e) => match e.failure_kind() {
                FailureKind::Transport => self.transport_failures += 1,
                FailureKind::Protocol => self.protocol_failures += 1,
            },
        }
    }

    pub fn merge(&mut self, other: &KindStats) {
        self.successes += other.successes;
        self.transport_failures += other.transport_failures;
        self.protocol_failures += other.protocol_failures;
        self.latency.merge(&other.latency);
    }

    #[inline]
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.transport_failures + self.protocol_failures
    }

    #[inline]
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.successes + self.failures()
    }
}

/// Tally owned by one worker for the whole of its run.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    pub iterations: u64,
    pub per_kind: [KindStats; 3],
}

impl WorkerStats {
    #[inline]
    pub fn record(&mut self, outcome: &ActionOutcome) {
        self.per_kind[outcome.kind.index()].record(outcome);
    }

    pub fn merge(&mut self, other: &WorkerStats) {
        self.iterations += other.iterations;
        for (mine, theirs) in self.per_kind.iter_mut().zip(other.per_kind.iter()) {
            mine.merge(theirs);
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self, kind: ActionKind) -> &KindStats {
        &self.per_kind[kind.index()]
    }
}

/// Aggregate of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub elapsed: Duration,
    pub workers: usize,
    pub totals: WorkerStats,
}

impl RunSummary {
    #[inline]
    #[must_use]
    pub fn kind(&self, kind: ActionKind) -> &KindStats {
        self.totals.kind(kind)
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.totals.per_kind.iter().map(KindStats::requests).sum()
    }

    #[must_use]
    pub fn total_successes(&self) -> u64 {
        self.totals.per_kind.iter().map(|k| k.successes).sum()
    }

    #[must_use]
    pub fn total_failures(&self) -> u64 {
        self.totals.per_kind.iter().map(KindStats::failures).sum()
    }

    /// Requests per second over the whole run.
    #[must_use]
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total_requests() as f64 / secs
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Results ({} workers, {} iterations):",
            self.workers, self.totals.iterations
        )?;
        for kind in ActionKind::ALL {
            let stats = self.kind(kind);
            write!(
                f,
                "    {:<7} ok = {:<8} transport_err = {:<6} protocol_err = {:<6}",
                kind, stats.successes, stats.transport_failures, stats.protocol_failures
            )?;
            if let Some(mean) = stats.latency.mean() {
                write!(
                    f,
                    " rtt [min, mean, max] = [{:.2?}, {:.2?}, {:.2?}]",
                    stats.latency.min, mean, stats.latency.max
                )?;
            }
            writeln!(f)?;
        }
        writeln!(
            f,
            "    total   requests = {} failures = {} throughput = {:.2} req/s",
            self.total_requests(),
            self.total_failures(),
            self.throughput()
        )?;
        write!(
            f,
            "Load test completed in {:.2} seconds.",
            self.elapsed.as_secs_f64()
        )
    }
}
