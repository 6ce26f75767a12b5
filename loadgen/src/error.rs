use std::time::Duration;

use hyper::StatusCode;
use thiserror::Error;

use crate::statistics::FailureKind;

/// Why a single request did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueError {
    #[error("failed to build request: {0}")]
    Request(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("malformed response body: {0}")]
    Body(String),
}

impl IssueError {
    /// Status and body problems mean the service answered; everything else means it did not.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Status(_) | Self::Body(_) => FailureKind::Protocol,
            Self::Request(_) | Self::Transport(_) | Self::Timeout(_) => FailureKind::Transport,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("base_url `{0}` is not a valid http URL")]
    BaseUrl(String),
    #[error("workers must be at least 1")]
    NoWorkers,
    #[error("duration must be greater than zero")]
    ZeroDuration,
    #[error("iterations must be at least 1")]
    ZeroIterations,
    #[error("exactly one of duration or iterations must be set")]
    AmbiguousStop,
    #[error("{field}: min {min} is greater than max {max}")]
    InvertedRange {
        field: &'static str,
        min: u64,
        max: u64,
    },
    #[error("user_ids must start at 1 or above")]
    ZeroUserId,
    #[error("action weights must not all be zero")]
    ZeroWeights,
    #[error("action weights must sum to at most {}", u32::MAX)]
    WeightOverflow,
    #[error("top_chance {0} must lie within [0, 1]")]
    TopChance(f64),
}

/// Failures of the harness itself, fatal to the run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
    #[error("worker {worker} did not complete")]
    WorkerJoin {
        worker: usize,
        #[source]
        source: tokio::task::JoinError,
    },
}
