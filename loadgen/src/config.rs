use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use hyper::Uri;
use leaderboard_util::FieldCasing;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/leaderboard";

/// Inclusive `[min, max]` range.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

impl<T> Range<T> {
    #[inline]
    #[must_use]
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: Copy + PartialOrd + Into<u64>> Range<T> {
    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvertedRange {
                field,
                min: self.min.into(),
                max: self.max.into(),
            });
        }
        Ok(())
    }
}

/// Accepts `MIN..=MAX`, `MIN-MAX` or a single value.
impl<T: FromStr + Copy> FromStr for Range<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<T>()
                .map_err(|_| format!("invalid range bound `{v}` in `{s}`"))
        };
        let (min, max) = match s.split_once("..=").or_else(|| s.split_once('-')) {
            Some((min, max)) => (parse(min)?, parse(max)?),
            None => {
                let v = parse(s)?;
                (v, v)
            }
        };
        Ok(Self { min, max })
    }
}

impl<T: fmt::Display> fmt::Display for Range<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// When a worker stops issuing requests. Exactly one mode per run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCondition {
    /// Wall-clock time since the worker's own start.
    Duration(#[serde(with = "humantime_serde")] Duration),
    /// Fixed number of iterations per worker.
    Iterations(u64),
}

impl Default for StopCondition {
    fn default() -> Self {
        StopCondition::Duration(Duration::from_secs(30))
    }
}

impl StopCondition {
    /// Picks the stop mode from optional flags, falling back to the default duration.
    pub fn from_parts(
        duration: Option<Duration>,
        iterations: Option<u64>,
    ) -> Result<Self, ConfigError> {
        match (duration, iterations) {
            (Some(_), Some(_)) => Err(ConfigError::AmbiguousStop),
            (Some(d), None) => Ok(StopCondition::Duration(d)),
            (None, Some(n)) => Ok(StopCondition::Iterations(n)),
            (None, None) => Ok(StopCondition::default()),
        }
    }
}

/// Shape of the per-iteration request mix.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixConfig {
    /// One action per iteration, picked by relative weight.
    Weighted { submit: u32, rank: u32, top: u32 },
    /// Submit then rank for the same user every iteration, plus a top lookup with `top_chance`.
    Layered { top_chance: f64 },
}

impl Default for MixConfig {
    fn default() -> Self {
        MixConfig::Weighted {
            submit: 20,
            rank: 0,
            top: 80,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// Draw a fresh user id every iteration.
    #[default]
    PerIteration,
    /// Draw one user id when the worker starts and keep it.
    PerWorker,
}

/// Immutable description of one load run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub base_url: String,
    pub workers: usize,
    pub stop: StopCondition,
    pub mix: MixConfig,
    pub user_ids: Range<u64>,
    pub identity: IdentityMode,
    pub scores: Range<u32>,
    pub think_time_ms: Option<Range<u64>>,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub field_casing: FieldCasing,
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            workers: 50,
            stop: StopCondition::default(),
            mix: MixConfig::default(),
            user_ids: Range::new(1, 1000),
            identity: IdentityMode::default(),
            scores: Range::new(1, 100),
            think_time_ms: None,
            request_timeout: Duration::from_secs(10),
            field_casing: FieldCasing::default(),
            seed: None,
        }
    }
}

impl RunConfig {
    /// Checks every field and strips a trailing `/` from the base URL.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let trimmed = self.base_url.trim_end_matches('/');
        let uri: Uri = trimmed
            .parse()
            .map_err(|_| ConfigError::BaseUrl(self.base_url.clone()))?;
        if uri.scheme_str() != Some("http") || uri.authority().is_none() {
            return Err(ConfigError::BaseUrl(self.base_url));
        }
        self.base_url = trimmed.to_owned();

        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        match self.stop {
            StopCondition::Duration(d) if d.is_zero() => return Err(ConfigError::ZeroDuration),
            StopCondition::Iterations(0) => return Err(ConfigError::ZeroIterations),
            _ => {}
        }
        match self.mix {
            MixConfig::Weighted { submit, rank, top } if submit == 0 && rank == 0 && top == 0 => {
                return Err(ConfigError::ZeroWeights);
            }
            MixConfig::Weighted { submit, rank, top }
                if weight_sum(submit, rank, top).is_none() =>
            {
                return Err(ConfigError::WeightOverflow);
            }
            MixConfig::Layered { top_chance } if !(0.0..=1.0).contains(&top_chance) => {
                return Err(ConfigError::TopChance(top_chance));
            }
            _ => {}
        }
        self.user_ids.check("user_ids")?;
        if self.user_ids.min == 0 {
            return Err(ConfigError::ZeroUserId);
        }
        self.scores.check("scores")?;
        if let Some(think) = &self.think_time_ms {
            think.check("think_time_ms")?;
        }
        Ok(self)
    }
}

/// Total of the action weights, `None` when it does not fit a `u32`.
pub(crate) fn weight_sum(submit: u32, rank: u32, top: u32) -> Option<u32> {
    submit.checked_add(rank)?.checked_add(top)
}
