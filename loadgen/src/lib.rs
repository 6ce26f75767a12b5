//! Concurrent load generator for a leaderboard service.
//!
//! A run spawns a fixed number of simulated users. Each one loops over
//! "pick an action, pick a user id, issue the request, record the outcome"
//! until its own stop condition fires, then the tallies are summed into a
//! [`RunSummary`]. Workers never coordinate with each other; any contention
//! happens inside the service under test.

pub mod client;
pub mod config;
pub mod error;
pub mod policy;
pub mod sampler;
pub mod scenario;
pub mod statistics;
pub mod worker;

pub use crate::client::{HttpIssuer, RequestIssuer};
pub use crate::config::RunConfig;
pub use crate::scenario::run;
pub use crate::statistics::{ActionKind, ActionOutcome, RunSummary};
