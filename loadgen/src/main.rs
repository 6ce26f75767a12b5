use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use leaderboard_util::FieldCasing;
use loadgen::config::{IdentityMode, MixConfig, Range, RunConfig, StopCondition, DEFAULT_BASE_URL};
use loadgen::HttpIssuer;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Copy, Clone, ValueEnum)]
enum MixShape {
    Weighted,
    Layered,
}

/// Drives concurrent submit, rank and top traffic against a leaderboard service
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// YAML run configuration; when given, every other run flag is ignored
    #[arg(short, long, env = "LOADGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL the submit, rank and top paths are appended to
    #[arg(long, env = "LOADGEN_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Number of concurrent simulated users
    #[arg(short, long, env = "LOADGEN_WORKERS", default_value_t = 50)]
    workers: usize,

    /// Stop each worker after this many seconds
    #[arg(long, env = "LOADGEN_DURATION_SECS")]
    duration_secs: Option<u64>,

    /// Stop each worker after this many iterations
    #[arg(long, env = "LOADGEN_ITERATIONS")]
    iterations: Option<u64>,

    /// Request mix shape
    #[arg(long, env = "LOADGEN_MIX", value_enum, default_value_t = MixShape::Weighted)]
    mix: MixShape,

    /// Relative weight of score submissions (weighted mix)
    #[arg(long, env = "LOADGEN_SUBMIT_WEIGHT", default_value_t = 20)]
    submit_weight: u32,

    /// Relative weight of rank lookups (weighted mix)
    #[arg(long, env = "LOADGEN_RANK_WEIGHT", default_value_t = 0)]
    rank_weight: u32,

    /// Relative weight of top lookups (weighted mix)
    #[arg(long, env = "LOADGEN_TOP_WEIGHT", default_value_t = 80)]
    top_weight: u32,

    /// Chance of a top lookup after each submit and rank pair (layered mix)
    #[arg(long, env = "LOADGEN_TOP_CHANCE", default_value_t = 0.1)]
    top_chance: f64,

    /// User ids to draw from, e.g. `1..=1000`; narrower means more contention
    #[arg(long, env = "LOADGEN_USER_IDS", default_value = "1..=1000")]
    user_ids: Range<u64>,

    /// Whether a worker draws a new user id every iteration or keeps one
    #[arg(long, env = "LOADGEN_IDENTITY", value_enum, default_value_t = IdentityMode::PerIteration)]
    identity: IdentityMode,

    /// Scores to submit, e.g. `1..=100`
    #[arg(long, env = "LOADGEN_SCORES", default_value = "1..=100")]
    scores: Range<u32>,

    /// Pause between iterations in milliseconds, e.g. `100..=500`
    #[arg(long, env = "LOADGEN_THINK_TIME_MS")]
    think_time_ms: Option<Range<u64>>,

    /// Per-request timeout in seconds
    #[arg(long, env = "LOADGEN_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// Spelling of the user id field in submit bodies: `camel` or `snake`
    #[arg(long, env = "LOADGEN_FIELD_CASING", default_value_t = FieldCasing::Camel)]
    field_casing: FieldCasing,

    /// Seed for reproducible runs
    #[arg(long, env = "LOADGEN_SEED")]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<RunConfig> {
        if let Some(path) = self.config {
            let config_file = std::fs::File::open(&path)
                .with_context(|| format!("failed to open config file {}", path.display()))?;
            return serde_yaml::from_reader(config_file).context("failed to parse config YAML");
        }
        let stop = StopCondition::from_parts(
            self.duration_secs.map(Duration::from_secs),
            self.iterations,
        )?;
        let mix = match self.mix {
            MixShape::Weighted => MixConfig::Weighted {
                submit: self.submit_weight,
                rank: self.rank_weight,
                top: self.top_weight,
            },
            MixShape::Layered => MixConfig::Layered {
                top_chance: self.top_chance,
            },
        };
        Ok(RunConfig {
            base_url: self.base_url,
            workers: self.workers,
            stop,
            mix,
            user_ids: self.user_ids,
            identity: self.identity,
            scores: self.scores,
            think_time_ms: self.think_time_ms,
            request_timeout: Duration::from_secs(self.timeout_secs),
            field_casing: self.field_casing,
            seed: self.seed,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = args
        .into_config()?
        .validated()
        .context("invalid run configuration")?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    let summary = rt.block_on(async {
        let issuer = HttpIssuer::new(&config.base_url, config.field_casing, config.request_timeout);
        loadgen::run(&config, issuer).await
    })?;

    println!("{summary}");
    Ok(())
}
