use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use leaderboard_util::SharedLeaderboard;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Local leaderboard target for load runs.
#[derive(Debug, Parser)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: SocketAddr,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;
    rt.block_on(run_server(args.addr))
}

async fn run_server(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        "Mock leaderboard listening on http://{addr}{}",
        mock_leaderboard::API_PREFIX
    );
    mock_leaderboard::serve(listener, SharedLeaderboard::new())
        .await
        .context("Server stopped")
}
