use leaderboard_util::SharedLeaderboard;
use loadgen::{HttpIssuer, RunConfig};

/// Serves a fresh mock leaderboard on an ephemeral port and returns its base URL.
#[allow(unused)]
pub async fn spawn_mock() -> (String, SharedLeaderboard) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let board = SharedLeaderboard::new();
    tokio::spawn(mock_leaderboard::serve(listener, board.clone()));
    (
        format!("http://{addr}{}", mock_leaderboard::API_PREFIX),
        board,
    )
}

/// Builds the issuer `config` describes, the same way the binary does.
#[allow(unused)]
pub fn issuer_for(config: &RunConfig) -> HttpIssuer {
    HttpIssuer::new(&config.base_url, config.field_casing, config.request_timeout)
}
