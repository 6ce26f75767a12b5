//! In-memory stand-in for the leaderboard service, speaking the same three endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use leaderboard_util::{
    ErrorResponse, RankResponse, SharedLeaderboard, SubmitScoreRequest, SubmitScoreResponse,
    TopEntry, TOP_LIMIT,
};
use tokio::net::TcpListener;
use tracing::debug;

/// Path prefix the routes are mounted under.
pub const API_PREFIX: &str = "/api/leaderboard";

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn router(board: SharedLeaderboard) -> Router {
    let api = Router::new()
        .route("/submit", post(submit_score))
        .route("/rank/:user_id", get(get_rank))
        .route("/top", get(get_top))
        .with_state(board);
    Router::new().nest(API_PREFIX, api)
}

pub async fn serve(listener: TcpListener, board: SharedLeaderboard) -> std::io::Result<()> {
    axum::serve(listener, router(board)).await
}

async fn submit_score(
    State(board): State<SharedLeaderboard>,
    body: Result<Json<SubmitScoreRequest>, JsonRejection>,
) -> Result<Json<SubmitScoreResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        debug!(%rejection, "rejected submit");
        bad_request("Missing userId or score")
    })?;
    debug!(user_id = request.user_id, score = request.score, "submit");
    Ok(Json(board.submit(request)))
}

async fn get_rank(
    State(board): State<SharedLeaderboard>,
    user_id: Result<Path<u64>, axum::extract::rejection::PathRejection>,
) -> Result<Json<RankResponse>, ApiError> {
    let Path(user_id) = user_id.map_err(|_| bad_request("Invalid user ID"))?;
    board.rank(user_id).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("User not found in leaderboard")),
        )
    })
}

#[inline]
async fn get_top(State(board): State<SharedLeaderboard>) -> Json<Vec<TopEntry>> {
    Json(board.top(TOP_LIMIT))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}
