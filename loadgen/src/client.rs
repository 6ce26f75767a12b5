use std::error::Error as StdError;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::Request;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use leaderboard_util::drain::DrainBodyFuture;
use leaderboard_util::{byte_body, empty_body, FieldCasing, RankResponse, SubmitScoreRequest};
use tokio::time::Instant;

use crate::error::IssueError;
use crate::statistics::{ActionKind, ActionOutcome};

/// Largest response body accepted from the service.
const MAX_BODY: usize = 1024 * 1024;

#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpClient {
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        connector.set_connect_timeout(Some(connect_timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }

    /// Sends `request` and drains the response, failing on any non-2xx status.
    pub async fn send_recv(&self, request: Request<Full<Bytes>>) -> Result<Vec<u8>, IssueError> {
        let resp = self
            .client
            .request(request)
            .await
            .map_err(|e| IssueError::Transport(describe(&e)))?;
        let status = resp.status();
        let content_length: usize = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|hv| hv.to_str().ok())
            .and_then(|hv| hv.parse().ok())
            .unwrap_or(1024);
        let drained =
            DrainBodyFuture::new_limited(resp.into_body(), content_length, MAX_BODY).await;
        if !status.is_success() {
            return Err(IssueError::Status(status));
        }
        drained.map_err(|e| IssueError::Body(e.to_string()))
    }
}

/// Renders an error with its whole source chain; hyper's top-level messages alone are terse.
fn describe(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Issues the three leaderboard calls, turning every failure into a failed [`ActionOutcome`].
pub trait RequestIssuer: Clone + Send + Sync + 'static {
    fn submit_score(&self, user_id: u64, score: u32) -> impl Future<Output = ActionOutcome> + Send;

    fn get_rank(&self, user_id: u64) -> impl Future<Output = ActionOutcome> + Send;

    fn get_top(&self) -> impl Future<Output = ActionOutcome> + Send;
}

/// [`RequestIssuer`] talking to a live service over HTTP/1.
#[derive(Clone)]
pub struct HttpIssuer {
    client: HttpClient,
    base_url: Arc<str>,
    casing: FieldCasing,
    timeout: Duration,
}

impl HttpIssuer {
    /// `base_url` must not end with `/`.
    #[must_use]
    pub fn new(base_url: &str, casing: FieldCasing, timeout: Duration) -> Self {
        Self {
            client: HttpClient::new(timeout),
            base_url: Arc::from(base_url),
            casing,
            timeout,
        }
    }

    async fn exchange<E: Display>(
        &self,
        kind: ActionKind,
        request: Result<Request<Full<Bytes>>, E>,
        validate: fn(&[u8]) -> Result<(), IssueError>,
    ) -> ActionOutcome {
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                let err = IssueError::Request(e.to_string());
                return ActionOutcome::failure(kind, Duration::ZERO, err);
            }
        };
        let (latency, res) = run_timed(tokio::time::timeout(
            self.timeout,
            self.client.send_recv(request),
        ))
        .await;
        let result = match res {
            Ok(res) => res.and_then(|body| validate(&body)),
            Err(_elapsed) => Err(IssueError::Timeout(self.timeout)),
        };
        ActionOutcome {
            kind,
            latency,
            result,
        }
    }
}

impl RequestIssuer for HttpIssuer {
    async fn submit_score(&self, user_id: u64, score: u32) -> ActionOutcome {
        let body = SubmitScoreRequest::new(user_id, score).to_json(self.casing);
        let request = Request::post(format!("{}/submit", self.base_url))
            .header(CONTENT_TYPE, "application/json")
            .body(byte_body(body));
        self.exchange(ActionKind::Submit, request, accept_any).await
    }

    async fn get_rank(&self, user_id: u64) -> ActionOutcome {
        let request = Request::get(format!("{}/rank/{user_id}", self.base_url)).body(empty_body());
        self.exchange(ActionKind::Rank, request, expect_rank).await
    }

    async fn get_top(&self) -> ActionOutcome {
        let request = Request::get(format!("{}/top", self.base_url)).body(empty_body());
        self.exchange(ActionKind::Top, request, expect_entries).await
    }
}

fn accept_any(_body: &[u8]) -> Result<(), IssueError> {
    Ok(())
}

fn expect_rank(body: &[u8]) -> Result<(), IssueError> {
    serde_json::from_slice::<RankResponse>(body)
        .map(|_| ())
        .map_err(|e| IssueError::Body(e.to_string()))
}

fn expect_entries(body: &[u8]) -> Result<(), IssueError> {
    serde_json::from_slice::<Vec<serde_json::Value>>(body)
        .map(|_| ())
        .map_err(|e| IssueError::Body(e.to_string()))
}

#[inline]
async fn run_timed<T, F: Future<Output = T>>(fut: F) -> (Duration, T) {
    let start = Instant::now();
    let res = fut.await;
    (start.elapsed(), res)
}
