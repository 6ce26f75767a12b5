pub mod drain;

use bytes::Bytes;
use http_body_util::Full;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Number of entries returned by the top endpoint.
pub const TOP_LIMIT: usize = 10;

#[inline]
pub fn empty_body() -> Full<Bytes> {
    Full::new(Bytes::new())
}

#[inline]
pub fn byte_body<B: Into<Bytes>>(bytes: B) -> Full<Bytes> {
    Full::new(bytes.into())
}

/// Casing of the JSON field carrying the user identifier in a submit request.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCasing {
    /// `userId`
    #[default]
    Camel,
    /// `user_id`
    Snake,
}

impl FromStr for FieldCasing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camel" => Ok(Self::Camel),
            "snake" => Ok(Self::Snake),
            other => Err(format!("unknown field casing `{other}`, expected `camel` or `snake`")),
        }
    }
}

impl fmt::Display for FieldCasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camel => f.write_str("camel"),
            Self::Snake => f.write_str("snake"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SubmitScoreRequest {
    #[serde(alias = "userId")]
    pub user_id: u64,
    pub score: u32,
}

impl SubmitScoreRequest {
    #[must_use]
    pub fn new(user_id: u64, score: u32) -> Self {
        Self { user_id, score }
    }

    /// Encodes the request with the user identifier field spelled per `casing`.
    #[must_use]
    pub fn to_json(&self, casing: FieldCasing) -> Vec<u8> {
        let value = match casing {
            FieldCasing::Camel => {
                serde_json::json!({ "userId": self.user_id, "score": self.score })
            }
            FieldCasing::Snake => {
                serde_json::json!({ "user_id": self.user_id, "score": self.score })
            }
        };
        value.to_string().into_bytes()
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SubmitScoreResponse {
    pub message: String,
}

/// Rank lookup result.
///
/// Only `rank` is required when decoding; services differ in how they spell and type the rest.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResponse {
    #[serde(default, alias = "user_id")]
    pub user_id: Option<u64>,
    pub rank: u64,
    #[serde(default, alias = "total_score")]
    pub total_score: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEntry {
    #[serde(alias = "user_id")]
    pub user_id: u64,
    #[serde(alias = "total_score")]
    pub total_score: u64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Per-endpoint request counts observed by a [`SharedLeaderboard`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct EndpointHits {
    pub submit: usize,
    pub rank: usize,
    pub top: usize,
}

/// In-memory leaderboard keyed by user id, summing every submitted score.
#[derive(Clone, Default)]
pub struct SharedLeaderboard {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    totals: RwLock<HashMap<u64, u64>>,
    submit_hits: AtomicUsize,
    rank_hits: AtomicUsize,
    top_hits: AtomicUsize,
}

impl SharedLeaderboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&self, request: SubmitScoreRequest) -> SubmitScoreResponse {
        self.inner.submit_hits.fetch_add(1, Ordering::AcqRel);
        let mut totals = self
            .inner
            .totals
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *totals.entry(request.user_id).or_default() += u64::from(request.score);
        SubmitScoreResponse {
            message: "Score submitted successfully".to_owned(),
        }
    }

    /// Rank is one plus the number of users with a strictly higher total.
    #[must_use]
    pub fn rank(&self, user_id: u64) -> Option<RankResponse> {
        self.inner.rank_hits.fetch_add(1, Ordering::AcqRel);
        let totals = self
            .inner
            .totals
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let total = *totals.get(&user_id)?;
        let higher = totals.values().filter(|other| **other > total).count() as u64;
        Some(RankResponse {
            user_id: Some(user_id),
            rank: higher + 1,
            total_score: Some(total.into()),
        })
    }

    /// Leading entries by total, descending; ties are broken by ascending user id.
    #[must_use]
    pub fn top(&self, limit: usize) -> Vec<TopEntry> {
        self.inner.top_hits.fetch_add(1, Ordering::AcqRel);
        let totals = self
            .inner
            .totals
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<TopEntry> = totals
            .iter()
            .map(|(user_id, total_score)| TopEntry {
                user_id: *user_id,
                total_score: *total_score,
            })
            .collect();
        entries.sort_unstable_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then(a.user_id.cmp(&b.user_id))
        });
        entries.truncate(limit);
        entries
    }

    #[inline]
    #[must_use]
    pub fn total(&self, user_id: u64) -> Option<u64> {
        self.inner
            .totals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .copied()
    }

    #[inline]
    #[must_use]
    pub fn hits(&self) -> EndpointHits {
        EndpointHits {
            submit: self.inner.submit_hits.load(Ordering::Acquire),
            rank: self.inner.rank_hits.load(Ordering::Acquire),
            top: self.inner.top_hits.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_encodes_requested_casing() {
        let req = SubmitScoreRequest::new(7, 42);
        let camel: serde_json::Value =
            serde_json::from_slice(&req.to_json(FieldCasing::Camel)).unwrap();
        assert_eq!(camel, serde_json::json!({ "userId": 7, "score": 42 }));
        let snake: serde_json::Value =
            serde_json::from_slice(&req.to_json(FieldCasing::Snake)).unwrap();
        assert_eq!(snake, serde_json::json!({ "user_id": 7, "score": 42 }));
    }

    #[test]
    fn submit_request_accepts_both_casings() {
        let camel: SubmitScoreRequest = serde_json::from_str(r#"{"userId":1,"score":5}"#).unwrap();
        let snake: SubmitScoreRequest = serde_json::from_str(r#"{"user_id":1,"score":5}"#).unwrap();
        assert_eq!(camel, snake);
    }

    #[test]
    fn rank_response_tolerates_service_variants() {
        let rank: RankResponse =
            serde_json::from_str(r#"{"user_id":3,"rank":2,"total_score":"150"}"#).unwrap();
        assert_eq!(rank.rank, 2);
        assert_eq!(rank.user_id, Some(3));
        let bare: RankResponse = serde_json::from_str(r#"{"rank":9}"#).unwrap();
        assert_eq!(bare.rank, 9);
        assert!(bare.user_id.is_none());
    }

    #[test]
    fn leaderboard_accumulates_and_ranks() {
        let board = SharedLeaderboard::new();
        let _ = board.submit(SubmitScoreRequest::new(1, 10));
        let _ = board.submit(SubmitScoreRequest::new(2, 30));
        let _ = board.submit(SubmitScoreRequest::new(1, 5));
        let _ = board.submit(SubmitScoreRequest::new(3, 30));

        assert_eq!(board.total(1), Some(15));
        assert_eq!(board.rank(1).unwrap().rank, 3);
        assert_eq!(board.rank(2).unwrap().rank, 1);
        assert_eq!(board.rank(3).unwrap().rank, 1);
        assert!(board.rank(99).is_none());

        let top = board.top(2);
        assert_eq!(
            top,
            vec![
                TopEntry { user_id: 2, total_score: 30 },
                TopEntry { user_id: 3, total_score: 30 },
            ]
        );
        assert_eq!(
            board.hits(),
            EndpointHits {
                submit: 4,
                rank: 4,
                top: 1
            }
        );
    }
}
