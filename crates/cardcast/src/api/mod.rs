//! Backend job service: the two endpoints this crate consumes.
//!
//! - `GET /api/create?prompt=<text>` answers `{"call_id": ...}`.
//! - `GET /api/status/<call_id>` answers one of an error object, a finished
//!   result set, or anything else (still running).
//!
//! [`JobService`] abstracts the transport so the
//! [`JobController`](crate::job::JobController) can be driven by the real
//! [`HttpJobService`] or by a scripted fake in tests.

mod http;

pub use http::HttpJobService;

use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ServiceError;

/// Boxed future returned by [`JobService`] methods.
pub type ServiceFuture<'a, T> = BoxFuture<'a, Result<T, ServiceError>>;

/// Access to the backend job service.
///
/// Implementations must be cheap to share: the controller holds one behind an
/// `Arc` and calls it from spawned tasks.
pub trait JobService: Send + Sync + 'static {
    /// Start a job for `prompt` and return its id.
    fn create<'a>(&'a self, prompt: &'a str) -> ServiceFuture<'a, JobId>;

    /// Fetch the current status of job `id`.
    fn status<'a>(&'a self, id: &'a JobId) -> ServiceFuture<'a, StatusReply>;
}

// ── Job id ─────────────────────────────────────────────────────────

/// Opaque job token assigned by the backend.
///
/// The backend may send it as a JSON string or number; both are kept as text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId(s.to_string())
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        scalar_to_string(serde_json::Value::deserialize(deserializer)?)
            .map(JobId)
            .ok_or_else(|| serde::de::Error::custom("call_id must be a string or number"))
    }
}

/// Text form of a JSON string or number; `None` for anything else.
fn scalar_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── Create ─────────────────────────────────────────────────────────

/// Body of a successful `/api/create` response.
#[derive(Deserialize, Debug)]
pub struct CreateReply {
    pub call_id: JobId,
}

// ── Status ─────────────────────────────────────────────────────────

/// Classified `/api/status/<id>` response.
#[derive(Clone, Debug, PartialEq)]
pub enum StatusReply {
    /// No error and not finished yet.
    Running,
    /// The backend reported an error; the message is shown verbatim.
    Failed(String),
    /// The job finished with these cards.
    Finished(Vec<CardRecord>),
}

/// Raw status body. Every field is optional so that unknown shapes fall
/// through to [`StatusReply::Running`].
#[derive(Deserialize, Debug, Default)]
struct RawStatus {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    finished: Option<serde_json::Value>,
    #[serde(default)]
    cards: Option<serde_json::Value>,
}

impl StatusReply {
    /// Classify a status response body.
    ///
    /// An `error` field wins over `finished`. `finished` counts only when it is
    /// JSON `true`. Bodies that are not JSON objects are treated as running.
    /// A finished body whose `cards` cannot be read is a terminal failure.
    pub fn from_json(text: &str) -> Result<Self, ServiceError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ServiceError::Decode(e.to_string()))?;
        if !value.is_object() {
            return Ok(StatusReply::Running);
        }
        let raw: RawStatus =
            serde_json::from_value(value).map_err(|e| ServiceError::Decode(e.to_string()))?;

        if let Some(err) = raw.error.filter(|e| !e.is_null()) {
            return Ok(StatusReply::Failed(error_message(err)));
        }
        if raw.finished == Some(serde_json::Value::Bool(true)) {
            return Ok(match raw.cards.filter(|c| !c.is_null()) {
                None => StatusReply::Finished(Vec::new()),
                Some(cards) => match serde_json::from_value(cards) {
                    Ok(cards) => StatusReply::Finished(cards),
                    Err(e) => {
                        StatusReply::Failed(format!("malformed cards in finished reply: {e}"))
                    }
                },
            });
        }
        Ok(StatusReply::Running)
    }
}

/// The `message` of an error object, or the error's JSON text when there is
/// no string message.
fn error_message(err: serde_json::Value) -> String {
    match err {
        serde_json::Value::Object(ref map) => match map.get("message") {
            Some(serde_json::Value::String(m)) => m.clone(),
            _ => err.to_string(),
        },
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

// ── Cards ──────────────────────────────────────────────────────────

/// One generated card, passed through to the presentation layer unmodified.
/// Missing text fields decode as empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    #[serde(default)]
    pub name: String,
    /// Display number. Any JSON scalar, shown as text; `null` is empty.
    #[serde(default, deserialize_with = "display_number")]
    pub bar: String,
    #[serde(default = "default_mime")]
    pub mime: String,
    #[serde(default)]
    pub b64_encoded_image: String,
    #[serde(default = "default_rarity")]
    pub rarity: String,
}

fn default_mime() -> String {
    "image/png".to_string()
}

fn default_rarity() -> String {
    "Common".to_string()
}

fn display_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => scalar_to_string(other)
            .ok_or_else(|| serde::de::Error::custom("bar must be a scalar")),
    }
}
