//! Convenience re-exports for common `cardcast` types.
//!
//! ```ignore
//! use cardcast::prelude::*;
//! ```
//!
//! Wire-level types (`CreateReply`, `JobEvent`) stay in their modules.

// ── Backend ─────────────────────────────────────────────────────────
pub use crate::api::{CardRecord, HttpJobService, JobId, JobService, ServiceFuture, StatusReply};
pub use crate::config::{ClientConfig, JobConfig};
pub use crate::error::{JobError, ServiceError};

// ── Jobs ────────────────────────────────────────────────────────────
pub use crate::job::{Job, JobController, JobState};

// ── Autocomplete ────────────────────────────────────────────────────
pub use crate::autocomplete::{Autocomplete, Corpus, Direction, Suggestion};

// ── Session ─────────────────────────────────────────────────────────
pub use crate::session::{EnterOutcome, Session, SessionSnapshot, UserAction};

// ── Logging ─────────────────────────────────────────────────────────
pub use crate::logging::{LogBuffer, LogLevel, LogLine, UiTracingLayer};
