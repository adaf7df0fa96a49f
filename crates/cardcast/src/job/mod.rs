//! Job lifecycle: submit, poll, settle, reveal.
//!
//! ```text
//!            submit ok            create ok            finished + settle
//!   Idle ───────────▶ Submitting ──────────▶ Polling ───────────────────▶ Completed
//!                          │                    │
//!                          │ create failed      │ error payload
//!                          ▼                    ▼
//!                        Failed               Failed
//! ```
//!
//! A new `submit` supersedes whatever job is live: the poll timer is aborted
//! before any new request is issued, and the epoch is bumped so late events
//! from the old job are dropped on arrival.

mod controller;

pub use controller::JobController;

use std::time::Instant;

use serde::Serialize;

use crate::api::{CardRecord, JobId, StatusReply};
use crate::error::{JobError, ServiceError};

/// Lifecycle state of the current job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum JobState {
    /// Nothing submitted yet.
    Idle,
    /// Creation request in flight.
    Submitting,
    /// Job id known; the status endpoint is being polled.
    Polling,
    /// Results revealed.
    Completed,
    /// Creation or polling failed; see [`Job::error`].
    Failed,
}

impl JobState {
    /// `Completed` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// `Submitting` or `Polling`.
    pub fn is_busy(self) -> bool {
        matches!(self, JobState::Submitting | JobState::Polling)
    }

    /// Short label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            JobState::Idle => "Idle",
            JobState::Submitting => "Submitting",
            JobState::Polling => "Generating",
            JobState::Completed => "Done",
            JobState::Failed => "Failed",
        }
    }
}

/// The live (or last) generation request.
#[derive(Clone, Debug)]
pub struct Job {
    /// Submission counter this job belongs to. Events carry it too.
    pub epoch: u64,
    /// Trimmed prompt that was submitted.
    pub prompt: String,
    /// Backend-assigned id, known from `Polling` on.
    pub id: Option<JobId>,
    pub state: JobState,
    /// Cards, non-empty only in `Completed`.
    pub results: Vec<CardRecord>,
    /// Terminal error, set only in `Failed`.
    pub error: Option<JobError>,
    /// `finished` was observed and results are waiting out the settle delay.
    pub settling: bool,
    /// Status responses received so far.
    pub polls: u32,
    pub submitted_at: Option<Instant>,
}

impl Job {
    fn idle() -> Self {
        Self {
            epoch: 0,
            prompt: String::new(),
            id: None,
            state: JobState::Idle,
            results: Vec::new(),
            error: None,
            settling: false,
            polls: 0,
            submitted_at: None,
        }
    }

    fn submitting(epoch: u64, prompt: &str) -> Self {
        Self {
            epoch,
            prompt: prompt.to_string(),
            state: JobState::Submitting,
            submitted_at: Some(Instant::now()),
            ..Self::idle()
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::idle()
    }
}

/// Completion delivered back to the controller by one of its tasks.
#[derive(Debug)]
pub struct JobEvent {
    /// Epoch of the submission that spawned the task.
    pub epoch: u64,
    pub kind: JobEventKind,
}

#[derive(Debug)]
pub enum JobEventKind {
    /// The creation request returned.
    Created(Result<JobId, ServiceError>),
    /// One poll tick's status request returned.
    Status(Result<StatusReply, ServiceError>),
    /// The settle delay elapsed; these cards can be revealed.
    Settled(Vec<CardRecord>),
}
