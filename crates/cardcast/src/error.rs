//! Error types for job submission and the backend transport.

use thiserror::Error;

/// User-visible job errors.
///
/// None of these are retried automatically; a retry is a fresh
/// [`submit`](crate::job::JobController::submit).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The prompt was empty or whitespace-only. No request was made.
    #[error("please enter a prompt first")]
    Validation,

    /// The creation request failed (network error, non-2xx, or no job id).
    #[error("could not start generation: {0}")]
    Submission(String),

    /// The status endpoint reported an error for the job.
    #[error("{0}")]
    Poll(String),
}

/// Failure talking to the backend job service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status code.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was not the JSON shape we expect.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::Request(e.to_string())
    }
}

impl From<ServiceError> for JobError {
    fn from(e: ServiceError) -> Self {
        JobError::Submission(e.to_string())
    }
}
