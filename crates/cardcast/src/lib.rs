//! Prompt-to-card job client.
//!
//! `cardcast` turns free-text prompts into card results produced
//! asynchronously by a backend job service, and offers a prefix autocomplete
//! over a fixed suggestion corpus while the prompt is being typed.
//!
//! The two pieces with real state-machine behavior live here:
//!
//! - [`JobController`](job::JobController) submits a creation request, polls
//!   the job status on a fixed interval, and reveals results after a short
//!   settle delay. At most one job is live at a time.
//! - [`Autocomplete`](autocomplete::Autocomplete) filters the corpus against
//!   the current input, tracks a highlighted suggestion, and commits a
//!   selection back into the input value.
//!
//! [`Session`](session::Session) composes both around a single input value
//! and is what a front end (see the `cardcast-tui` crate) drives.
//!
//! # Getting started
//!
//! ```ignore
//! use cardcast::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let service = HttpJobService::new(ClientConfig::default()).map_err(|e| e.to_string())?;
//!     let mut session = Session::new(service, Corpus::builtin(), JobConfig::default());
//!
//!     session.on_input_changed("pik");
//!     session.on_arrow_key(Direction::Down);
//!     session.on_enter_key(); // input is now "Pikachu"
//!
//!     session.submit().map_err(|e| e.to_string())?;
//!     while !session.job().state.is_terminal() {
//!         session.pump().await;
//!     }
//!     println!("{:?}", session.job().state);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | [`JobService`](api::JobService) trait, wire types, reqwest-backed [`HttpJobService`](api::HttpJobService) |
//! | [`job`] | [`JobController`](job::JobController), [`Job`](job::Job), poll timer and settle delay |
//! | [`autocomplete`] | Corpus, prefix matching, highlight navigation, commit |
//! | [`session`] | Input value ownership, user actions, presentation snapshot |
//! | [`cards`] | Card display helpers and saving decoded images |
//! | [`logging`] | Tracing layer that buffers log lines for a UI to drain |

pub mod api;
pub mod autocomplete;
pub mod cards;
pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod prelude;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{JobError, ServiceError};

// ── Constants ──────────────────────────────────────────────────────

/// Base URL used when neither `--base-url` nor `CARDCAST_URL` is given.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Environment variable consulted for the backend base URL.
pub const BASE_URL_ENV: &str = "CARDCAST_URL";

/// Prompts longer than this are shortened in log output.
pub const LOG_PROMPT_MAX_CHARS: usize = 100;

// ── Prompt helpers ─────────────────────────────────────────────────

/// Shorten a prompt for log output, appending an ellipsis when cut.
pub fn log_prompt(prompt: &str) -> String {
    if prompt.chars().count() > LOG_PROMPT_MAX_CHARS {
        let head: String = prompt.chars().take(LOG_PROMPT_MAX_CHARS).collect();
        format!("{head}\u{2026}")
    } else {
        prompt.to_string()
    }
}

/// The cache key form of a prompt used by the backend: lowercased, with
/// everything outside `[a-z0-9- ]` removed.
///
/// Two prompts that normalize to the same string are served from the same
/// cached result set, which is worth knowing when a "new" prompt returns
/// instantly.
pub fn normalize_prompt(prompt: &str) -> String {
    prompt
        .to_lowercase()
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | ' '))
        .collect()
}
