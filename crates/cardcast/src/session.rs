//! One interactive session: the input value, its autocomplete, and the job
//! controller it submits to.
//!
//! The front end reports user actions; the session applies them
//! synchronously and exposes read-only state for rendering. Derived state
//! (filtered suggestions, highlight) is recomputed inside the handler that
//! changes its inputs, so it is never stale.

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::debug;

use crate::api::{CardRecord, JobId, JobService};
use crate::autocomplete::{Autocomplete, Corpus, Direction, Suggestion, strip_markup};
use crate::config::JobConfig;
use crate::error::JobError;
use crate::job::{Job, JobController, JobState};

/// Something the user did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAction {
    /// The text box now holds this value.
    InputChanged(String),
    Arrow(Direction),
    /// Enter in the text box: commits a highlighted suggestion, otherwise
    /// submits the form.
    Enter,
    /// A suggestion was picked with the pointer; carries its rendered text.
    SuggestionClicked(String),
    /// Explicit form submission.
    Submit,
}

/// What Enter did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnterOutcome {
    /// A highlighted suggestion was written into the input; focus belongs
    /// back on the text field.
    Committed,
    /// Nothing was highlighted; Enter should go on to submit the form.
    PassThrough,
}

/// Session state: input value, autocomplete, and the live job.
pub struct Session<S: JobService> {
    input: String,
    autocomplete: Autocomplete,
    jobs: JobController<S>,
}

impl<S: JobService> Session<S> {
    /// Create a session whose job tasks run on the current tokio runtime.
    pub fn new(service: S, corpus: Corpus, config: JobConfig) -> Self {
        Self::with_runtime(service, corpus, config, Handle::current())
    }

    /// Create a session whose job tasks run on `runtime`.
    pub fn with_runtime(service: S, corpus: Corpus, config: JobConfig, runtime: Handle) -> Self {
        Self {
            input: String::new(),
            autocomplete: Autocomplete::new(corpus),
            jobs: JobController::with_runtime(service, config, runtime),
        }
    }

    /// Current text box content.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        self.autocomplete.suggestions()
    }

    pub fn highlight(&self) -> Option<usize> {
        self.autocomplete.highlight()
    }

    pub fn job(&self) -> &Job {
        self.jobs.job()
    }

    pub fn controller(&self) -> &JobController<S> {
        &self.jobs
    }

    /// The text box changed: store it and refilter.
    pub fn on_input_changed(&mut self, value: impl Into<String>) {
        self.input = value.into();
        self.autocomplete.on_input_changed(&self.input);
    }

    pub fn on_arrow_key(&mut self, direction: Direction) {
        self.autocomplete.on_arrow_key(direction);
    }

    /// Commit the highlighted suggestion, if any.
    pub fn on_enter_key(&mut self) -> EnterOutcome {
        match self.autocomplete.take_highlighted() {
            Some(text) => {
                debug!("Committed suggestion '{text}'");
                self.input = text;
                EnterOutcome::Committed
            }
            None => EnterOutcome::PassThrough,
        }
    }

    /// Commit a suggestion picked by pointer, whatever is highlighted.
    pub fn on_suggestion_clicked(&mut self, raw: &str) {
        let text = strip_markup(raw);
        debug!("Clicked suggestion '{text}'");
        self.input = text;
        self.autocomplete.clear();
    }

    /// Submit the current input as a new job.
    pub fn submit(&mut self) -> Result<(), JobError> {
        self.jobs.submit(&self.input)
    }

    /// Apply a user action. Enter with nothing highlighted submits.
    pub fn dispatch(&mut self, action: UserAction) -> Result<(), JobError> {
        match action {
            UserAction::InputChanged(value) => self.on_input_changed(value),
            UserAction::Arrow(direction) => self.on_arrow_key(direction),
            UserAction::Enter => {
                if self.on_enter_key() == EnterOutcome::PassThrough {
                    return self.submit();
                }
            }
            UserAction::SuggestionClicked(raw) => self.on_suggestion_clicked(&raw),
            UserAction::Submit => return self.submit(),
        }
        Ok(())
    }

    /// Wait for one job event and apply it.
    pub async fn pump(&mut self) -> bool {
        self.jobs.pump().await
    }

    /// Apply all job events that are already waiting.
    pub fn drain_ready(&mut self) -> bool {
        self.jobs.drain_ready()
    }

    /// Read-only view for a presentation layer.
    pub fn snapshot(&self) -> SessionSnapshot {
        let job = self.job();
        SessionSnapshot {
            input: self.input.clone(),
            suggestions: self
                .suggestions()
                .iter()
                .enumerate()
                .map(|(i, s)| SuggestionView {
                    text: s.text.clone(),
                    markup: s.markup(),
                    highlighted: self.highlight() == Some(i),
                })
                .collect(),
            state: job.state,
            settling: job.settling,
            job_id: job.id.clone(),
            results: job.results.clone(),
            error: job.error.as_ref().map(ToString::to_string),
        }
    }
}

/// Serializable presentation state.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub input: String,
    pub suggestions: Vec<SuggestionView>,
    pub state: JobState,
    pub settling: bool,
    pub job_id: Option<JobId>,
    pub results: Vec<CardRecord>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SuggestionView {
    pub text: String,
    pub markup: String,
    pub highlighted: bool,
}
