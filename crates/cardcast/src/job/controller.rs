//! [`JobController`]: owns the live job, its poll timer and settle delay.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{Job, JobEvent, JobEventKind, JobState};
use crate::api::{CardRecord, JobId, JobService, StatusReply};
use crate::config::JobConfig;
use crate::error::JobError;
use crate::log_prompt;

/// Drives one job at a time through create, poll and settle.
///
/// Network calls and timers run as tokio tasks; their completions come back
/// as [`JobEvent`]s which the owner feeds to [`handle`](Self::handle), one at
/// a time, from a single event loop. Only the controller mutates [`Job`].
///
/// Invariant: at most one poll timer task exists. It is aborted before a new
/// submission issues any request, and inside the same `handle` call that
/// observes a terminal status.
pub struct JobController<S: JobService> {
    service: Arc<S>,
    config: JobConfig,
    runtime: Handle,
    tx: mpsc::UnboundedSender<JobEvent>,
    rx: mpsc::UnboundedReceiver<JobEvent>,
    epoch: u64,
    job: Job,
    poller: Option<JoinHandle<()>>,
    settle: Option<JoinHandle<()>>,
}

impl<S: JobService> JobController<S> {
    /// Create a controller that spawns its tasks on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime. Use
    /// [`with_runtime`](Self::with_runtime) to pass a handle explicitly.
    pub fn new(service: S, config: JobConfig) -> Self {
        Self::with_runtime(service, config, Handle::current())
    }

    /// Create a controller that spawns its tasks on `runtime`.
    pub fn with_runtime(service: S, config: JobConfig, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            service: Arc::new(service),
            config,
            runtime,
            tx,
            rx,
            epoch: 0,
            job: Job::default(),
            poller: None,
            settle: None,
        }
    }

    /// The current job.
    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// The backend service this controller talks to.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Whether a poll timer task is currently scheduled.
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Submit `prompt`, superseding any live job.
    ///
    /// An empty or whitespace-only prompt returns [`JobError::Validation`]
    /// and leaves the current job untouched without any network activity.
    pub fn submit(&mut self, prompt: &str) -> Result<(), JobError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            warn!("Ignoring empty prompt submission");
            return Err(JobError::Validation);
        }

        // Cancel before anything new is issued.
        self.cancel_timers();
        self.epoch += 1;
        self.job = Job::submitting(self.epoch, prompt);
        info!("Submitting job #{}: '{}'", self.epoch, log_prompt(prompt));

        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let epoch = self.epoch;
        let prompt = prompt.to_string();
        self.runtime.spawn(async move {
            let result = service.create(&prompt).await;
            let _ = tx.send(JobEvent {
                epoch,
                kind: JobEventKind::Created(result),
            });
        });
        Ok(())
    }

    /// Apply one task completion. Returns whether visible job state changed.
    ///
    /// Events from a superseded submission are dropped, and status results
    /// are ignored unless the job is still polling and not yet settling.
    pub fn handle(&mut self, event: JobEvent) -> bool {
        if event.epoch != self.epoch {
            debug!(
                "Dropping stale event from job #{} (current #{})",
                event.epoch, self.epoch
            );
            return false;
        }

        match event.kind {
            JobEventKind::Created(result) => {
                if self.job.state != JobState::Submitting {
                    return false;
                }
                match result {
                    Ok(id) => {
                        info!("Job #{} created with id {id}", self.epoch);
                        self.job.id = Some(id.clone());
                        self.job.state = JobState::Polling;
                        self.start_polling(id);
                    }
                    Err(e) => {
                        warn!("Job #{} creation failed: {e}", self.epoch);
                        self.fail(JobError::from(e));
                    }
                }
                true
            }
            JobEventKind::Status(result) => {
                if self.job.state != JobState::Polling || self.job.settling {
                    debug!("Ignoring status for job #{} in {:?}", self.epoch, self.job.state);
                    return false;
                }
                self.job.polls += 1;
                match result {
                    Ok(StatusReply::Running) => {
                        debug!("Job #{} still running (poll {})", self.epoch, self.job.polls);
                        false
                    }
                    Ok(StatusReply::Failed(message)) => {
                        self.stop_polling();
                        warn!("Job #{} failed: {message}", self.epoch);
                        self.fail(JobError::Poll(message));
                        true
                    }
                    Ok(StatusReply::Finished(cards)) => {
                        // Stop ticking before anything else so no tick races completion.
                        self.stop_polling();
                        info!(
                            "Job #{} finished with {} card(s); revealing in {:?}",
                            self.epoch,
                            cards.len(),
                            self.config.settle_delay
                        );
                        self.job.settling = true;
                        self.start_settle(cards);
                        true
                    }
                    Err(e) => {
                        // Transient: the next tick is the retry.
                        warn!("Status poll for job #{} failed, will retry: {e}", self.epoch);
                        false
                    }
                }
            }
            JobEventKind::Settled(cards) => {
                if self.job.state != JobState::Polling || !self.job.settling {
                    return false;
                }
                self.settle = None;
                self.job.settling = false;
                self.job.state = JobState::Completed;
                self.job.results = cards;
                info!(
                    "Job #{} completed with {} card(s)",
                    self.epoch,
                    self.job.results.len()
                );
                true
            }
        }
    }

    /// Wait for the next task completion.
    ///
    /// Only await this while a job is busy; with nothing in flight it never
    /// resolves.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.rx.recv().await
    }

    /// A task completion that is already waiting, if any.
    pub fn try_next_event(&mut self) -> Option<JobEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for one event and apply it. Returns whether state changed.
    pub async fn pump(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => self.handle(event),
            None => false,
        }
    }

    /// Apply every event that is already waiting. Returns whether any
    /// changed state.
    pub fn drain_ready(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.try_next_event() {
            changed |= self.handle(event);
        }
        changed
    }

    fn fail(&mut self, error: JobError) {
        self.job.state = JobState::Failed;
        self.job.settling = false;
        self.job.results.clear();
        self.job.error = Some(error);
    }

    fn start_polling(&mut self, id: JobId) {
        self.stop_polling();
        // `interval_at` panics on a zero period.
        let period = self.config.poll_interval.max(Duration::from_millis(1));
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let epoch = self.epoch;
        debug!("Polling job #{epoch} ({id}) every {period:?}");
        self.poller = Some(self.runtime.spawn(async move {
            let mut ticks = time::interval_at(time::Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let result = service.status(&id).await;
                let event = JobEvent {
                    epoch,
                    kind: JobEventKind::Status(result),
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_polling(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
        }
    }

    fn start_settle(&mut self, cards: Vec<CardRecord>) {
        let delay = self.config.settle_delay;
        let tx = self.tx.clone();
        let epoch = self.epoch;
        self.settle = Some(self.runtime.spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(JobEvent {
                epoch,
                kind: JobEventKind::Settled(cards),
            });
        }));
    }

    fn cancel_timers(&mut self) {
        self.stop_polling();
        if let Some(handle) = self.settle.take() {
            handle.abort();
        }
    }
}

impl<S: JobService> Drop for JobController<S> {
    fn drop(&mut self) {
        self.cancel_timers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::testing::{FakeService, card};

    fn controller(service: &FakeService) -> JobController<FakeService> {
        JobController::new(service.clone(), JobConfig::default())
    }

    /// Wait for the next event, failing the test if none arrives within a
    /// minute of (paused) time.
    async fn pump(c: &mut JobController<FakeService>) -> bool {
        let event = time::timeout(Duration::from_secs(60), c.next_event())
            .await
            .expect("expected an event")
            .expect("channel open");
        c.handle(event)
    }

    async fn assert_quiet(c: &mut JobController<FakeService>) {
        let waited = time::timeout(Duration::from_secs(30), c.next_event()).await;
        assert!(waited.is_err(), "expected no further events");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_prompt_is_rejected_without_network() {
        let service = FakeService::new();
        let mut c = controller(&service);

        assert_eq!(c.submit(""), Err(JobError::Validation));
        assert_eq!(c.submit("   \t\n"), Err(JobError::Validation));
        assert_eq!(c.job().state, JobState::Idle);
        assert_quiet(&mut c).await;
        assert!(service.create_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_reveals_results_after_settle_delay() {
        let service = FakeService::new();
        service
            .on_create(Ok(JobId::from("abc")))
            .on_status("abc", Ok(StatusReply::Running))
            .on_status("abc", Ok(StatusReply::Finished(vec![card("Pikachu", "25")])));
        let mut c = controller(&service);

        c.submit("  Pikachu ").unwrap();
        assert_eq!(c.job().state, JobState::Submitting);
        assert_eq!(c.job().prompt, "Pikachu");

        assert!(pump(&mut c).await);
        assert_eq!(c.job().state, JobState::Polling);
        assert_eq!(c.job().id, Some(JobId::from("abc")));
        assert!(c.is_polling());

        // First tick: still running, no visible change.
        let before = time::Instant::now();
        assert!(!pump(&mut c).await);
        let waited = time::Instant::now() - before;
        assert!(waited >= Duration::from_millis(2000) && waited < Duration::from_millis(2100));
        assert_eq!(c.job().state, JobState::Polling);

        // Second tick: finished, timer stopped, results held back.
        assert!(pump(&mut c).await);
        assert!(c.job().settling);
        assert!(!c.is_polling());
        assert_eq!(c.job().state, JobState::Polling);
        assert!(c.job().results.is_empty());

        let finished_at = time::Instant::now();
        assert!(pump(&mut c).await);
        let settled = time::Instant::now() - finished_at;
        assert!(settled >= Duration::from_millis(500) && settled < Duration::from_millis(600));
        assert_eq!(c.job().state, JobState::Completed);
        assert_eq!(c.job().results.len(), 1);
        assert_eq!(c.job().results[0].name, "Pikachu");
        assert_eq!(c.job().polls, 2);
        assert_eq!(service.status_calls_for("abc"), 2);
        assert_quiet(&mut c).await;
    }

    #[tokio::test(start_paused = true)]
    async fn poll_error_is_terminal_and_stops_timer() {
        let service = FakeService::new();
        service
            .on_create(Ok(JobId::from("abc")))
            .on_status("abc", Ok(StatusReply::Failed("rate limited".into())));
        let mut c = controller(&service);

        c.submit("Pikachu").unwrap();
        pump(&mut c).await;
        assert!(pump(&mut c).await);

        assert_eq!(c.job().state, JobState::Failed);
        assert_eq!(c.job().error, Some(JobError::Poll("rate limited".into())));
        assert!(!c.is_polling());
        assert_quiet(&mut c).await;
        assert_eq!(service.status_calls_for("abc"), 1);

        // A tick delivered anyway (e.g. already queued) must not mutate state.
        let late = JobEvent {
            epoch: c.job().epoch,
            kind: JobEventKind::Status(Ok(StatusReply::Finished(vec![card("X", "1")]))),
        };
        assert!(!c.handle(late));
        assert_eq!(c.job().state, JobState::Failed);
        assert!(c.job().results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn create_failure_is_submission_error_and_never_polls() {
        let service = FakeService::new();
        service.on_create(Err(ServiceError::Http {
            status: 500,
            body: "oops".into(),
        }));
        let mut c = controller(&service);

        c.submit("Pikachu").unwrap();
        assert!(pump(&mut c).await);
        assert_eq!(c.job().state, JobState::Failed);
        assert!(matches!(c.job().error, Some(JobError::Submission(_))));
        assert!(!c.is_polling());
        assert_quiet(&mut c).await;
    }

    #[tokio::test(start_paused = true)]
    async fn transient_poll_failure_keeps_polling() {
        let service = FakeService::new();
        service
            .on_create(Ok(JobId::from("abc")))
            .on_status("abc", Err(ServiceError::Request("connection reset".into())))
            .on_status("abc", Ok(StatusReply::Finished(vec![])));
        let mut c = controller(&service);

        c.submit("Pikachu").unwrap();
        pump(&mut c).await;
        assert!(!pump(&mut c).await);
        assert_eq!(c.job().state, JobState::Polling);
        assert!(c.is_polling());

        assert!(pump(&mut c).await);
        assert!(pump(&mut c).await);
        assert_eq!(c.job().state, JobState::Completed);
        assert!(c.job().results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn finished_reply_with_unreadable_cards_ends_the_job() {
        let body = r#"{"finished":true,"cards":[{"name":"Pikachu","bar":{"n":25}}]}"#;
        let service = FakeService::new();
        service
            .on_create(Ok(JobId::from("abc")))
            .on_status("abc", StatusReply::from_json(body));
        let mut c = controller(&service);

        c.submit("Pikachu").unwrap();
        pump(&mut c).await;
        assert!(pump(&mut c).await);

        assert_eq!(c.job().state, JobState::Failed);
        assert!(matches!(
            c.job().error,
            Some(JobError::Poll(ref m)) if m.starts_with("malformed cards")
        ));
        assert!(!c.is_polling());
        assert_quiet(&mut c).await;
        assert_eq!(service.status_calls_for("abc"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn resubmit_cancels_previous_poll_loop() {
        let service = FakeService::new();
        service
            .on_create(Ok(JobId::from("first")))
            .on_create(Ok(JobId::from("second")));
        let mut c = controller(&service);

        c.submit("one").unwrap();
        pump(&mut c).await;
        pump(&mut c).await;
        assert_eq!(service.status_calls_for("first"), 1);

        c.submit("two").unwrap();
        assert!(!c.is_polling(), "old timer must be gone before the new create");
        assert_eq!(c.job().state, JobState::Submitting);
        assert!(c.job().error.is_none());
        pump(&mut c).await;
        assert_eq!(c.job().id, Some(JobId::from("second")));

        for _ in 0..3 {
            pump(&mut c).await;
        }
        assert_eq!(service.status_calls_for("first"), 1);
        assert_eq!(service.status_calls_for("second"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_events_are_dropped() {
        let service = FakeService::new();
        let mut c = controller(&service);

        c.submit("one").unwrap();
        c.submit("two").unwrap();
        let old_epoch = c.job().epoch - 1;

        // A late create reply for the superseded job must not touch state.
        let stale = JobEvent {
            epoch: old_epoch,
            kind: JobEventKind::Created(Ok(JobId::from("stale"))),
        };
        assert!(!c.handle(stale));
        assert_eq!(c.job().state, JobState::Submitting);
        assert_eq!(c.job().prompt, "two");

        // Both real create replies arrive; only the current one applies.
        let mut applied = 0;
        for _ in 0..2 {
            if pump(&mut c).await {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
        assert_eq!(c.job().id, Some(JobId::from("job-2")));
    }

    #[tokio::test(start_paused = true)]
    async fn resubmit_during_settle_discards_pending_results() {
        let service = FakeService::new();
        service
            .on_create(Ok(JobId::from("a")))
            .on_status("a", Ok(StatusReply::Finished(vec![card("Old", "1")])));
        let mut c = controller(&service);

        c.submit("old").unwrap();
        pump(&mut c).await;
        pump(&mut c).await;
        assert!(c.job().settling);

        c.submit("new").unwrap();
        assert!(!c.job().settling);
        pump(&mut c).await; // create for "new"
        assert_eq!(c.job().state, JobState::Polling);
        assert!(c.job().results.is_empty());
        // The next event is a tick for the new job, not the old settle.
        assert!(!pump(&mut c).await);
        assert_eq!(c.job().state, JobState::Polling);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_ready_applies_queued_events() {
        let service = FakeService::new();
        let mut c = controller(&service);

        c.submit("Pikachu").unwrap();
        assert!(!c.drain_ready());
        tokio::task::yield_now().await;
        time::sleep(Duration::from_millis(1)).await;
        assert!(c.drain_ready());
        assert_eq!(c.job().state, JobState::Polling);
    }
}
