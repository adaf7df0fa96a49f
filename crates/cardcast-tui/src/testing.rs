//! Test fixtures: a session whose backend is never reachable.

use cardcast::api::{JobId, JobService, ServiceFuture, StatusReply};
use cardcast::autocomplete::Corpus;
use cardcast::config::JobConfig;
use cardcast::error::ServiceError;
use cardcast::session::Session;

pub(crate) struct OfflineService;

impl JobService for OfflineService {
    fn create<'a>(&'a self, _prompt: &'a str) -> ServiceFuture<'a, JobId> {
        Box::pin(async { Err(ServiceError::Request("offline".into())) })
    }

    fn status<'a>(&'a self, _id: &'a JobId) -> ServiceFuture<'a, StatusReply> {
        Box::pin(async { Ok(StatusReply::Running) })
    }
}

/// Needs a tokio runtime for the job tasks.
pub(crate) fn offline_session() -> Session<OfflineService> {
    Session::new(
        OfflineService,
        Corpus::new(["Pikachu", "Pidgey", "Bulbasaur", "Mew"]),
        JobConfig::default(),
    )
}
