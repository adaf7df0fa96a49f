//! Test doubles shared by unit tests across modules.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use futures::FutureExt;

use crate::api::{CardRecord, JobId, JobService, ServiceFuture, StatusReply};
use crate::error::ServiceError;

/// Scripted in-memory job service.
///
/// Create replies are consumed in order (default: sequential ids
/// `job-1`, `job-2`, ...). Status replies are queued per id; an empty
/// queue answers `Running`.
#[derive(Clone, Default)]
pub(crate) struct FakeService {
    inner: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    creates: VecDeque<Result<JobId, ServiceError>>,
    statuses: HashMap<String, VecDeque<Result<StatusReply, ServiceError>>>,
    create_calls: Vec<String>,
    status_calls: Vec<String>,
}

impl FakeService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_create(&self, reply: Result<JobId, ServiceError>) -> &Self {
        self.inner.lock().unwrap().creates.push_back(reply);
        self
    }

    pub(crate) fn on_status(&self, id: &str, reply: Result<StatusReply, ServiceError>) -> &Self {
        self.inner
            .lock()
            .unwrap()
            .statuses
            .entry(id.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn create_calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().create_calls.clone()
    }

    pub(crate) fn status_calls_for(&self, id: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .status_calls
            .iter()
            .filter(|c| c.as_str() == id)
            .count()
    }
}

impl JobService for FakeService {
    fn create<'a>(&'a self, prompt: &'a str) -> ServiceFuture<'a, JobId> {
        let reply = {
            let mut s = self.inner.lock().unwrap();
            s.create_calls.push(prompt.to_string());
            let n = s.create_calls.len();
            s.creates
                .pop_front()
                .unwrap_or_else(|| Ok(JobId(format!("job-{n}"))))
        };
        async move { reply }.boxed()
    }

    fn status<'a>(&'a self, id: &'a JobId) -> ServiceFuture<'a, StatusReply> {
        let reply = {
            let mut s = self.inner.lock().unwrap();
            s.status_calls.push(id.0.clone());
            s.statuses
                .get_mut(id.as_str())
                .and_then(|q| q.pop_front())
                .unwrap_or(Ok(StatusReply::Running))
        };
        async move { reply }.boxed()
    }
}

pub(crate) fn card(name: &str, bar: &str) -> CardRecord {
    CardRecord {
        name: name.into(),
        bar: bar.into(),
        mime: "image/png".into(),
        b64_encoded_image: "aGVsbG8=".into(),
        rarity: "Common".into(),
    }
}
