//! reqwest-backed [`JobService`].

use std::time::Instant;

use futures::FutureExt;
use reqwest::Url;
use tracing::{debug, trace};

use super::{CreateReply, JobId, JobService, ServiceFuture, StatusReply};
use crate::config::ClientConfig;
use crate::error::ServiceError;
use crate::{log_prompt, normalize_prompt};

/// Async HTTP client for the backend job service.
pub struct HttpJobService {
    client: reqwest::Client,
    base: Url,
}

impl HttpJobService {
    /// Build a client for the service at `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self, ServiceError> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            ServiceError::Request(format!("invalid base URL '{}': {e}", config.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(ServiceError::Request(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ServiceError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base })
    }

    /// The base URL requests are built from.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `<base>/api/create?prompt=<prompt>`
    pub fn create_url(&self, prompt: &str) -> Url {
        let mut url = self.endpoint(&["api", "create"]);
        url.query_pairs_mut().append_pair("prompt", prompt);
        url
    }

    /// `<base>/api/status/<id>`, with the id escaped as a single path segment.
    pub fn status_url(&self, id: &JobId) -> Url {
        self.endpoint(&["api", "status", id.as_str()])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        // `new` rejected cannot-be-a-base URLs, so segments are always available.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET `url` and return the body, mapping non-2xx to [`ServiceError::Http`].
    async fn get_text(&self, url: Url) -> Result<String, ServiceError> {
        let start = Instant::now();
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ServiceError::Request(format!("failed to read response: {e}")))?;
        debug!(
            "GET {}: HTTP {} in {:.2}s ({} bytes)",
            url.path(),
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );
        if !status.is_success() {
            return Err(ServiceError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

impl JobService for HttpJobService {
    fn create<'a>(&'a self, prompt: &'a str) -> ServiceFuture<'a, JobId> {
        async move {
            debug!(
                "Creating job for '{}' (cache key '{}')",
                log_prompt(prompt),
                log_prompt(&normalize_prompt(prompt))
            );
            let text = self.get_text(self.create_url(prompt)).await?;
            let reply: CreateReply =
                serde_json::from_str(&text).map_err(|e| ServiceError::Decode(e.to_string()))?;
            Ok(reply.call_id)
        }
        .boxed()
    }

    fn status<'a>(&'a self, id: &'a JobId) -> ServiceFuture<'a, StatusReply> {
        async move {
            let text = self.get_text(self.status_url(id)).await?;
            trace!("Status body for {id}: {} bytes", text.len());
            StatusReply::from_json(&text)
        }
        .boxed()
    }
}
