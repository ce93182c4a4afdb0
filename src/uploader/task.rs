//! Upload task contract and its implementations.

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};

use crate::config::Config;
use crate::error::{Error, Result, UploadError};
use crate::types::{Job, Outcome, SUCCESS_CODE};

/// Uploads one job and reports how it went.
///
/// Implementations are shared across workers and called concurrently, so they must
/// not keep per-call mutable state. `upload` never fails: every problem is reported
/// as a non-200 [`Outcome`].
#[async_trait::async_trait]
pub trait UploadTask: Send + Sync {
    /// Attempt to upload `job` exactly once
    async fn upload(&self, job: &Job) -> Outcome;
}

#[async_trait::async_trait]
impl<T: UploadTask + ?Sized> UploadTask for Arc<T> {
    async fn upload(&self, job: &Job) -> Outcome {
        (**self).upload(job).await
    }
}

/// Production [`UploadTask`] that POSTs each file as multipart form data.
///
/// The part is named after the file's base name. Files that are missing or
/// unreadable are reported as `404 / "not found"` without touching the network.
#[derive(Clone, Debug)]
pub struct HttpUploadTask {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl HttpUploadTask {
    /// Build the HTTP client and endpoint from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let endpoint = url::Url::parse(&config.endpoint_url).map_err(|e| {
            Error::config(
                "endpoint_url",
                format!("invalid URL '{}': {}", config.endpoint_url, e),
            )
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }

    /// Endpoint files are uploaded to
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Send one file, returning the reason phrase on 200
    async fn send(&self, job: &Job) -> std::result::Result<String, UploadError> {
        let path = job.path();
        let missing = || UploadError::LocalResourceMissing {
            path: path.to_path_buf(),
        };

        let is_file = tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(missing());
        }
        let contents = tokio::fs::read(path).await.map_err(|_| missing())?;

        let field_name = job.file_name().unwrap_or_else(|| job.to_string());
        let form = Form::new().part(
            field_name.clone(),
            Part::bytes(contents).file_name(field_name),
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        if status.as_u16() == SUCCESS_CODE {
            Ok(reason)
        } else {
            Err(UploadError::TransportFailure {
                code: status.as_u16(),
                reason,
            })
        }
    }
}

#[async_trait::async_trait]
impl UploadTask for HttpUploadTask {
    async fn upload(&self, job: &Job) -> Outcome {
        match self.send(job).await {
            Ok(reason) => Outcome::new(job.clone(), SUCCESS_CODE, reason),
            Err(e) => {
                tracing::debug!(job = %job, error = %e, "Upload attempt failed");
                Outcome::from_error(job.clone(), &e)
            }
        }
    }
}

/// A substring rule of a [`ScriptedUploadTask`]
#[derive(Clone, Debug)]
struct ScriptRule {
    pattern: String,
    code: u16,
    reason: String,
}

/// Deterministic [`UploadTask`] with no I/O, for tests and dry runs.
///
/// Each job's path is matched against substring rules in insertion order; the first
/// match decides the outcome, otherwise the default (`200 / "OK"`) applies.
///
/// ```
/// use batch_uploader::uploader::ScriptedUploadTask;
///
/// let task = ScriptedUploadTask::new()
///     .rule("7", 403, "Forbidden")
///     .rule("9", 404, "Not Found");
/// ```
#[derive(Clone, Debug)]
pub struct ScriptedUploadTask {
    rules: Vec<ScriptRule>,
    default_code: u16,
    default_reason: String,
    delay: Option<Duration>,
}

impl Default for ScriptedUploadTask {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_code: SUCCESS_CODE,
            default_reason: "OK".to_string(),
            delay: None,
        }
    }
}

impl ScriptedUploadTask {
    /// A task that accepts every job
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `code`/`reason` for jobs whose path contains `pattern`
    #[must_use]
    pub fn rule(mut self, pattern: impl Into<String>, code: u16, reason: impl Into<String>) -> Self {
        self.rules.push(ScriptRule {
            pattern: pattern.into(),
            code,
            reason: reason.into(),
        });
        self
    }

    /// Outcome for jobs no rule matches
    #[must_use]
    pub fn with_default(mut self, code: u16, reason: impl Into<String>) -> Self {
        self.default_code = code;
        self.default_reason = reason.into();
        self
    }

    /// Sleep this long before answering, to emulate transfer time
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn resolve(&self, job: &Job) -> (u16, &str) {
        let path = job.to_string();
        self.rules
            .iter()
            .find(|rule| path.contains(&rule.pattern))
            .map(|rule| (rule.code, rule.reason.as_str()))
            .unwrap_or((self.default_code, self.default_reason.as_str()))
    }
}

#[async_trait::async_trait]
impl UploadTask for ScriptedUploadTask {
    async fn upload(&self, job: &Job) -> Outcome {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let (code, reason) = self.resolve(job);
        Outcome::new(job.clone(), code, reason)
    }
}
