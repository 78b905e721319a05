//! # REST Step Executor
//!
//! A plain templated HTTP request as a flow step. No dynamic schema work here:
//! the response body is parsed as JSON and recorded as the step output so later
//! steps and assertions can select into it.
use super::{ExecutorError, StepExecutor};
use crate::metadata::split_header;
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes one HTTP call as a flow step. Only `GET` and `POST` are supported.
pub struct RestExecutor {
    id: String,
    base_url: String,
    method: String,
    path: String,
    body: Option<String>,
    headers: Vec<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl RestExecutor {
    /// `base_url` is `scheme://host:port`; the request URL is `base_url`
    /// concatenated with the configured path.
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            method: "GET".to_string(),
            path: String::new(),
            body: None,
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_uri_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    /// `"Name: Value"` header strings attached to the request. Appends, so
    /// repeated calls accumulate.
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl StepExecutor for RestExecutor {
    fn identifier(&self) -> &str {
        &self.id
    }

    async fn execute(&mut self) -> Result<serde_json::Value, ExecutorError> {
        let url = format!("{}{}", self.base_url, self.path);

        let mut request = match self.method.to_uppercase().as_str() {
            "GET" => self.client.get(&url),
            "POST" => {
                let body = self.body.clone().unwrap_or_default();
                self.client.post(&url).body(body)
            }
            other => return Err(ExecutorError::UnsupportedMethod(other.to_string())),
        };

        for header in &self.headers {
            let (name, value) = split_header(header);
            request = request.header(name, value);
        }

        tracing::debug!(step = %self.id, method = %self.method, %url, "sending http request");

        let response = request.timeout(self.timeout).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ExecutorError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(ExecutorError::OutputDecode)
    }

    fn reset(&mut self) {
        // The pooled HTTP client carries no per-call state; only the body is
        // cleared so a rebuilt template starts fresh.
        self.body = None;
    }
}
