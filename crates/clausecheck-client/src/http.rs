use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clausecheck_core::{
    config::Config,
    submit::{SubmissionError, Submitter},
    types::{AnalysisResult, DocumentFile, HealthStatus},
};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{info, warn};

/// Upper bound on the startup health check, independent of the analysis timeout.
pub const HEALTH_TIMEOUT_S: u64 = 5;

/// Submits documents to the analysis service over HTTP.
///
/// One POST per call, no retries. The base URL is fixed at construction.
#[derive(Clone)]
pub struct HttpSubmitter {
    base_url: String,
    timeout_secs: u64,
    http: reqwest::Client,
}

impl HttpSubmitter {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::build(
            base_url.into(),
            clausecheck_core::config::DEFAULT_REQUEST_TIMEOUT_S,
        )
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(config.api_url.clone(), config.request_timeout_s)
    }

    pub fn with_timeout(self, secs: u64) -> Result<Self> {
        Self::build(self.base_url, secs)
    }

    fn build(base_url: String, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.min(HEALTH_TIMEOUT_S))
    }

    /// Check `GET /api/health`. Gives up after [`HEALTH_TIMEOUT_S`] at most.
    pub async fn health(&self) -> Result<HealthStatus> {
        let resp = self
            .http
            .get(format!("{}/api/health", self.base_url))
            .timeout(self.health_timeout())
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    fn form(context: &str, file: &DocumentFile) -> Result<Form, SubmissionError> {
        let part = Part::stream_with_length(file.bytes().clone(), file.size())
            .file_name(file.name().to_string())
            .mime_str(file.mime_type())
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;
        Ok(Form::new()
            .text("context", context.to_string())
            .part("file", part))
    }
}

/// Pull the service's `error` string out of a failure body, if there is one.
fn service_error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v["error"]
        .as_str()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Interpret a 2xx body. The `analysis` object is converted leniently;
/// a body without one is malformed.
fn parse_success_body(body: &str) -> Result<AnalysisResult, SubmissionError> {
    let v: Value = serde_json::from_str(body)
        .map_err(|e| SubmissionError::MalformedResponse(format!("invalid JSON: {e}")))?;
    match &v["analysis"] {
        analysis @ Value::Object(_) => Ok(AnalysisResult::from_value(analysis)),
        Value::Null => Err(SubmissionError::MalformedResponse(
            "response has no analysis".into(),
        )),
        other => Err(SubmissionError::MalformedResponse(format!(
            "analysis is not an object: {other}"
        ))),
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(
        &self,
        context: &str,
        file: &DocumentFile,
    ) -> Result<AnalysisResult, SubmissionError> {
        let url = format!("{}/api/analyze", self.base_url);
        info!(
            url = %url,
            file = %file.name(),
            bytes = file.size(),
            "submitting document for analysis"
        );

        let form = Self::form(context, file)?;
        let response = match self.http.post(&url).multipart(form).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!(timeout_secs = self.timeout_secs, "analysis request timed out");
                return Err(SubmissionError::Transport(format!(
                    "timed out after {}s",
                    self.timeout_secs
                )));
            },
            Err(e) => {
                warn!("analysis request failed: {}", e);
                return Err(SubmissionError::Transport(e.to_string()));
            },
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!(status = %status, "failed to read analysis response: {}", e);
                return Err(SubmissionError::Transport(e.to_string()));
            },
        };

        if !status.is_success() {
            let message = service_error_message(&body);
            warn!(
                status = %status,
                message = message.as_deref().unwrap_or(""),
                "analysis service returned an error"
            );
            return Err(SubmissionError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let result = parse_success_body(&body).inspect_err(|e| {
            warn!(status = %status, "unusable analysis response: {}", e);
        })?;
        info!(
            flagged = result.flagged_clauses.len(),
            mismatch = result.context_match_warning.is_some(),
            "analysis response received"
        );
        Ok(result)
    }
}
