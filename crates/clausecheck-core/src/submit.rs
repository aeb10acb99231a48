use async_trait::async_trait;

use crate::types::{AnalysisResult, DocumentFile};

/// Shown when the service fails without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze document";

/// Shown when the request never produced a response.
pub const CONNECTIVITY_MESSAGE: &str =
    "Could not reach the analysis service. Check your connection and try again.";

/// Why a submission did not produce an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// The request never completed (connect failure, timeout, reset).
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with a non-2xx status.
    #[error("service returned {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Service {
        status: u16,
        message: Option<String>,
    },
    /// A 2xx response whose body was not a usable analysis.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl SubmissionError {
    /// Message stored as the wizard's `last_error`.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => CONNECTIVITY_MESSAGE.to_string(),
            Self::Service {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            Self::Service { .. } | Self::MalformedResponse(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            },
        }
    }
}

/// Sends one document for analysis. Implementations make exactly one attempt.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(
        &self,
        context: &str,
        file: &DocumentFile,
    ) -> Result<AnalysisResult, SubmissionError>;
}
