//! Results submission: posts the answers and hands the returned document to
//! a viewer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use survey_spec::AnswerSet;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::SubmitError;
use crate::navigator::{Navigator, SubmitStart};
use crate::viewer::{Document, DocumentViewer};

/// Sends a completed answer set to whatever produces the results document.
#[async_trait]
pub trait ResultsSubmitter: Send + Sync {
    async fn submit(&self, answers: &AnswerSet) -> Result<Document, SubmitError>;
}

/// Posts answers as a JSON object to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    endpoint: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl HttpSubmitter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SubmitError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SubmitError::Transport(err.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, SubmitError> {
        Self::new(config.endpoint.clone(), config.request_timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ResultsSubmitter for HttpSubmitter {
    async fn submit(&self, answers: &AnswerSet) -> Result<Document, SubmitError> {
        debug!(endpoint = %self.endpoint, "posting answers");
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(answers.as_map())
            .send()
            .await
            .map_err(|err| SubmitError::Transport(err.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
                .and_then(|parsed| parsed.error)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| format!("Server error: {}", status.as_u16()));
            warn!(status = status.as_u16(), %message, "results service rejected answers");
            return Err(SubmitError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| SubmitError::InvalidResponse(err.to_string()))?;
        Ok(Document { content_type, body })
    }
}

/// How a submission attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The navigator refused to start (wrong step, invalid input, busy).
    NotStarted(SubmitStart),
    /// The document was fetched and shown.
    Displayed(Document),
    /// The request failed; `message` is now the navigator's error.
    Failed { message: String },
    /// The document was fetched but could not be shown.
    NotDisplayed { document: Document, message: String },
}

/// Full submission flow from the current `email` step.
///
/// The navigator stays on that step whatever the outcome.
pub async fn submit_results(
    navigator: &mut Navigator,
    submitter: &dyn ResultsSubmitter,
    viewer: &dyn DocumentViewer,
) -> SubmitOutcome {
    let answers = match navigator.begin_submit() {
        SubmitStart::Ready(answers) => answers,
        other => return SubmitOutcome::NotStarted(other),
    };

    let result = submitter.submit(&answers).await;
    let Some(document) = navigator.finish_submit(result) else {
        return SubmitOutcome::Failed {
            message: navigator.error().unwrap_or_default().to_string(),
        };
    };

    match viewer.open(&document) {
        Ok(()) => SubmitOutcome::Displayed(document),
        Err(err) => {
            navigator.report_viewer_failure(&err);
            SubmitOutcome::NotDisplayed {
                document,
                message: err.user_message().to_string(),
            }
        }
    }
}
