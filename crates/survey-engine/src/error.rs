use std::path::PathBuf;

use survey_spec::CatalogError;
use thiserror::Error;

/// Message shown when a fetched document cannot be displayed.
pub const VIEWER_BLOCKED_MESSAGE: &str = "Could not open results window. Check pop-up blocker.";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("results service answered {status}: {message}")]
    Server { status: u16, message: String },
    #[error("results service unreachable: {0}")]
    Transport(String),
    #[error("results response could not be read: {0}")]
    InvalidResponse(String),
}

impl SubmitError {
    /// Inline message surfaced in place of a validation error.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Server { message, .. } => message.clone(),
            SubmitError::Transport(detail) => format!("Connection error. ({detail})"),
            SubmitError::InvalidResponse(detail) => {
                format!("Could not read your results. ({detail})")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("viewing surface unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write document to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ViewerError {
    pub fn user_message(&self) -> &'static str {
        VIEWER_BLOCKED_MESSAGE
    }
}

/// Rejected answer mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("step '{0}' does not collect an answer")]
    NoInputKey(String),
    #[error("step '{0}' is not a choice step")]
    NotAChoice(String),
    #[error("step '{step}' has no option '{option}'")]
    UnknownOption { step: String, option: String },
    #[error("no step collects the answer '{0}'")]
    UnknownKey(String),
    #[error("the survey has no current step")]
    NoCurrentStep,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("submission error: {0}")]
    Submit(#[from] SubmitError),
    #[error("viewer error: {0}")]
    Viewer(#[from] ViewerError),
    #[error("input error: {0}")]
    Input(#[from] InputError),
}
