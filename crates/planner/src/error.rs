//! Error taxonomy for the analysis pipeline

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::schema::Violation;

/// Pipeline stage a request failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Requesting,
    ParsedRaw,
    Validated,
}

/// Failure of a single completion attempt (or of the whole retry sequence)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("Completion transport error: {0}")]
    Transport(String),

    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model returned an empty response. This is usually temporary - please try again.")]
    EmptyResponse,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Completion transport error: {0}")]
    Transport(String),

    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model returned an empty response. This is usually temporary - please try again.")]
    EmptyResponse,

    #[error("Model returned malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("Invalid response format from model ({} violation(s))", .0.len())]
    SchemaViolation(Vec<Violation>),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidInput(_) => Stage::Received,
            Self::Transport(_) | Self::Timeout(_) | Self::EmptyResponse => Stage::Requesting,
            Self::MalformedJson(_) => Stage::ParsedRaw,
            Self::SchemaViolation(_) => Stage::Validated,
        }
    }

    /// Caller error rather than a generation failure
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<CompletionError> for PipelineError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::Transport(msg) => Self::Transport(msg),
            CompletionError::Timeout(d) => Self::Timeout(d),
            CompletionError::EmptyResponse => Self::EmptyResponse,
        }
    }
}

impl From<Vec<Violation>> for PipelineError {
    fn from(v: Vec<Violation>) -> Self {
        Self::SchemaViolation(v)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
