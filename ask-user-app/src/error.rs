//! Error types for question ingestion, submission and delivery.

use thiserror::Error;

/// A question batch that cannot start a flow. The whole batch is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid question input: {0}")]
    Parse(String),

    #[error("at least one question is required")]
    NoQuestions,

    #[error("question {index} has empty question text")]
    EmptyQuestion { index: usize },

    #[error("duplicate question '{id}': question text must be unique")]
    DuplicateQuestion { id: String },

    #[error("question '{id}' has {count} options (expected 2-4)")]
    OptionCount { id: String, count: usize },

    #[error("question '{id}' has duplicate option value '{value}'")]
    DuplicateOptionValue { id: String, value: String },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// The transport refused or failed to take the response.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to write response: {0}")]
    Io(#[from] std::io::Error),

    #[error("response rejected: {0}")]
    Rejected(String),
}

/// Why a submit request did not start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("responses can only be submitted while editing")]
    NotEditing,

    #[error("a submission is already in flight")]
    AlreadyPending,

    #[error("required questions are unanswered: {}", .missing.join(", "))]
    Unsatisfied { missing: Vec<String> },
}
