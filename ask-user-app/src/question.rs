//! Question definitions and batch ingestion.
//!
//! A batch is validated as a whole before any flow state is built: question
//! text doubles as the question id and must be unique, and every question
//! carries 2-4 options with distinct values.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 4;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuestionOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Question text, also the identity of the question within a batch.
    pub question: String,
    #[serde(default)]
    pub header: String,
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub multi_select: bool,
    #[serde(default = "default_allow_other")]
    pub allow_other: bool,
    #[serde(default)]
    pub required: bool,
}

fn default_allow_other() -> bool {
    true
}

impl Question {
    pub fn id(&self) -> &str {
        &self.question
    }

    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|opt| opt.value == value)
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.option(value).is_some()
    }

    /// Label shown on the tab bar; falls back to the question text.
    pub fn tab_label(&self) -> &str {
        if self.header.is_empty() {
            &self.question
        } else {
            &self.header
        }
    }
}

/// Wire shape of an incoming batch: `{ "questions": [...] }`.
#[derive(Deserialize, Debug)]
pub struct QuestionBatch {
    pub questions: Vec<Question>,
}

impl QuestionBatch {
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Single-question batches run without a review panel and submit directly
/// from the question; larger batches use tabs plus a review panel.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowVariant {
    Single,
    Multi,
}

impl FlowVariant {
    pub fn for_questions(questions: &[Question]) -> Self {
        if questions.len() == 1 {
            Self::Single
        } else {
            Self::Multi
        }
    }
}

/// Validate that a batch is well-formed before starting a flow.
pub fn validate_questions(questions: &[Question]) -> Result<(), ConfigError> {
    if questions.is_empty() {
        return Err(ConfigError::NoQuestions);
    }

    let mut seen = HashSet::new();
    for (idx, question) in questions.iter().enumerate() {
        if question.question.trim().is_empty() {
            return Err(ConfigError::EmptyQuestion { index: idx + 1 });
        }
        if !seen.insert(question.id()) {
            return Err(ConfigError::DuplicateQuestion {
                id: question.question.clone(),
            });
        }
        validate_options(question)?;
    }

    Ok(())
}

fn validate_options(question: &Question) -> Result<(), ConfigError> {
    let count = question.options.len();
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&count) {
        return Err(ConfigError::OptionCount {
            id: question.question.clone(),
            count,
        });
    }

    let mut values = HashSet::new();
    for opt in &question.options {
        if !values.insert(opt.value.as_str()) {
            return Err(ConfigError::DuplicateOptionValue {
                id: question.question.clone(),
                value: opt.value.clone(),
            });
        }
    }
    Ok(())
}
