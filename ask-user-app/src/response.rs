//! Rendering answers into the text handed back to the conversation.
//!
//! One line per answered question, `"<question> -> <selections>"`, with
//! selections joined by `", "`. Unanswered questions are left out.

use serde::Serialize;

use crate::question::Question;
use crate::selection::{AnswerStore, SelectionState};

fn picked_labels(question: &Question, selection: &SelectionState) -> Vec<String> {
    selection
        .selected
        .iter()
        .filter_map(|value| question.option(value))
        .map(|opt| opt.label.clone())
        .collect()
}

/// Option labels in pick order, then `Other: <text>` when it counts.
pub fn render_selections(question: &Question, selection: &SelectionState) -> Vec<String> {
    let mut parts = picked_labels(question, selection);
    if let Some(other) = selection.other_answer() {
        parts.push(format!("Other: {other}"));
    }
    parts
}

/// Display form for the review panel: the custom text appears as typed.
pub fn review_chips(question: &Question, selection: &SelectionState) -> Vec<String> {
    let mut parts = picked_labels(question, selection);
    parts.extend(selection.other_answer().map(str::to_string));
    parts
}

pub fn format_response(questions: &[Question], store: &AnswerStore) -> String {
    questions
        .iter()
        .filter_map(|q| {
            let selection = store.entry(q.id())?;
            let parts = render_selections(q, selection);
            (!parts.is_empty()).then(|| format!("{} -> {}", q.question, parts.join(", ")))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Structured form of one answered question.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AnswerReport {
    pub question: String,
    pub header: String,
    pub selected: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

pub fn answer_reports(questions: &[Question], store: &AnswerStore) -> Vec<AnswerReport> {
    questions
        .iter()
        .filter_map(|q| {
            let selection = store.entry(q.id())?;
            if !selection.has_valid_answer() {
                return None;
            }
            Some(AnswerReport {
                question: q.question.clone(),
                header: q.header.clone(),
                selected: selection
                    .selected
                    .iter()
                    .filter_map(|value| q.option(value))
                    .map(|opt| opt.label.clone())
                    .collect(),
                other: selection.other_answer().map(str::to_string),
            })
        })
        .collect()
}
