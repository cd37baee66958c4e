//! Per-question answers and the store that holds them.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// The answer to one question.
///
/// `selected` keeps insertion order so the response lists picks in the order
/// they were made. `other_text` survives toggling "Other" off.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub selected: IndexSet<String>,
    pub other_text: String,
    pub is_other_selected: bool,
}

impl SelectionState {
    /// Trimmed "Other" text if it counts toward the answer.
    pub fn other_answer(&self) -> Option<&str> {
        if !self.is_other_selected {
            return None;
        }
        let text = self.other_text.trim();
        (!text.is_empty()).then_some(text)
    }

    pub fn has_valid_answer(&self) -> bool {
        !self.selected.is_empty() || self.other_answer().is_some()
    }
}

/// Question id -> answer. An absent entry is an untouched question.
///
/// Pure storage: callers keep [`SelectionState`] consistent with the
/// question's select mode before storing it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct AnswerStore {
    entries: IndexMap<String, SelectionState>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_selection(&mut self, qid: &str, selection: SelectionState) {
        self.entries.insert(qid.to_string(), selection);
    }

    /// Stored answer, or the empty state for untouched questions.
    pub fn get(&self, qid: &str) -> SelectionState {
        self.entries.get(qid).cloned().unwrap_or_default()
    }

    pub fn entry(&self, qid: &str) -> Option<&SelectionState> {
        self.entries.get(qid)
    }

    pub fn is_answered(&self, qid: &str) -> bool {
        self.entries
            .get(qid)
            .is_some_and(SelectionState::has_valid_answer)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SelectionState)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
