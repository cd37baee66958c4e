//! Question flow state machine.
//!
//! Core behaviors:
//! - A single-select pick replaces the selection, clears "Other" and advances
//!   to the next question (or the review panel after the last one).
//! - Multi-select picks toggle membership and never advance.
//! - "Other" never advances on its own; the user proceeds explicitly so the
//!   text field keeps focus.
//! - Tab cycling wraps through every question and then the review panel.
//!
//! Events naming an unknown question are ignored.

use serde::Serialize;
use tracing::{debug, warn};

use crate::question::{FlowVariant, Question};
use crate::selection::{AnswerStore, SelectionState};

/// The panel currently presented: a question (by id) or the review panel.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActiveTab {
    Question(String),
    Review,
}

impl ActiveTab {
    pub fn question(id: &str) -> Self {
        Self::Question(id.to_string())
    }

    pub fn question_id(&self) -> Option<&str> {
        match self {
            Self::Question(id) => Some(id),
            Self::Review => None,
        }
    }

    pub fn is_review(&self) -> bool {
        matches!(self, Self::Review)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabDirection {
    Next,
    Prev,
}

/// Result of an option pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Unknown question or option; nothing changed.
    Ignored,
    /// Selection updated, active tab unchanged.
    Stayed,
    /// Selection updated and the flow moved on.
    Advanced(ActiveTab),
    /// Single-question flow answered by a direct pick; ready to submit.
    Completed,
}

#[derive(Debug, Clone)]
pub struct FlowController {
    questions: Vec<Question>,
    variant: FlowVariant,
    active_tab: ActiveTab,
    answers: AnswerStore,
}

impl FlowController {
    /// Start a flow over an already validated batch with no answers.
    pub fn new(questions: Vec<Question>) -> Self {
        let variant = FlowVariant::for_questions(&questions);
        let active_tab = questions
            .first()
            .map(|q| ActiveTab::question(q.id()))
            .unwrap_or(ActiveTab::Review);
        Self {
            questions,
            variant,
            active_tab,
            answers: AnswerStore::new(),
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn variant(&self) -> FlowVariant {
        self.variant
    }

    pub fn active_tab(&self) -> &ActiveTab {
        &self.active_tab
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn question(&self, qid: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == qid)
    }

    pub fn active_question(&self) -> Option<&Question> {
        self.active_tab.question_id().and_then(|id| self.question(id))
    }

    /// Ids of answered questions, in question order.
    pub fn answered_questions(&self) -> Vec<&str> {
        self.questions
            .iter()
            .map(Question::id)
            .filter(|id| self.answers.is_answered(id))
            .collect()
    }

    /// Every tab in cycle order. The single-question flow has no review tab.
    pub fn tabs(&self) -> Vec<ActiveTab> {
        let mut tabs: Vec<ActiveTab> = self
            .questions
            .iter()
            .map(|q| ActiveTab::question(q.id()))
            .collect();
        if self.variant == FlowVariant::Multi || tabs.is_empty() {
            tabs.push(ActiveTab::Review);
        }
        tabs
    }

    pub fn select_option(&mut self, qid: &str, value: &str) -> SelectOutcome {
        let Some(question) = self.question(qid) else {
            warn!(qid, "select for unknown question ignored");
            return SelectOutcome::Ignored;
        };
        if !question.has_option(value) {
            warn!(qid, value, "select for unknown option ignored");
            return SelectOutcome::Ignored;
        }
        let multi = question.multi_select;

        let mut selection = self.answers.get(qid);
        if multi {
            if !selection.selected.shift_remove(value) {
                selection.selected.insert(value.to_string());
            }
        } else {
            selection.is_other_selected = false;
            selection.selected.clear();
            selection.selected.insert(value.to_string());
        }
        self.answers.set_selection(qid, selection);
        debug!(qid, value, multi, "option selected");

        // Only a direct pick on the panel being shown moves the flow.
        if multi || self.active_tab.question_id() != Some(qid) {
            return SelectOutcome::Stayed;
        }
        match self.variant {
            FlowVariant::Single => SelectOutcome::Completed,
            FlowVariant::Multi => {
                let next = self.following_question(qid);
                debug!(from = qid, to = ?next, "auto-advance");
                self.active_tab = next.clone();
                SelectOutcome::Advanced(next)
            }
        }
    }

    /// Flip "Other". Returns false when the event was ignored.
    pub fn toggle_other(&mut self, qid: &str) -> bool {
        let Some(question) = self.question(qid) else {
            warn!(qid, "toggle other for unknown question ignored");
            return false;
        };
        if !question.allow_other {
            warn!(qid, "toggle other on question without other ignored");
            return false;
        }
        let multi = question.multi_select;

        let mut selection = self.answers.get(qid);
        selection.is_other_selected = !selection.is_other_selected;
        if !multi && selection.is_other_selected {
            selection.selected.clear();
        }
        debug!(qid, on = selection.is_other_selected, "other toggled");
        self.answers.set_selection(qid, selection);
        true
    }

    pub fn change_other_text(&mut self, qid: &str, text: &str) -> bool {
        if self.question(qid).is_none() {
            warn!(qid, "other text for unknown question ignored");
            return false;
        }
        let mut selection = self.answers.get(qid);
        selection.other_text = text.to_string();
        self.answers.set_selection(qid, selection);
        true
    }

    /// Jump to any question or the review panel.
    pub fn change_tab(&mut self, target: ActiveTab) -> bool {
        if !self.tabs().contains(&target) {
            warn!(?target, "change to unknown tab ignored");
            return false;
        }
        debug!(from = ?self.active_tab, to = ?target, "tab changed");
        self.active_tab = target;
        true
    }

    /// Move to the neighbouring tab, wrapping at both ends.
    pub fn cycle_tab(&mut self, direction: TabDirection) -> &ActiveTab {
        let tabs = self.tabs();
        let len = tabs.len();
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0);
        let target = match direction {
            TabDirection::Next => (current + 1) % len,
            TabDirection::Prev => (current + len - 1) % len,
        };
        self.change_tab(tabs[target].clone());
        &self.active_tab
    }

    pub fn selection(&self, qid: &str) -> SelectionState {
        self.answers.get(qid)
    }

    fn following_question(&self, qid: &str) -> ActiveTab {
        self.questions
            .iter()
            .position(|q| q.id() == qid)
            .and_then(|idx| self.questions.get(idx + 1))
            .map(|q| ActiveTab::question(q.id()))
            .unwrap_or(ActiveTab::Review)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::question::fixtures::{multi, question};

    fn three_single() -> FlowController {
        FlowController::new(vec![
            question("Q1", &["a", "b"]),
            question("Q2", &["a", "b"]),
            question("Q3", &["a", "b"]),
        ])
    }

    fn values(flow: &FlowController, qid: &str) -> Vec<String> {
        flow.selection(qid).selected.into_iter().collect()
    }

    #[test]
    fn test_starts_on_first_question() {
        let flow = three_single();
        assert_eq!(flow.active_tab(), &ActiveTab::question("Q1"));
        assert!(flow.answers().is_empty());
        assert_eq!(flow.variant(), FlowVariant::Multi);
    }

    #[test]
    fn test_empty_flow_starts_on_review() {
        let flow = FlowController::new(Vec::new());
        assert_eq!(flow.active_tab(), &ActiveTab::Review);
        assert_eq!(flow.tabs(), vec![ActiveTab::Review]);
    }

    #[test]
    fn test_single_select_auto_advances_to_next_then_review() {
        let mut flow = three_single();
        assert_eq!(
            flow.select_option("Q1", "a"),
            SelectOutcome::Advanced(ActiveTab::question("Q2"))
        );
        assert_eq!(flow.active_tab(), &ActiveTab::question("Q2"));

        flow.change_tab(ActiveTab::question("Q3"));
        assert_eq!(
            flow.select_option("Q3", "b"),
            SelectOutcome::Advanced(ActiveTab::Review)
        );
        assert_eq!(flow.active_tab(), &ActiveTab::Review);
        assert_eq!(flow.answered_questions(), vec!["Q1", "Q3"]);
    }

    #[test]
    fn test_single_select_keeps_at_most_one_and_clears_other() {
        let mut flow = three_single();
        flow.toggle_other("Q1");
        flow.change_other_text("Q1", "custom");
        for value in ["a", "b", "a", "b"] {
            flow.change_tab(ActiveTab::question("Q1"));
            flow.select_option("Q1", value);
            let selection = flow.selection("Q1");
            assert!(selection.selected.len() <= 1);
            assert!(!(selection.is_other_selected && !selection.selected.is_empty()));
        }
        assert_eq!(values(&flow, "Q1"), vec!["b"]);
        assert_eq!(flow.selection("Q1").other_text, "custom");
    }

    #[test]
    fn test_multi_select_toggles_and_stays() {
        let mut flow =
            FlowController::new(vec![multi("M", &["x", "y", "z"]), question("S", &["a", "b"])]);
        assert_eq!(flow.select_option("M", "y"), SelectOutcome::Stayed);
        assert_eq!(flow.select_option("M", "x"), SelectOutcome::Stayed);
        assert_eq!(flow.active_tab(), &ActiveTab::question("M"));
        assert_eq!(values(&flow, "M"), vec!["y", "x"]);

        let before = flow.selection("M");
        flow.select_option("M", "z");
        flow.select_option("M", "z");
        assert_eq!(flow.selection("M"), before);
    }

    #[test]
    fn test_multi_select_other_is_independent() {
        let mut flow =
            FlowController::new(vec![multi("M", &["x", "y"]), question("S", &["a", "b"])]);
        flow.select_option("M", "x");
        flow.toggle_other("M");
        let selection = flow.selection("M");
        assert!(selection.is_other_selected);
        assert_eq!(values(&flow, "M"), vec!["x"]);
    }

    #[test]
    fn test_toggle_other_single_clears_selection_without_advancing() {
        let mut flow = three_single();
        flow.select_option("Q1", "a");
        flow.change_tab(ActiveTab::question("Q1"));
        assert!(flow.toggle_other("Q1"));
        assert!(flow.selection("Q1").is_other_selected);
        assert!(flow.selection("Q1").selected.is_empty());
        assert_eq!(flow.active_tab(), &ActiveTab::question("Q1"));
    }

    #[test]
    fn test_other_text_retained_across_toggle() {
        let mut flow = three_single();
        flow.toggle_other("Q1");
        flow.change_other_text("Q1", "teal");
        assert!(flow.answers().is_answered("Q1"));

        flow.toggle_other("Q1");
        assert_eq!(flow.selection("Q1").other_text, "teal");
        assert!(!flow.answers().is_answered("Q1"));

        flow.toggle_other("Q1");
        assert!(flow.answers().is_answered("Q1"));
    }

    #[test]
    fn test_other_text_blank_unmarks_unless_selected() {
        let mut flow =
            FlowController::new(vec![multi("M", &["x", "y"]), question("S", &["a", "b"])]);
        flow.toggle_other("M");
        flow.change_other_text("M", "note");
        assert!(flow.answers().is_answered("M"));
        flow.change_other_text("M", "   ");
        assert!(!flow.answers().is_answered("M"));

        flow.select_option("M", "x");
        flow.change_other_text("M", "");
        assert!(flow.answers().is_answered("M"));
    }

    #[test]
    fn test_toggle_other_ignored_when_not_allowed() {
        let mut q = question("Q", &["a", "b"]);
        q.allow_other = false;
        let mut flow = FlowController::new(vec![q, question("R", &["a", "b"])]);
        assert!(!flow.toggle_other("Q"));
        assert!(flow.answers().is_empty());
    }

    #[test]
    fn test_unknown_ids_are_no_ops() {
        let mut flow = three_single();
        assert_eq!(flow.select_option("nope", "a"), SelectOutcome::Ignored);
        assert_eq!(flow.select_option("Q1", "nope"), SelectOutcome::Ignored);
        assert!(!flow.toggle_other("nope"));
        assert!(!flow.change_other_text("nope", "x"));
        assert!(!flow.change_tab(ActiveTab::question("nope")));
        assert!(flow.answers().is_empty());
        assert_eq!(flow.active_tab(), &ActiveTab::question("Q1"));
    }

    #[test]
    fn test_pick_on_inactive_question_does_not_advance() {
        let mut flow = three_single();
        flow.change_tab(ActiveTab::question("Q3"));
        assert_eq!(flow.select_option("Q1", "a"), SelectOutcome::Stayed);
        assert_eq!(flow.active_tab(), &ActiveTab::question("Q3"));
        assert!(flow.answers().is_answered("Q1"));
    }

    #[test]
    fn test_cycle_wraps_through_review() {
        let mut flow = FlowController::new(vec![
            question("Q1", &["a", "b"]),
            question("Q2", &["a", "b"]),
        ]);
        flow.change_tab(ActiveTab::question("Q2"));
        assert_eq!(flow.cycle_tab(TabDirection::Next), &ActiveTab::Review);
        assert_eq!(flow.cycle_tab(TabDirection::Next), &ActiveTab::question("Q1"));
        assert_eq!(flow.cycle_tab(TabDirection::Prev), &ActiveTab::Review);
        assert_eq!(flow.cycle_tab(TabDirection::Prev), &ActiveTab::question("Q2"));
    }

    #[test]
    fn test_single_question_flow_completes_without_review() {
        let mut flow = FlowController::new(vec![question("Only", &["a", "b"])]);
        assert_eq!(flow.variant(), FlowVariant::Single);
        assert_eq!(flow.tabs(), vec![ActiveTab::question("Only")]);
        assert!(!flow.change_tab(ActiveTab::Review));
        assert_eq!(flow.cycle_tab(TabDirection::Next), &ActiveTab::question("Only"));

        assert_eq!(flow.select_option("Only", "b"), SelectOutcome::Completed);
        assert_eq!(flow.active_tab(), &ActiveTab::question("Only"));
    }
}
