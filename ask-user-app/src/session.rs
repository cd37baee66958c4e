//! Session state: the question flow plus the editing/ready view switch.
//!
//! The rendering layer dispatches events here and reads [`SessionSnapshot`]
//! back; it never touches the flow or answers directly. Delivering the
//! response is the only I/O and goes through a [`ResponseSink`].

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{ConfigError, DeliveryError, SubmitError};
use crate::flow::{ActiveTab, FlowController, SelectOutcome, TabDirection};
use crate::keyboard::{
    navigate_review, FocusLayout, FocusTarget, Key, KeyboardNavigator, NavCommand, ReviewAction,
};
use crate::question::{validate_questions, FlowVariant, Question, QuestionBatch};
use crate::response::format_response;
use crate::selection::AnswerStore;
use crate::submit::missing_required;

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Editing,
    Ready,
}

/// Where the built response goes.
pub trait ResponseSink {
    fn deliver(&mut self, text: &str) -> Result<(), DeliveryError>;
}

/// Follow-up the caller should perform after an event.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// The flow is complete and the gate is open; call [`Session::submit`].
    Submit,
}

/// Read-only projection of the session for rendering.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub questions: Vec<Question>,
    pub variant: FlowVariant,
    pub active_tab: ActiveTab,
    pub answered_questions: Vec<String>,
    pub answers: AnswerStore,
    pub focused_index: usize,
    pub mode: ViewMode,
    pub pending: bool,
    pub can_submit: bool,
    pub missing_required: Vec<String>,
    pub preview: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    flow: FlowController,
    nav: KeyboardNavigator,
    mode: ViewMode,
    pending: bool,
}

impl Session {
    pub fn new(questions: Vec<Question>) -> Result<Self, ConfigError> {
        validate_questions(&questions)?;
        let mut session = Self {
            flow: FlowController::new(questions),
            nav: KeyboardNavigator::new(),
            mode: ViewMode::Editing,
            pending: false,
        };
        session.sync_navigator();
        info!(
            questions = session.flow.questions().len(),
            variant = ?session.flow.variant(),
            "session started"
        );
        Ok(session)
    }

    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Self::new(QuestionBatch::from_json(input)?.questions)
    }

    /// Replace the whole session with a new batch. An invalid batch leaves
    /// the current session untouched.
    pub fn on_questions_received(&mut self, questions: Vec<Question>) -> Result<(), ConfigError> {
        match Self::new(questions) {
            Ok(session) => {
                *self = session;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "question batch rejected");
                Err(err)
            }
        }
    }

    pub fn flow(&self) -> &FlowController {
        &self.flow
    }

    pub fn answers(&self) -> &AnswerStore {
        self.flow.answers()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn focused_index(&self) -> usize {
        self.nav.focused_index()
    }

    pub fn focused_target(&self) -> Option<FocusTarget> {
        self.keyboard_enabled()
            .then(|| self.nav.focused_target())
            .flatten()
    }

    /// Required questions without a valid answer. The single-question flow
    /// treats its only question as required.
    pub fn missing_required(&self) -> Vec<&str> {
        match self.flow.variant() {
            FlowVariant::Single => self
                .flow
                .questions()
                .iter()
                .map(Question::id)
                .filter(|id| !self.flow.answers().is_answered(id))
                .collect(),
            FlowVariant::Multi => missing_required(self.flow.questions(), self.flow.answers())
                .into_iter()
                .map(Question::id)
                .collect(),
        }
    }

    pub fn can_submit(&self) -> bool {
        self.missing_required().is_empty()
    }

    pub fn preview(&self) -> String {
        format_response(self.flow.questions(), self.flow.answers())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            questions: self.flow.questions().to_vec(),
            variant: self.flow.variant(),
            active_tab: self.flow.active_tab().clone(),
            answered_questions: self
                .flow
                .answered_questions()
                .into_iter()
                .map(str::to_string)
                .collect(),
            answers: self.flow.answers().clone(),
            focused_index: self.nav.focused_index(),
            mode: self.mode,
            pending: self.pending,
            can_submit: self.can_submit(),
            missing_required: self.missing_required().into_iter().map(str::to_string).collect(),
            preview: self.preview(),
        }
    }

    pub fn select_option(&mut self, qid: &str, value: &str) -> Effect {
        if !self.editable("select option") {
            return Effect::None;
        }
        let outcome = self.flow.select_option(qid, value);
        self.sync_navigator();
        match outcome {
            SelectOutcome::Completed if self.can_submit() => Effect::Submit,
            _ => Effect::None,
        }
    }

    pub fn toggle_other(&mut self, qid: &str) {
        if self.editable("toggle other") && self.flow.toggle_other(qid) {
            if let Some(idx) = self.nav.layout().index_of(FocusTarget::Other) {
                if self.flow.active_tab().question_id() == Some(qid) {
                    self.nav.set_focus(idx);
                }
            }
        }
    }

    pub fn change_other_text(&mut self, qid: &str, text: &str) {
        if self.editable("change other text") {
            self.flow.change_other_text(qid, text);
        }
    }

    pub fn change_tab(&mut self, target: ActiveTab) {
        if self.editable("change tab") {
            self.flow.change_tab(target);
            self.sync_navigator();
        }
    }

    pub fn cycle_tab(&mut self, direction: TabDirection) {
        if self.editable("cycle tab") {
            self.flow.cycle_tab(direction);
            self.sync_navigator();
        }
    }

    /// The panel's proceed control: next tab in the multi-question flow,
    /// submit in the single-question flow.
    pub fn proceed(&mut self) -> Effect {
        if !self.editable("proceed") {
            return Effect::None;
        }
        match self.flow.variant() {
            FlowVariant::Multi => {
                self.flow.cycle_tab(TabDirection::Next);
                self.sync_navigator();
                Effect::None
            }
            FlowVariant::Single if self.can_submit() => Effect::Submit,
            FlowVariant::Single => Effect::None,
        }
    }

    /// Hover or click focus from the rendering layer.
    pub fn set_focus(&mut self, index: usize) {
        if self.keyboard_enabled() {
            self.nav.set_focus(index);
        }
    }

    pub fn handle_key(&mut self, key: Key, text_field_focused: bool) -> Effect {
        if self.mode != ViewMode::Editing || self.pending {
            return Effect::None;
        }

        if self.flow.active_tab().is_review() {
            return match navigate_review(key) {
                ReviewAction::CycleTab(direction) => {
                    self.cycle_tab(direction);
                    Effect::None
                }
                ReviewAction::Submit if self.can_submit() => Effect::Submit,
                ReviewAction::Submit | ReviewAction::None => Effect::None,
            };
        }

        let Some(qid) = self.flow.active_question().map(|q| q.id().to_string()) else {
            return Effect::None;
        };
        match self.nav.handle_key(key, text_field_focused) {
            None => Effect::None,
            Some(NavCommand::CycleTab(direction)) => {
                self.cycle_tab(direction);
                Effect::None
            }
            Some(NavCommand::Activate(FocusTarget::Option(idx))) => {
                let value = self
                    .flow
                    .question(&qid)
                    .and_then(|q| q.options.get(idx))
                    .map(|opt| opt.value.clone());
                match value {
                    Some(value) => self.select_option(&qid, &value),
                    None => Effect::None,
                }
            }
            Some(NavCommand::Activate(FocusTarget::Other)) => {
                self.toggle_other(&qid);
                Effect::None
            }
            Some(NavCommand::Activate(FocusTarget::Proceed)) => self.proceed(),
        }
    }

    /// Validate and lock the session for delivery. Returns the payload.
    pub fn begin_submit(&mut self) -> Result<String, SubmitError> {
        if self.mode != ViewMode::Editing {
            return Err(SubmitError::NotEditing);
        }
        if self.pending {
            return Err(SubmitError::AlreadyPending);
        }
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(SubmitError::Unsatisfied {
                missing: missing.into_iter().map(str::to_string).collect(),
            });
        }
        self.pending = true;
        debug!("submit started");
        Ok(self.preview())
    }

    /// Finish a submit started with [`Session::begin_submit`]. Returns
    /// whether the session is now ready.
    pub fn complete_submit(&mut self, result: Result<(), DeliveryError>) -> bool {
        if !self.pending {
            warn!("submit completion without a pending submit ignored");
            return false;
        }
        self.pending = false;
        match result {
            Ok(()) => {
                self.mode = ViewMode::Ready;
                self.sync_navigator();
                info!("response delivered");
                true
            }
            Err(err) => {
                error!(error = %err, "failed to deliver response");
                false
            }
        }
    }

    pub fn submit(&mut self, sink: &mut impl ResponseSink) -> Result<bool, SubmitError> {
        let payload = self.begin_submit()?;
        let result = sink.deliver(&payload);
        Ok(self.complete_submit(result))
    }

    /// Back from ready to editing, keeping every answer.
    pub fn edit(&mut self) -> bool {
        if self.mode != ViewMode::Ready {
            return false;
        }
        self.mode = ViewMode::Editing;
        self.sync_navigator();
        debug!("editing resumed");
        true
    }

    fn editable(&self, event: &str) -> bool {
        let editable = self.mode == ViewMode::Editing && !self.pending;
        if !editable {
            debug!(event, mode = ?self.mode, pending = self.pending, "event ignored");
        }
        editable
    }

    fn keyboard_enabled(&self) -> bool {
        self.mode == ViewMode::Editing && !self.pending && self.flow.active_question().is_some()
    }

    fn sync_navigator(&mut self) {
        let panel = self
            .flow
            .active_question()
            .filter(|_| self.mode == ViewMode::Editing)
            .map(|q| {
                (
                    q.id().to_string(),
                    FocusLayout {
                        options: q.options.len(),
                        has_other: q.allow_other,
                        has_proceed: true,
                    },
                )
            });
        match panel {
            Some((id, layout)) => self.nav.enter_panel(&id, layout),
            None => self.nav.leave_panel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::question::fixtures::{multi, question};

    #[derive(Default)]
    struct RecordingSink {
        delivered: Vec<String>,
        fail: bool,
    }

    impl ResponseSink for RecordingSink {
        fn deliver(&mut self, text: &str) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Rejected("host unavailable".to_string()));
            }
            self.delivered.push(text.to_string());
            Ok(())
        }
    }

    fn two_questions() -> Session {
        Session::new(vec![question("Q1", &["a", "b"]), multi("Q2", &["x", "y", "z"])]).unwrap()
    }

    #[test]
    fn test_rejected_batch_keeps_prior_session() {
        let mut session = two_questions();
        let _ = session.select_option("Q1", "a");
        let before = session.snapshot();

        let err = session
            .on_questions_received(vec![question("D", &["a", "b"]), question("D", &["a", "b"])])
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateQuestion { id: "D".to_string() });
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_new_batch_discards_answers() {
        let mut session = two_questions();
        let _ = session.select_option("Q1", "a");
        session
            .on_questions_received(vec![question("N1", &["a", "b"]), question("N2", &["a", "b"])])
            .unwrap();
        assert!(session.answers().is_empty());
        assert_eq!(session.flow().active_tab(), &ActiveTab::question("N1"));
        assert_eq!(session.mode(), ViewMode::Editing);
    }

    #[test]
    fn test_answers_rebuilt_by_reloading_batch_and_replaying_events() {
        let mut session = two_questions();
        let _ = session.select_option("Q1", "b");
        session.toggle_other("Q2");
        session.change_other_text("Q2", "custom");
        let before = serde_json::to_value(session.answers()).unwrap();

        let questions = session.flow().questions().to_vec();
        session.on_questions_received(questions).unwrap();
        assert!(session.answers().is_empty());

        let _ = session.select_option("Q1", "b");
        session.toggle_other("Q2");
        session.change_other_text("Q2", "custom");
        assert_eq!(serde_json::to_value(session.answers()).unwrap(), before);
    }

    #[test]
    fn test_keyboard_pick_auto_advances_and_resets_focus() {
        let mut session = two_questions();
        assert_eq!(session.handle_key(Key::ArrowDown, false), Effect::None);
        assert_eq!(session.focused_index(), 1);
        assert_eq!(session.handle_key(Key::Enter, false), Effect::None);

        assert_eq!(session.answers().get("Q1").selected.first().map(String::as_str), Some("b"));
        assert_eq!(session.flow().active_tab(), &ActiveTab::question("Q2"));
        assert_eq!(session.focused_index(), 0);
    }

    #[test]
    fn test_keyboard_other_then_proceed() {
        let mut session = two_questions();
        // options a, b then Other then Next
        let _ = session.handle_key(Key::ArrowUp, false);
        let _ = session.handle_key(Key::ArrowUp, false);
        assert_eq!(session.focused_target(), Some(FocusTarget::Other));
        let _ = session.handle_key(Key::Space, false);
        assert!(session.answers().get("Q1").is_other_selected);
        assert_eq!(session.flow().active_tab(), &ActiveTab::question("Q1"));

        // typing in the field: arrows stay in the field
        session.change_other_text("Q1", "mine");
        let _ = session.handle_key(Key::ArrowRight, true);
        assert_eq!(session.flow().active_tab(), &ActiveTab::question("Q1"));

        let _ = session.handle_key(Key::ArrowDown, false);
        assert_eq!(session.focused_target(), Some(FocusTarget::Proceed));
        let _ = session.handle_key(Key::Enter, false);
        assert_eq!(session.flow().active_tab(), &ActiveTab::question("Q2"));
    }

    #[test]
    fn test_tab_cycles_from_text_field() {
        let mut session = two_questions();
        let _ = session.handle_key(Key::Tab, true);
        assert_eq!(session.flow().active_tab(), &ActiveTab::question("Q2"));
        let _ = session.handle_key(Key::Tab, true);
        assert_eq!(session.flow().active_tab(), &ActiveTab::Review);
        assert_eq!(session.focused_target(), None);
        let _ = session.handle_key(Key::ArrowRight, false);
        assert_eq!(session.flow().active_tab(), &ActiveTab::question("Q1"));
    }

    #[test]
    fn test_review_enter_is_gated() {
        let mut session = Session::new(vec![
            Question {
                required: true,
                ..question("A", &["x", "y"])
            },
            question("B", &["x", "y"]),
        ])
        .unwrap();
        session.change_tab(ActiveTab::Review);
        assert_eq!(session.handle_key(Key::Enter, false), Effect::None);
        assert_eq!(session.missing_required(), vec!["A"]);

        session.change_tab(ActiveTab::question("A"));
        let _ = session.select_option("A", "x");
        session.change_tab(ActiveTab::Review);
        assert_eq!(session.handle_key(Key::Enter, false), Effect::Submit);
    }

    #[test]
    fn test_submit_and_edit_round_trip() {
        let mut session = two_questions();
        let _ = session.select_option("Q1", "b");
        let _ = session.select_option("Q2", "z");
        session.toggle_other("Q2");
        session.change_other_text("Q2", "note");
        let answers = serde_json::to_string(session.answers()).unwrap();

        let mut sink = RecordingSink::default();
        assert_eq!(session.submit(&mut sink), Ok(true));
        assert_eq!(session.mode(), ViewMode::Ready);
        assert_eq!(sink.delivered, vec!["Q1 -> B\nQ2 -> Z, Other: note".to_string()]);

        // inert while ready
        let _ = session.select_option("Q2", "x");
        assert_eq!(session.handle_key(Key::Tab, false), Effect::None);
        assert_eq!(session.submit(&mut sink), Err(SubmitError::NotEditing));

        assert!(session.edit());
        assert_eq!(session.mode(), ViewMode::Editing);
        assert_eq!(serde_json::to_string(session.answers()).unwrap(), answers);
        assert_eq!(session.flow().active_tab(), &ActiveTab::question("Q2"));
        assert!(!session.edit());
    }

    #[test]
    fn test_failed_delivery_stays_editing() {
        let mut session = two_questions();
        let _ = session.select_option("Q1", "a");
        let before = session.answers().clone();

        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        assert_eq!(session.submit(&mut sink), Ok(false));
        assert_eq!(session.mode(), ViewMode::Editing);
        assert!(!session.is_pending());
        assert_eq!(session.answers(), &before);

        sink.fail = false;
        assert_eq!(session.submit(&mut sink), Ok(true));
    }

    #[test]
    fn test_pending_submit_is_single_flight() {
        let mut session = two_questions();
        let payload = session.begin_submit().unwrap();
        assert_eq!(payload, "");
        assert_eq!(session.begin_submit(), Err(SubmitError::AlreadyPending));

        let _ = session.select_option("Q1", "a");
        assert!(session.answers().is_empty());

        assert!(session.complete_submit(Ok(())));
        assert_eq!(session.mode(), ViewMode::Ready);
        assert!(!session.complete_submit(Ok(())));
    }

    #[test]
    fn test_single_question_auto_submits_on_pick() {
        let mut session = Session::new(vec![question("Only", &["a", "b"])]).unwrap();
        assert_eq!(session.snapshot().variant, FlowVariant::Single);
        assert!(!session.can_submit());
        assert_eq!(session.proceed(), Effect::None);

        assert_eq!(session.select_option("Only", "a"), Effect::Submit);
        let mut sink = RecordingSink::default();
        assert_eq!(session.submit(&mut sink), Ok(true));
        assert_eq!(sink.delivered, vec!["Only -> A".to_string()]);
    }

    #[test]
    fn test_single_question_other_needs_explicit_submit() {
        let mut session = Session::new(vec![question("Only", &["a", "b"])]).unwrap();
        session.toggle_other("Only");
        session.change_other_text("Only", "custom");
        assert_eq!(session.mode(), ViewMode::Editing);
        assert!(session.can_submit());
        assert_eq!(session.proceed(), Effect::Submit);
    }

    #[test]
    fn test_single_question_multi_select_does_not_auto_submit() {
        let mut session = Session::new(vec![multi("Only", &["a", "b"])]).unwrap();
        assert_eq!(session.select_option("Only", "a"), Effect::None);
        assert!(session.can_submit());
        assert_eq!(
            session.snapshot().active_tab,
            ActiveTab::question("Only")
        );
    }

    #[test]
    fn test_snapshot_projection() {
        let mut session = two_questions();
        let _ = session.select_option("Q1", "a");
        let snapshot = session.snapshot();
        assert_eq!(snapshot.active_tab, ActiveTab::question("Q2"));
        assert_eq!(snapshot.answered_questions, vec!["Q1".to_string()]);
        assert!(snapshot.can_submit);
        assert_eq!(snapshot.preview, "Q1 -> A");

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["activeTab"], serde_json::json!({"question": "Q2"}));
        assert_eq!(value["mode"], "editing");
    }
}
