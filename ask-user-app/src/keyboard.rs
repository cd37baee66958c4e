//! Keyboard navigation within a panel.
//!
//! Focus order on a question panel is: each option, then "Other" (when the
//! question allows it), then the proceed control. Up/Down wrap inside that
//! list; Tab and Left/Right move between tabs instead.
//!
//! While a text field has input focus only Tab/Shift+Tab are handled, so
//! normal text editing keeps working.

use crate::flow::TabDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Space,
    Tab,
    /// Shift+Tab.
    BackTab,
    Other,
}

/// What a key press means for the current panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAction {
    None,
    Focus(usize),
    Activate(usize),
    CycleTab(TabDirection),
}

/// Map a key press to an action, given the current focus and list length.
pub fn navigate(
    focus: usize,
    total_items: usize,
    key: Key,
    text_field_focused: bool,
) -> NavigationAction {
    match key {
        Key::Tab => return NavigationAction::CycleTab(TabDirection::Next),
        Key::BackTab => return NavigationAction::CycleTab(TabDirection::Prev),
        _ if text_field_focused => return NavigationAction::None,
        _ => {}
    }

    match key {
        Key::ArrowLeft => NavigationAction::CycleTab(TabDirection::Prev),
        Key::ArrowRight => NavigationAction::CycleTab(TabDirection::Next),
        Key::ArrowDown if total_items > 0 => NavigationAction::Focus((focus + 1) % total_items),
        Key::ArrowUp if total_items > 0 => {
            NavigationAction::Focus((focus % total_items + total_items - 1) % total_items)
        }
        Key::Enter | Key::Space if focus < total_items => NavigationAction::Activate(focus),
        _ => NavigationAction::None,
    }
}

/// Key handling on the review panel: tab cycling plus Enter to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    None,
    CycleTab(TabDirection),
    Submit,
}

pub fn navigate_review(key: Key) -> ReviewAction {
    match key {
        Key::Tab | Key::ArrowRight => ReviewAction::CycleTab(TabDirection::Next),
        Key::BackTab | Key::ArrowLeft => ReviewAction::CycleTab(TabDirection::Prev),
        Key::Enter => ReviewAction::Submit,
        _ => ReviewAction::None,
    }
}

/// A focusable item on a question panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Option(usize),
    Other,
    Proceed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusLayout {
    pub options: usize,
    pub has_other: bool,
    pub has_proceed: bool,
}

impl FocusLayout {
    pub fn total_items(&self) -> usize {
        self.options + usize::from(self.has_other) + usize::from(self.has_proceed)
    }

    pub fn target(&self, index: usize) -> Option<FocusTarget> {
        if index < self.options {
            return Some(FocusTarget::Option(index));
        }
        let mut slot = self.options;
        if self.has_other {
            if index == slot {
                return Some(FocusTarget::Other);
            }
            slot += 1;
        }
        (self.has_proceed && index == slot).then_some(FocusTarget::Proceed)
    }

    pub fn index_of(&self, target: FocusTarget) -> Option<usize> {
        (0..self.total_items()).find(|&idx| self.target(idx) == Some(target))
    }
}

/// Resolved key press for the owner of the navigator to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Activate(FocusTarget),
    CycleTab(TabDirection),
}

/// Focus cursor scoped to the active question panel.
#[derive(Debug, Clone, Default)]
pub struct KeyboardNavigator {
    focused_index: usize,
    panel: Option<String>,
    layout: FocusLayout,
}

impl KeyboardNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused_index(&self) -> usize {
        self.focused_index
    }

    pub fn layout(&self) -> FocusLayout {
        self.layout
    }

    pub fn focused_target(&self) -> Option<FocusTarget> {
        self.layout.target(self.focused_index)
    }

    /// Point the navigator at a panel. Focus resets when the panel or its
    /// option count changes.
    pub fn enter_panel(&mut self, panel: &str, layout: FocusLayout) {
        let same_panel = self.panel.as_deref() == Some(panel);
        if !same_panel || self.layout.options != layout.options {
            self.focused_index = 0;
        }
        self.panel = Some(panel.to_string());
        self.layout = layout;
        if self.focused_index >= layout.total_items() {
            self.focused_index = 0;
        }
    }

    /// Forget the current panel, e.g. while the review panel is shown.
    pub fn leave_panel(&mut self) {
        self.panel = None;
        self.layout = FocusLayout::default();
        self.focused_index = 0;
    }

    /// Move focus directly, e.g. on hover or click. Out-of-range is ignored.
    pub fn set_focus(&mut self, index: usize) -> bool {
        if index >= self.layout.total_items() {
            return false;
        }
        self.focused_index = index;
        true
    }

    pub fn handle_key(&mut self, key: Key, text_field_focused: bool) -> Option<NavCommand> {
        match navigate(
            self.focused_index,
            self.layout.total_items(),
            key,
            text_field_focused,
        ) {
            NavigationAction::None => None,
            NavigationAction::Focus(index) => {
                self.focused_index = index;
                None
            }
            NavigationAction::Activate(index) => {
                self.layout.target(index).map(NavCommand::Activate)
            }
            NavigationAction::CycleTab(direction) => Some(NavCommand::CycleTab(direction)),
        }
    }
}
