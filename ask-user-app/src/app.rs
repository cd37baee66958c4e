use ask_user_app::response::review_chips;
use ask_user_app::{
    ActiveTab, Effect, FlowVariant, FocusTarget, Key, Question, SelectionState, Session,
    SessionSnapshot, ViewMode,
};
use eframe::egui::{self, Color32, RichText, Stroke};
use tracing::debug;

use crate::sink::StdoutSink;
use crate::widgets::{
    action_button, badge, blend, card, choice_marker, ease_out_cubic, icon_slot, paint_check,
    with_alpha, Glow, Glyph, Palette,
};

/// UI intent collected while drawing, applied to the session afterwards.
enum Action {
    Select { qid: String, value: String },
    ToggleOther(String),
    OtherText { qid: String, text: String },
    ChangeTab(ActiveTab),
    Focus(usize),
    Proceed,
    Submit,
    Edit,
    Close,
}

pub struct App {
    session: Session,
    sink: StdoutSink,
    palette: Palette,
    /// One glow per focus slot of the active question (options, then Other).
    glows: Vec<Glow>,
    other_focused: bool,
    focus_other_input: bool,
    shown_tab: Option<ActiveTab>,
    entered: f32,
}

impl App {
    pub fn new(session: Session, sink: StdoutSink) -> Self {
        Self {
            session,
            sink,
            palette: Palette::default(),
            glows: Vec::new(),
            other_focused: false,
            focus_other_input: false,
            shown_tab: None,
            entered: 0.0,
        }
    }

    fn apply(&mut self, action: Action, ctx: &egui::Context) {
        let effect = match action {
            Action::Select { qid, value } => self.session.select_option(&qid, &value),
            Action::ToggleOther(qid) => {
                self.session.toggle_other(&qid);
                self.focus_other_input = self.session.answers().get(&qid).is_other_selected;
                Effect::None
            }
            Action::OtherText { qid, text } => {
                self.session.change_other_text(&qid, &text);
                Effect::None
            }
            Action::ChangeTab(tab) => {
                self.session.change_tab(tab);
                Effect::None
            }
            Action::Focus(idx) => {
                self.session.set_focus(idx);
                Effect::None
            }
            Action::Proceed => self.session.proceed(),
            Action::Submit => Effect::Submit,
            Action::Edit => {
                self.session.edit();
                Effect::None
            }
            Action::Close => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                Effect::None
            }
        };
        self.run(effect);
    }

    fn run(&mut self, effect: Effect) {
        if effect == Effect::Submit {
            self.sink.prepare(&self.session);
            if let Err(err) = self.session.submit(&mut self.sink) {
                debug!(error = %err, "submit not started");
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let was_ready = self.session.mode() == ViewMode::Ready;
        for key in pressed_keys(ctx) {
            let effect = self.session.handle_key(key, self.other_focused);
            self.run(effect);
        }
        let (enter, escape) = ctx.input(|i| {
            (i.key_pressed(egui::Key::Enter), i.key_pressed(egui::Key::Escape))
        });
        if escape || (was_ready && enter) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    /// Advances the entry animation and returns the eased opacity.
    fn fade_in(&mut self, dt: f32) -> f32 {
        self.entered = (self.entered + dt * 4.0).min(1.0);
        ease_out_cubic(self.entered)
    }

    fn glow(&self, slot: usize) -> f32 {
        self.glows.get(slot).map_or(0.0, |g| g.get())
    }

    fn title(&self, ui: &mut egui::Ui, text: &str, fade: f32) {
        ui.label(RichText::new(text).color(with_alpha(self.palette.text, fade)).size(17.0));
    }

    fn hint(&self, ui: &mut egui::Ui, text: &str) {
        ui.label(RichText::new(text).color(self.palette.text_faint).size(11.0));
    }

    fn render_tabs(&self, ui: &mut egui::Ui, snap: &SessionSnapshot, actions: &mut Vec<Action>) {
        let p = &self.palette;
        let tabs = snap
            .questions
            .iter()
            .map(|q| (ActiveTab::question(q.id()), q.tab_label()))
            .chain(std::iter::once((ActiveTab::Review, "Submit")));

        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(4.0, 4.0);
            for (i, (tab, label)) in tabs.enumerate() {
                let active = tab == snap.active_tab;
                let answered = tab
                    .question_id()
                    .is_some_and(|id| snap.answered_questions.iter().any(|a| a == id));
                let ink = if active { p.accent_bright } else { p.text_dim };

                let chip = egui::Frame::new()
                    .fill(if active { p.accent_soft } else { Color32::TRANSPARENT })
                    .stroke(Stroke::new(1.0, if active { p.accent } else { p.edge_soft }))
                    .corner_radius(6)
                    .inner_margin(egui::Margin::symmetric(8, 4))
                    .show(ui, |ui| {
                        ui.spacing_mut().item_spacing.x = 4.0;
                        ui.horizontal(|ui| {
                            if answered || tab.is_review() {
                                let center = icon_slot(ui, 10.0);
                                let tick = if answered { p.ok } else { ink };
                                paint_check(ui, center, 0.75, Stroke::new(1.5, tick));
                            }
                            ui.label(RichText::new(label).color(ink).size(11.0));
                        });
                    });

                let tab_id = ui.id().with(("tab", i));
                if ui.interact(chip.response.rect, tab_id, egui::Sense::click()).clicked() {
                    actions.push(Action::ChangeTab(tab.clone()));
                }
            }
        });
    }

    fn render_question(
        &mut self,
        ui: &mut egui::Ui,
        dt: f32,
        snap: &SessionSnapshot,
        q: &Question,
        actions: &mut Vec<Action>,
    ) {
        let fade = self.fade_in(dt);
        let selection = snap.answers.get(q.id());
        let focused = self.session.focused_target();
        self.glows.resize(q.options.len() + 1, Glow::default());

        if snap.variant == FlowVariant::Single && !q.header.is_empty() {
            badge(ui, q.header.as_str(), self.palette.accent_soft, self.palette.accent_bright);
            ui.add_space(16.0);
        }

        self.title(ui, &q.question, fade);
        if q.multi_select {
            ui.add_space(6.0);
            ui.label(
                RichText::new("Select all that apply")
                    .color(self.palette.text_faint)
                    .size(11.0)
                    .italics(),
            );
        }
        ui.add_space(18.0);

        egui::ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
            ui.spacing_mut().item_spacing.y = 6.0;
            for (i, opt) in q.options.iter().enumerate() {
                let chosen = selection.selected.contains(&opt.value);
                let has_focus = focused == Some(FocusTarget::Option(i));
                let id = ui.id().with(("opt", i));
                let hovered = ui
                    .interact(ui.cursor(), id.with("hover"), egui::Sense::hover())
                    .hovered();
                self.glows[i].step(hovered || has_focus, dt);
                let glow = self.glows[i].get();
                let p = &self.palette;

                let frame = card(p.row_fill(chosen, glow), p.row_edge(chosen || has_focus, glow));
                let row = frame.show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        choice_marker(ui, p, chosen, q.multi_select, glow);
                        ui.add_space(12.0);
                        ui.vertical(|ui| {
                            ui.spacing_mut().item_spacing.y = 2.0;
                            let ink = if chosen { p.text } else { blend(p.text_dim, p.text, glow) };
                            ui.label(RichText::new(&opt.label).color(ink).size(13.0));
                            if let Some(description) =
                                opt.description.as_deref().filter(|d| !d.is_empty())
                            {
                                ui.label(RichText::new(description).color(p.text_faint).size(11.0));
                            }
                        });
                    });
                });

                if ui.interact(row.response.rect, id, egui::Sense::click()).clicked() {
                    actions.push(Action::Focus(i));
                    actions.push(Action::Select {
                        qid: q.question.clone(),
                        value: opt.value.clone(),
                    });
                }
            }
        });

        if q.allow_other {
            ui.add_space(10.0);
            self.render_other(ui, dt, q, &selection, focused == Some(FocusTarget::Other), actions);
        }

        ui.add_space(20.0);
        self.render_question_footer(ui, snap, q, focused == Some(FocusTarget::Proceed), actions);
    }

    fn render_other(
        &mut self,
        ui: &mut egui::Ui,
        dt: f32,
        q: &Question,
        selection: &SelectionState,
        has_focus: bool,
        actions: &mut Vec<Action>,
    ) {
        let slot = q.options.len();
        let glow = self.glow(slot);
        let on = selection.is_other_selected;
        let p = &self.palette;

        let fill = if on || self.other_focused {
            blend(p.surface_active, p.accent_soft, 0.2)
        } else {
            p.row_fill(false, glow)
        };
        let edge = if on || has_focus { p.accent } else { p.row_edge(false, glow) };

        let mut text = selection.other_text.clone();
        let mut text_focused = false;
        let mut grab_focus = self.focus_other_input;
        let frame = card(fill, edge).inner_margin(egui::Margin::symmetric(14, 10)).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                choice_marker(ui, p, on, q.multi_select, glow);
                ui.add_space(12.0);
                ui.vertical(|ui| {
                    ui.spacing_mut().item_spacing.y = 4.0;
                    let ink = if on { p.text } else { p.text_dim };
                    ui.label(RichText::new("Other").color(ink).size(13.0));
                    if !on {
                        return;
                    }
                    let field = ui.add(
                        egui::TextEdit::singleline(&mut text)
                            .hint_text("Type a custom response...")
                            .desired_width(ui.available_width())
                            .text_color(p.text)
                            .frame(false),
                    );
                    if grab_focus {
                        field.request_focus();
                        grab_focus = false;
                    }
                    text_focused = field.has_focus();
                    if field.changed() {
                        actions.push(Action::OtherText {
                            qid: q.question.clone(),
                            text: text.clone(),
                        });
                    }
                });
            });
        });

        self.focus_other_input = grab_focus;
        self.other_focused = text_focused;
        self.glows[slot].step(has_focus || text_focused, dt);

        // the text field takes clicks for itself; only the label row toggles
        let rect = frame.response.rect;
        let label_row = egui::Rect::from_min_size(rect.min, egui::vec2(rect.width(), 30.0));
        let click = ui.interact(label_row, ui.id().with("other_toggle"), egui::Sense::click());
        if click.clicked() && !text_focused {
            actions.push(Action::Focus(slot));
            actions.push(Action::ToggleOther(q.question.clone()));
        }
    }

    fn render_question_footer(
        &self,
        ui: &mut egui::Ui,
        snap: &SessionSnapshot,
        q: &Question,
        has_focus: bool,
        actions: &mut Vec<Action>,
    ) {
        let p = &self.palette;
        let (hint, label, enabled) = match snap.variant {
            FlowVariant::Single => ("Enter to select", "Submit", snap.can_submit),
            FlowVariant::Multi => {
                let last = snap.questions.last().map(Question::id) == Some(q.id());
                ("Tab to switch questions", if last { "Review" } else { "Next" }, true)
            }
        };
        let colors = if enabled {
            (p.accent, p.on_accent)
        } else {
            (p.surface_hover, p.text_faint)
        };

        ui.horizontal(|ui| {
            self.hint(ui, hint);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let ring = has_focus.then_some(p.accent_bright);
                if action_button(ui, "proceed", label, Glyph::Arrow, colors, ring, enabled) {
                    actions.push(Action::Proceed);
                }
            });
        });
    }

    fn render_review(
        &mut self,
        ui: &mut egui::Ui,
        dt: f32,
        snap: &SessionSnapshot,
        actions: &mut Vec<Action>,
    ) {
        let fade = self.fade_in(dt);
        self.title(ui, "Review your answers", fade);
        ui.add_space(4.0);
        self.hint(ui, "Make sure everything looks right before submitting");
        ui.add_space(18.0);

        let p = &self.palette;
        egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
            ui.spacing_mut().item_spacing.y = 10.0;
            for (i, q) in snap.questions.iter().enumerate() {
                let parts = review_chips(q, &snap.answers.get(q.id()));
                let missing = snap.missing_required.iter().any(|id| id == q.id());
                let (fill, edge) = if missing {
                    (p.warn_soft, p.warn)
                } else {
                    (p.surface, p.edge_soft)
                };

                let row = card(fill, edge).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        badge(ui, format!("Q{}", i + 1), p.accent_soft, p.accent);
                        ui.label(RichText::new(&q.question).color(p.text_dim).size(11.0));
                        if missing {
                            ui.label(RichText::new("Required").color(p.warn).size(10.0));
                        }
                    });
                    ui.add_space(8.0);

                    if parts.is_empty() {
                        ui.label(
                            RichText::new("Not answered").color(p.text_faint).size(12.0).italics(),
                        );
                        return;
                    }
                    ui.horizontal_wrapped(|ui| {
                        ui.spacing_mut().item_spacing = egui::vec2(6.0, 6.0);
                        for part in &parts {
                            egui::Frame::new()
                                .fill(p.ok_soft)
                                .corner_radius(6)
                                .inner_margin(egui::Margin::symmetric(10, 5))
                                .show(ui, |ui| {
                                    ui.label(RichText::new(part).color(p.ok).size(12.0));
                                });
                        }
                    });
                });

                let row_id = ui.id().with(("review", i));
                if ui.interact(row.response.rect, row_id, egui::Sense::click()).clicked() {
                    actions.push(Action::ChangeTab(ActiveTab::question(q.id())));
                }
            }
        });

        if !snap.missing_required.is_empty() {
            ui.add_space(8.0);
            let note = format!(
                "Please answer required questions: {}",
                snap.missing_required.join(", ")
            );
            ui.label(RichText::new(note).color(p.warn).size(11.0));
        }

        ui.add_space(20.0);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let enabled = snap.can_submit && !snap.pending;
            let colors = if enabled {
                (p.ok, p.on_accent)
            } else {
                (p.surface_hover, p.text_faint)
            };
            if action_button(ui, "submit", "Submit", Glyph::Check, colors, None, enabled) {
                actions.push(Action::Submit);
            }
        });
    }

    fn render_ready(&self, ui: &mut egui::Ui, snap: &SessionSnapshot, actions: &mut Vec<Action>) {
        let p = &self.palette;
        ui.horizontal(|ui| badge(ui, "Ready", p.ok_soft, p.ok));
        ui.add_space(16.0);

        card(p.surface, p.edge_soft).show(ui, |ui| {
            ui.set_width(ui.available_width());
            for line in snap.preview.lines() {
                ui.label(RichText::new(line).color(p.text).size(12.0));
            }
        });

        ui.add_space(8.0);
        self.hint(ui, "Response sent. Press Enter to close, or Edit to change");
        ui.add_space(20.0);

        let button = |text: &str, ink: Color32, fill: Color32| {
            egui::Button::new(RichText::new(text).color(ink).size(12.0))
                .fill(fill)
                .stroke(Stroke::NONE)
                .min_size(egui::vec2(70.0, 38.0))
        };
        ui.horizontal(|ui| {
            if ui.add(button("Edit", p.accent_bright, Color32::TRANSPARENT)).clicked() {
                actions.push(Action::Edit);
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.add(button("Done", p.on_accent, p.ok)).clicked() {
                    actions.push(Action::Close);
                }
            });
        });
    }
}

/// Key presses this frame, in arrival order.
fn pressed_keys(ctx: &egui::Context) -> Vec<Key> {
    ctx.input(|i| {
        i.events
            .iter()
            .filter_map(|event| match event {
                egui::Event::Key { key, pressed: true, modifiers, .. } => Some(match key {
                    egui::Key::ArrowUp => Key::ArrowUp,
                    egui::Key::ArrowDown => Key::ArrowDown,
                    egui::Key::ArrowLeft => Key::ArrowLeft,
                    egui::Key::ArrowRight => Key::ArrowRight,
                    egui::Key::Enter => Key::Enter,
                    egui::Key::Space => Key::Space,
                    egui::Key::Tab if modifiers.shift => Key::BackTab,
                    egui::Key::Tab => Key::Tab,
                    _ => Key::Other,
                }),
                _ => None,
            })
            .collect()
    })
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();
        ctx.set_visuals(self.palette.visuals());

        self.handle_keys(ctx);

        let snap = self.session.snapshot();
        if self.shown_tab.as_ref() != Some(&snap.active_tab) {
            self.shown_tab = Some(snap.active_tab.clone());
            self.entered = 0.0;
            self.other_focused = false;
            self.glows.clear();
        }

        let dt = ctx.input(|i| i.stable_dt);
        let mut actions = Vec::new();
        let panel = egui::Frame::new()
            .fill(self.palette.bg)
            .inner_margin(egui::Margin::symmetric(28, 24));
        egui::CentralPanel::default().frame(panel).show(ctx, |ui| {
            if snap.mode == ViewMode::Ready {
                self.render_ready(ui, &snap, &mut actions);
                return;
            }
            if snap.variant == FlowVariant::Multi {
                self.render_tabs(ui, &snap, &mut actions);
                ui.add_space(20.0);
            }
            let question = snap
                .active_tab
                .question_id()
                .and_then(|qid| snap.questions.iter().find(|q| q.id() == qid));
            match question {
                Some(q) => self.render_question(ui, dt, &snap, q, &mut actions),
                None => self.render_review(ui, dt, &snap, &mut actions),
            }
        });

        for action in actions {
            self.apply(action, ctx);
        }
    }
}
