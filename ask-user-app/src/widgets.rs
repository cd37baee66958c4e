//! Painting primitives shared by the dialog views.

use eframe::egui::{self, Color32, Margin, Pos2, RichText, Stroke, Ui};

const fn rgb(r: u8, g: u8, b: u8) -> Color32 {
    Color32::from_rgb(r, g, b)
}

/// Dark palette for the dialog.
pub struct Palette {
    pub bg: Color32,
    pub surface: Color32,
    pub surface_hover: Color32,
    pub surface_active: Color32,
    pub text: Color32,
    pub text_dim: Color32,
    pub text_faint: Color32,
    pub on_accent: Color32,
    pub accent: Color32,
    pub accent_bright: Color32,
    pub accent_soft: Color32,
    pub ok: Color32,
    pub ok_soft: Color32,
    pub warn: Color32,
    pub warn_soft: Color32,
    pub edge: Color32,
    pub edge_soft: Color32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            bg: rgb(8, 8, 12),
            surface: rgb(18, 18, 24),
            surface_hover: rgb(26, 26, 34),
            surface_active: rgb(32, 32, 44),
            text: rgb(248, 248, 252),
            text_dim: rgb(180, 180, 195),
            text_faint: rgb(100, 100, 120),
            on_accent: rgb(8, 8, 12),
            accent: rgb(99, 102, 241),
            accent_bright: rgb(129, 132, 255),
            accent_soft: rgb(55, 58, 110),
            ok: rgb(74, 222, 128),
            ok_soft: rgb(30, 70, 50),
            warn: rgb(248, 113, 113),
            warn_soft: rgb(70, 28, 32),
            edge: rgb(45, 45, 60),
            edge_soft: rgb(30, 30, 42),
        }
    }
}

impl Palette {
    pub fn visuals(&self) -> egui::Visuals {
        let mut v = egui::Visuals::dark();
        v.panel_fill = self.bg;
        v.window_fill = self.bg;
        v.widgets.noninteractive.bg_fill = self.surface;
        v.widgets.inactive.bg_fill = self.surface;
        v.widgets.hovered.bg_fill = self.surface_hover;
        v.widgets.active.bg_fill = self.accent;
        v.selection.bg_fill = self.accent.linear_multiply(0.15);
        v.selection.stroke = Stroke::new(1.0, self.accent);
        v.text_cursor.stroke = Stroke::new(2.0, self.accent);
        v
    }

    /// Surface fill for a row: tinted when chosen, otherwise eased toward hover.
    pub fn row_fill(&self, chosen: bool, hover: f32) -> Color32 {
        if chosen {
            blend(self.surface_active, self.accent_soft, 0.3)
        } else {
            blend(self.surface, self.surface_hover, hover)
        }
    }

    pub fn row_edge(&self, highlighted: bool, hover: f32) -> Color32 {
        if highlighted {
            blend(self.accent, self.accent_bright, hover)
        } else {
            blend(self.edge_soft, self.edge, hover)
        }
    }
}

/// Exponential approach toward 0 or 1, used for hover and focus glow.
#[derive(Default, Clone, Copy)]
pub struct Glow(f32);

impl Glow {
    const RATE: f32 = 12.0;

    pub fn step(&mut self, lit: bool, dt: f32) {
        let goal = if lit { 1.0 } else { 0.0 };
        self.0 += (goal - self.0) * (Self::RATE * dt).min(1.0);
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

/// Linear blend of two colors, channel by channel, `t` clamped to [0, 1].
pub fn blend(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (f32::from(x) + (f32::from(y) - f32::from(x)) * t) as u8;
    Color32::from_rgba_unmultiplied(
        mix(a.r(), b.r()),
        mix(a.g(), b.g()),
        mix(a.b(), b.b()),
        mix(a.a(), b.a()),
    )
}

pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

pub fn with_alpha(color: Color32, fade: f32) -> Color32 {
    let [r, g, b, _] = color.to_array();
    Color32::from_rgba_unmultiplied(r, g, b, (fade.clamp(0.0, 1.0) * 255.0) as u8)
}

/// Rounded container used for options, review rows and the preview.
pub fn card(fill: Color32, edge: Color32) -> egui::Frame {
    egui::Frame::new()
        .fill(fill)
        .stroke(Stroke::new(1.0, edge))
        .corner_radius(10)
        .inner_margin(Margin::symmetric(14, 12))
}

/// Small filled label, e.g. a question header or a status tag.
pub fn badge(ui: &mut Ui, text: impl Into<String>, fill: Color32, color: Color32) {
    egui::Frame::new()
        .fill(fill)
        .corner_radius(4)
        .inner_margin(Margin::symmetric(7, 2))
        .show(ui, |ui| {
            ui.label(RichText::new(text.into()).color(color).size(10.0).strong());
        });
}

fn polyline(ui: &Ui, center: Pos2, points: &[(f32, f32)], stroke: Stroke) {
    for pair in points.windows(2) {
        let a = center + egui::vec2(pair[0].0, pair[0].1);
        let b = center + egui::vec2(pair[1].0, pair[1].1);
        ui.painter().line_segment([a, b], stroke);
    }
}

pub fn paint_check(ui: &Ui, center: Pos2, scale: f32, stroke: Stroke) {
    let points = [(-4.0, 0.0), (-1.5, 3.0), (4.0, -3.0)].map(|(x, y)| (x * scale, y * scale));
    polyline(ui, center, &points, stroke);
}

pub fn paint_arrow(ui: &Ui, center: Pos2, stroke: Stroke) {
    polyline(ui, center, &[(-4.0, 0.0), (3.0, 0.0)], stroke);
    polyline(ui, center, &[(0.0, -3.0), (3.0, 0.0), (0.0, 3.0)], stroke);
}

/// Reserves a square of `side` points and returns its center.
pub fn icon_slot(ui: &mut Ui, side: f32) -> Pos2 {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(side, side), egui::Sense::hover());
    rect.center()
}

/// Radio dot or checkbox for an option row.
pub fn choice_marker(ui: &mut Ui, palette: &Palette, chosen: bool, checkbox: bool, hover: f32) {
    const SIDE: f32 = 18.0;
    let (rect, _) = ui.allocate_exact_size(egui::vec2(SIDE, SIDE), egui::Sense::hover());
    let idle = Stroke::new(1.5, blend(palette.edge, palette.text_dim, hover));
    let painter = ui.painter();

    match (checkbox, chosen) {
        (true, true) => {
            painter.rect_filled(rect.shrink(1.0), 5.0, palette.accent);
            paint_check(ui, rect.center(), 1.0, Stroke::new(2.0, palette.on_accent));
        }
        (true, false) => {
            painter.rect_stroke(rect.shrink(1.0), 5.0, idle, egui::StrokeKind::Inside);
        }
        (false, true) => {
            let r = SIDE / 2.0 - 2.0;
            painter.circle_stroke(rect.center(), r, Stroke::new(2.0, palette.accent));
            painter.circle_filled(rect.center(), r - 4.0, palette.accent);
        }
        (false, false) => {
            painter.circle_stroke(rect.center(), SIDE / 2.0 - 2.0, idle);
        }
    }
}

#[derive(Clone, Copy)]
pub enum Glyph {
    Arrow,
    Check,
}

/// Filled call-to-action button painted as a frame; returns true when clicked.
pub fn action_button(
    ui: &mut Ui,
    id: &str,
    label: &str,
    glyph: Glyph,
    (fill, ink): (Color32, Color32),
    ring: Option<Color32>,
    enabled: bool,
) -> bool {
    let frame = egui::Frame::new()
        .fill(fill)
        .stroke(ring.map_or(Stroke::NONE, |c| Stroke::new(2.0, c)))
        .corner_radius(8)
        .inner_margin(Margin::symmetric(16, 10))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(label).color(ink).size(12.0));
                ui.add_space(6.0);
                let center = icon_slot(ui, 12.0);
                match glyph {
                    Glyph::Arrow => paint_arrow(ui, center, Stroke::new(1.5, ink)),
                    Glyph::Check => paint_check(ui, center, 1.0, Stroke::new(1.8, ink)),
                }
            });
        });
    let click = ui.interact(frame.response.rect, ui.id().with(id), egui::Sense::click());
    enabled && click.clicked()
}
