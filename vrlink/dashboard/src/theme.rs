use eframe::egui::{self, Color32, Context, CornerRadius, Stroke, TextStyle, Visuals};
use vrlink_common::LogSeverity;

pub const ACCENT: Color32 = Color32::from_rgb(53, 132, 228);
pub const BG: Color32 = Color32::from_rgb(30, 30, 30);
pub const LIGHTER_BG: Color32 = Color32::from_rgb(36, 36, 36);
pub const DARKER_BG: Color32 = Color32::from_rgb(26, 26, 26);
pub const SEPARATOR_BG: Color32 = Color32::from_rgb(69, 69, 69);
pub const FG: Color32 = Color32::WHITE;

pub const OK_GREEN: Color32 = Color32::GREEN;
pub const KO_RED: Color32 = Color32::RED;

pub mod log_colors {
    use eframe::egui::Color32;

    pub const ERROR_LIGHT: Color32 = Color32::from_rgb(255, 50, 50);
    pub const WARNING_LIGHT: Color32 = Color32::from_rgb(205, 147, 9);
    pub const INFO_LIGHT: Color32 = Color32::from_rgb(134, 171, 241);
    pub const DEBUG_LIGHT: Color32 = Color32::LIGHT_GRAY;
}

pub fn severity_color(severity: Option<LogSeverity>) -> Color32 {
    match severity {
        Some(LogSeverity::Error) => log_colors::ERROR_LIGHT,
        Some(LogSeverity::Warning) => log_colors::WARNING_LIGHT,
        Some(LogSeverity::Info) => log_colors::INFO_LIGHT,
        Some(LogSeverity::Debug) | None => log_colors::DEBUG_LIGHT,
    }
}

pub mod graph_colors {
    use eframe::egui::Color32;

    pub const RECEIVE: Color32 = Color32::from_rgb(127, 127, 127);
    pub const RENDER: Color32 = Color32::from_rgb(214, 39, 40);
    pub const IDLE: Color32 = Color32::from_rgb(255, 127, 14);
    pub const TRANSCODE: Color32 = Color32::from_rgb(31, 119, 180);
    pub const NETWORK: Color32 = RECEIVE;

    pub const SERVER_FPS: Color32 = TRANSCODE;
    pub const CLIENT_FPS: Color32 = IDLE;
    pub const HIDDEN: Color32 = Color32::DARK_GRAY;
}

pub fn set_theme(ctx: &Context) {
    let mut style = (*ctx.style()).clone();
    style.spacing.slider_width = 200_f32; // slider width can only be set globally
    style.spacing.item_spacing = egui::vec2(15.0, 15.0);
    style.spacing.button_padding = egui::vec2(10.0, 10.0);
    if let Some(body) = style.text_styles.get_mut(&TextStyle::Body) {
        body.size = 14.0;
    }

    ctx.set_style(style);

    let mut visuals = Visuals::dark();

    let corner_radius = CornerRadius::same(10);

    visuals.widgets.active.bg_fill = ACCENT;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, FG);
    visuals.widgets.active.corner_radius = corner_radius;

    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, FG);
    visuals.widgets.inactive.corner_radius = corner_radius;

    visuals.widgets.hovered.corner_radius = corner_radius;

    visuals.widgets.open.bg_fill = SEPARATOR_BG;
    visuals.widgets.open.corner_radius = corner_radius;

    visuals.selection.bg_fill = ACCENT;
    visuals.selection.stroke = Stroke::new(1.0, FG);

    visuals.widgets.noninteractive.bg_fill = BG;
    visuals.faint_bg_color = DARKER_BG;
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, FG);
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(0.5, SEPARATOR_BG);
    visuals.widgets.noninteractive.corner_radius = corner_radius;

    ctx.set_visuals(visuals);
}
