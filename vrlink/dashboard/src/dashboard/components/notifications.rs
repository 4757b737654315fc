use crate::{
    telemetry::ToastQueue,
    theme::{self, log_colors},
};
use eframe::{
    egui::{self, Frame, Label, Layout, Margin, RichText, TopBottomPanel},
    emath::Align,
    epaint::{Color32, Stroke},
};
use std::time::{Duration, Instant};
use vrlink_common::LogSeverity;

const NO_NOTIFICATIONS: &str = "No new notifications";

fn severity_colors(severity: LogSeverity) -> (Color32, Color32) {
    match severity {
        LogSeverity::Error => (Color32::BLACK, log_colors::ERROR_LIGHT),
        LogSeverity::Warning => (Color32::BLACK, log_colors::WARNING_LIGHT),
        LogSeverity::Info => (Color32::BLACK, log_colors::INFO_LIGHT),
        LogSeverity::Debug => (theme::FG, theme::LIGHTER_BG),
    }
}

pub struct NotificationBar;

impl NotificationBar {
    pub fn ui(context: &egui::Context, toasts: &mut ToastQueue, now: Instant) {
        toasts.expire(now);

        let mut dismissed = None;
        TopBottomPanel::bottom("bottom_panel")
            .frame(
                Frame::default()
                    .inner_margin(egui::vec2(10.0, 5.0))
                    .fill(theme::LIGHTER_BG)
                    .stroke(Stroke::new(1.0, theme::SEPARATOR_BG)),
            )
            .show(context, |ui| {
                if toasts.is_empty() {
                    ui.label(NO_NOTIFICATIONS);

                    return;
                }

                for (index, toast) in toasts.iter().enumerate() {
                    let (fg, bg) = severity_colors(toast.severity);

                    Frame::new().fill(bg).inner_margin(Margin::same(4)).show(ui, |ui| {
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            if ui.small_button("✖").clicked() {
                                dismissed = Some(index);
                            }
                            ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                                ui.label(RichText::new(&toast.title).strong().color(fg));
                                ui.add(
                                    Label::new(RichText::new(&toast.message).color(fg)).wrap(),
                                );
                            })
                        });
                    });
                }
            });

        if let Some(index) = dismissed {
            toasts.dismiss(index);
        }

        // Keep repainting so toasts expire without user input
        if !toasts.is_empty() {
            context.request_repaint_after(Duration::from_millis(500));
        }
    }
}
