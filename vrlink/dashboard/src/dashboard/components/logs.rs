use crate::{telemetry::LogRow, theme};
use eframe::egui::{ComboBox, Grid, RichText, ScrollArea, Ui};
use vrlink_common::LogSeverity;

pub struct LogsTab {
    min_severity: LogSeverity,
    newest_first: bool,
}

impl LogsTab {
    pub fn new() -> Self {
        Self {
            min_severity: LogSeverity::Debug,
            newest_first: true,
        }
    }

    /// Returns true if the user asked to clear the log table.
    pub fn ui<'a>(
        &mut self,
        ui: &mut Ui,
        rows: impl DoubleEndedIterator<Item = &'a LogRow>,
    ) -> bool {
        let mut clear = false;

        ui.horizontal(|ui| {
            ComboBox::from_label("Minimum level")
                .selected_text(self.min_severity.tag())
                .show_ui(ui, |ui| {
                    for severity in [
                        LogSeverity::Debug,
                        LogSeverity::Info,
                        LogSeverity::Warning,
                        LogSeverity::Error,
                    ] {
                        ui.selectable_value(&mut self.min_severity, severity, severity.tag());
                    }
                });
            ui.checkbox(&mut self.newest_first, "Newest first");
            clear = ui.button("Clear").clicked();
        });

        let rows: Box<dyn Iterator<Item = &LogRow>> = if self.newest_first {
            Box::new(rows.rev())
        } else {
            Box::new(rows)
        };

        ScrollArea::both().show(ui, |ui| {
            Grid::new("log_rows")
                .num_columns(3)
                .striped(true)
                .show(ui, |ui| {
                    // Lines with an unknown level are always shown
                    for row in rows.filter(|row| {
                        row.severity
                            .map(|severity| severity >= self.min_severity)
                            .unwrap_or(true)
                    }) {
                        let color = theme::severity_color(row.severity);
                        ui.monospace(&row.timestamp);
                        ui.label(RichText::new(&row.level_tag).monospace().color(color));
                        ui.monospace(&row.message);
                        ui.end_row();
                    }
                });
        });

        clear
    }
}
