use crate::{
    graph::{
        widen_scale, LatencyBand, RollingWindowGraph, StatisticsTimeline, TimelineState,
        CLIENT_FPS_SERIES, SERVER_FPS_SERIES,
    },
    theme::{self, graph_colors},
};
use eframe::egui::{
    emath, pos2, vec2, Align2, Color32, CornerRadius, FontId, Frame, Grid, Label, Pos2, Rect,
    RichText, Sense, Shape, Stroke, Ui,
};
use serde_json as json;
use vrlink_events::{GraphStatistics, Statistics};

const LATENCY_COLORS: [Color32; 7] = [
    graph_colors::RECEIVE,
    graph_colors::RENDER,
    graph_colors::IDLE,
    graph_colors::TRANSCODE,
    graph_colors::NETWORK,
    graph_colors::TRANSCODE,
    graph_colors::IDLE,
];
const FPS_SERIES: [(usize, &str, Color32); 2] = [
    (SERVER_FPS_SERIES, "Streamer FPS", graph_colors::SERVER_FPS),
    (CLIENT_FPS_SERIES, "Client FPS", graph_colors::CLIENT_FPS),
];

pub fn now_ms() -> f64 {
    chrono::Local::now().timestamp_millis() as f64
}

fn legend(ui: &mut Ui, graph: &mut RollingWindowGraph, entries: &[(usize, &str, Color32)]) {
    ui.horizontal(|ui| {
        for (index, text, color) in entries {
            let color = if graph.is_visible(*index) {
                *color
            } else {
                graph_colors::HIDDEN
            };

            if ui
                .add(Label::new(RichText::new(*text).size(10.0).color(color)).sense(Sense::click()))
                .on_hover_text("Click to show or hide")
                .clicked()
            {
                graph.toggle(*index);
            }
        }
    });
}

fn axis_labels(ui: &Ui, to_screen: &emath::RectTransform, (min, max): (f64, f64)) {
    ui.painter().text(
        to_screen * pos2(0.0, min as f32),
        Align2::LEFT_BOTTOM,
        format!("{min:.0}"),
        FontId::monospace(14.0),
        Color32::GRAY,
    );
    ui.painter().text(
        to_screen * pos2(0.0, max as f32),
        Align2::LEFT_TOP,
        format!("{max:.0}"),
        FontId::monospace(14.0),
        Color32::GRAY,
    );
}

pub struct StatisticsTab {
    timeline: StatisticsTimeline,
    last_statistics: Option<Statistics>,
    last_graph_statistics: Option<GraphStatistics>,
}

impl StatisticsTab {
    pub fn new() -> Self {
        Self {
            timeline: StatisticsTimeline::new(now_ms()),
            last_statistics: None,
            last_graph_statistics: None,
        }
    }

    pub fn update_statistics(&mut self, statistics: Statistics) {
        self.last_statistics = Some(statistics);
    }

    pub fn update_graph_statistics(&mut self, statistics: GraphStatistics) {
        self.timeline.push_sample(&statistics, now_ms());
        self.last_graph_statistics = Some(statistics);
    }

    /// Advance the graph timer. Called every frame whichever tab is shown. Returns true while
    /// samples are flowing.
    pub fn tick(&mut self) -> bool {
        self.tick_at(now_ms())
    }

    fn tick_at(&mut self, now_ms: f64) -> bool {
        self.timeline.tick(now_ms);

        self.timeline.state() == TimelineState::Active
    }

    pub fn ui(&mut self, ui: &mut Ui, streaming: bool) {
        ui.vertical(|ui| {
            let available_width = ui.available_width();
            self.draw_latency_graph(ui, available_width);
            self.draw_fps_graph(ui, available_width);
            self.draw_statistics_overview(ui, streaming);
        });
    }

    fn x_transform(&self, rect: Rect, scale: (f64, f64)) -> emath::RectTransform {
        let (x_min, x_max) = self.timeline.x_range();
        let (min, max) = widen_scale(scale);

        emath::RectTransform::from_to(
            Rect::from_x_y_ranges(0.0..=(x_max - x_min) as f32, max as f32..=min as f32),
            rect,
        )
    }

    fn draw_latency_graph(&mut self, ui: &mut Ui, available_width: f32) {
        ui.add_space(10.0);
        ui.label(RichText::new("Latency (ms)").size(20.0));

        let scale = self.timeline.latency_scale();
        let (x_min, _) = self.timeline.x_range();

        let canvas_response = Frame::canvas(ui.style())
            .show(ui, |ui| {
                let (_, rect) = ui.allocate_space(available_width * vec2(1.0, 0.2));
                let to_screen = self.x_transform(rect, scale);
                let painter = ui.painter_at(rect);

                let timestamps = self.timeline.latency.timestamps().collect::<Vec<_>>();
                let mut lower = vec![0.0; timestamps.len()];
                for stacked in self.timeline.latency.stacked() {
                    let color = LATENCY_COLORS[stacked.index % LATENCY_COLORS.len()];

                    for (idx, value) in stacked.values.iter().enumerate() {
                        let (Some(value), Some(next_timestamp)) = (value, timestamps.get(idx + 1))
                        else {
                            continue;
                        };
                        if timestamps[idx] < x_min {
                            lower[idx] = *value;
                            continue;
                        }

                        painter.rect_filled(
                            Rect::from_two_pos(
                                to_screen * pos2((timestamps[idx] - x_min) as f32, *value as f32),
                                to_screen
                                    * pos2((next_timestamp - x_min) as f32, lower[idx] as f32),
                            ),
                            CornerRadius::ZERO,
                            color,
                        );
                        lower[idx] = *value;
                    }
                }

                axis_labels(ui, &to_screen, scale);
            })
            .response;

        if let Some(stats) = &self.last_graph_statistics {
            canvas_response.on_hover_ui(|ui| {
                let value = |value: Option<f64>| {
                    value
                        .map(|value| format!("{value:.2}ms"))
                        .unwrap_or_else(|| "-".into())
                };

                ui.label(format!("Total latency: {}", value(stats.total_latency_ms)));
                for (band, (measure, color)) in LatencyBand::ALL.iter().zip([
                    (stats.receive_ms, LATENCY_COLORS[0]),
                    (stats.render_ms, LATENCY_COLORS[1]),
                    (stats.idle_ms, LATENCY_COLORS[2]),
                    (stats.encode_ms, LATENCY_COLORS[3]),
                    (stats.send_ms, LATENCY_COLORS[4]),
                    (stats.decode_ms, LATENCY_COLORS[5]),
                    (stats.client_idle_ms, LATENCY_COLORS[6]),
                ]) {
                    ui.colored_label(color, format!("{}: {}", band.label(), value(measure)));
                }
            });
        }

        let entries = LatencyBand::ALL
            .iter()
            .enumerate()
            .map(|(index, band)| (index, band.label(), LATENCY_COLORS[index]))
            .collect::<Vec<_>>();
        legend(ui, &mut self.timeline.latency, &entries);
    }

    fn draw_fps_graph(&mut self, ui: &mut Ui, available_width: f32) {
        ui.add_space(10.0);
        ui.label(RichText::new("FPS").size(20.0));

        let scale = self.timeline.fps_scale();
        let (x_min, _) = self.timeline.x_range();

        let canvas_response = Frame::canvas(ui.style())
            .show(ui, |ui| {
                let (_, rect) = ui.allocate_space(available_width * vec2(1.0, 0.2));
                let to_screen = self.x_transform(rect, scale);
                let painter = ui.painter_at(rect);

                let graph = &self.timeline.framerate;
                for (index, _, color) in FPS_SERIES {
                    let Some(series) = graph.series(index).filter(|_| graph.is_visible(index))
                    else {
                        continue;
                    };

                    // Gaps split the line
                    let mut segment: Vec<Pos2> = vec![];
                    for (timestamp, value) in graph.timestamps().zip(series.iter()) {
                        match value.filter(|_| timestamp >= x_min) {
                            Some(value) => segment
                                .push(to_screen * pos2((timestamp - x_min) as f32, value as f32)),
                            None if segment.len() > 1 => {
                                painter.add(Shape::line(
                                    std::mem::take(&mut segment),
                                    Stroke::new(1.0, color),
                                ));
                            }
                            None => segment.clear(),
                        }
                    }
                    if segment.len() > 1 {
                        painter.add(Shape::line(segment, Stroke::new(1.0, color)));
                    }
                }

                axis_labels(ui, &to_screen, scale);
            })
            .response;

        if let Some(stats) = &self.last_graph_statistics {
            canvas_response.on_hover_ui(|ui| {
                for (fps, (_, label, color)) in [stats.server_fps, stats.client_fps]
                    .into_iter()
                    .zip(FPS_SERIES)
                {
                    ui.colored_label(color, format!("{label}: {:.2}", fps.unwrap_or_default()));
                }
            });
        }

        legend(ui, &mut self.timeline.framerate, &FPS_SERIES);
    }

    fn draw_statistics_overview(&self, ui: &mut Ui, streaming: bool) {
        ui.add_space(10.0);
        ui.horizontal(|ui| {
            ui.label(RichText::new("Statistics").size(20.0));
            if streaming {
                ui.colored_label(theme::OK_GREEN, "● Streaming");
            } else {
                ui.colored_label(theme::KO_RED, "● Not streaming");
            }
        });

        let Some(statistics) = &self.last_statistics else {
            ui.label("No statistics received yet");
            return;
        };

        Grid::new("statistics_overview")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (key, value) in &statistics.0 {
                    ui.label(key);
                    ui.label(match value {
                        json::Value::String(text) => text.clone(),
                        json::Value::Number(number) => match number.as_f64() {
                            Some(number) if number.fract() != 0.0 => format!("{number:.2}"),
                            _ => number.to_string(),
                        },
                        other => other.to_string(),
                    });
                    ui.end_row();
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_framerate_maps_inside_the_canvas() {
        let mut tab = StatisticsTab::new();
        tab.timeline = StatisticsTimeline::new(0.0);

        let mut now = 1000.0;
        for _ in 0..100 {
            now += 50.0;
            tab.timeline.push_sample(
                &GraphStatistics {
                    timestamp_ms: now,
                    client_fps: Some(72.0),
                    server_fps: Some(72.0),
                    ..Default::default()
                },
                now,
            );
        }
        tab.timeline.tick(now + 40.0);

        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 100.0));
        let point = tab.x_transform(rect, tab.timeline.fps_scale()) * pos2(100.0, 72.0);
        assert!(point.y.is_finite());
        assert!(rect.contains(point));

        // A degenerate range passed directly is widened too
        let point = tab.x_transform(rect, (72.0, 72.0)) * pos2(100.0, 72.0);
        assert!(point.y.is_finite());
    }

    #[test]
    fn timer_goes_idle_without_samples() {
        let mut tab = StatisticsTab::new();
        tab.timeline = StatisticsTimeline::new(0.0);

        let sample = |timestamp_ms| GraphStatistics {
            timestamp_ms,
            ..Default::default()
        };

        tab.timeline.push_sample(&sample(1000.0), 1000.0);
        assert!(tab.tick_at(1100.0));
        assert!(!tab.tick_at(2500.0));

        // The next run of samples starts after a gap
        tab.timeline.push_sample(&sample(3000.0), 3000.0);
        let timestamps = tab.timeline.latency.timestamps().collect::<Vec<_>>();
        assert_eq!(timestamps[timestamps.len() - 2], 2980.0);
    }
}
