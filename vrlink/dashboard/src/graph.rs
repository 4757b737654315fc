use std::collections::VecDeque;
use vrlink_events::GraphStatistics;

pub const REDRAW_INTERVAL_MS: f64 = 32.0;
pub const GAP_PADDING_MS: f64 = 100.0;
pub const GAP_OFFSET_MS: f64 = 20.0;
pub const STALE_TIMEOUT_MS: f64 = 1000.0;
pub const WINDOW_MS: f64 = 10_000.0;
pub const HISTORY_LENGTH: usize = 1200;

pub const INITIAL_LATENCY_SCALE: (f64, f64) = (0.0, 50.0);
pub const INITIAL_FPS_SCALE: (f64, f64) = (0.0, 120.0);
// Smallest vertical span of a graph, constant series would collapse it otherwise
pub const MIN_SCALE_SPAN: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LatencyBand {
    Receive,
    Render,
    Idle,
    Encode,
    Send,
    Decode,
    ClientIdle,
}

impl LatencyBand {
    pub const ALL: [LatencyBand; 7] = [
        LatencyBand::Receive,
        LatencyBand::Render,
        LatencyBand::Idle,
        LatencyBand::Encode,
        LatencyBand::Send,
        LatencyBand::Decode,
        LatencyBand::ClientIdle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LatencyBand::Receive => "Receive",
            LatencyBand::Render => "Render",
            LatencyBand::Idle => "Idle",
            LatencyBand::Encode => "Encode",
            LatencyBand::Send => "Send",
            LatencyBand::Decode => "Decode",
            LatencyBand::ClientIdle => "Client idle",
        }
    }
}

pub const SERVER_FPS_SERIES: usize = 0;
pub const CLIENT_FPS_SERIES: usize = 1;

/// Fixed capacity buffer. Pushing evicts the oldest value.
#[derive(Clone, Debug)]
pub struct RollingSeriesBuffer {
    values: VecDeque<Option<f64>>,
}

impl RollingSeriesBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![None; capacity].into(),
        }
    }

    pub fn push(&mut self, value: Option<f64>) {
        self.values.pop_front();
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.values.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Option<f64>> {
        self.values.iter().copied().collect()
    }
}

/// Series that share one timestamp buffer. Every append pushes exactly one value per series.
pub struct RollingWindowGraph {
    timestamps: VecDeque<f64>,
    series: Vec<RollingSeriesBuffer>,
    visible: Vec<bool>,
}

impl RollingWindowGraph {
    pub fn new(series_count: usize, length: usize, now_ms: f64) -> Self {
        Self {
            timestamps: vec![now_ms - WINDOW_MS; length].into(),
            series: vec![RollingSeriesBuffer::new(length); series_count],
            visible: vec![true; series_count],
        }
    }

    /// `None` appends a gap to every series.
    pub fn append(&mut self, timestamp_ms: f64, values: Option<&[Option<f64>]>) {
        self.timestamps.pop_front();
        self.timestamps.push_back(timestamp_ms);

        for (idx, series) in self.series.iter_mut().enumerate() {
            series.push(values.and_then(|values| values.get(idx).copied().flatten()));
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.timestamps.iter().copied()
    }

    pub fn series(&self, index: usize) -> Option<&RollingSeriesBuffer> {
        self.series.get(index)
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) {
        if let Some(flag) = self.visible.get_mut(index) {
            *flag = visible;
        }
    }

    pub fn toggle(&mut self, index: usize) {
        let visible = self.is_visible(index);
        self.set_visible(index, !visible);
    }

    /// Cumulative values over the visible series, recomputed from raw values.
    pub fn stacked(&self) -> Vec<StackedSeries> {
        let raw = self.series.iter().map(|s| s.to_vec()).collect::<Vec<_>>();

        stack(&raw, |idx| !self.is_visible(idx))
    }

    /// Values of a series inside the window, skipping gaps and zeros.
    pub fn window_values(&self, index: usize, since_ms: f64) -> Vec<f64> {
        let Some(series) = self.series.get(index) else {
            return vec![];
        };

        window_values(&self.timestamps, series, since_ms)
    }
}

fn window_values(
    timestamps: &VecDeque<f64>,
    series: &RollingSeriesBuffer,
    since_ms: f64,
) -> Vec<f64> {
    timestamps
        .iter()
        .zip(series.iter())
        .filter(|(timestamp, _)| **timestamp > since_ms)
        .filter_map(|(_, value)| value)
        .filter(|value| value.is_finite() && *value != 0.0)
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct StackedSeries {
    pub index: usize,
    pub values: Vec<Option<f64>>,
}

/// Stack series on top of each other, skipping the omitted ones. Gaps stay gaps and do not
/// contribute to the layers above.
pub fn stack(series: &[Vec<Option<f64>>], omit: impl Fn(usize) -> bool) -> Vec<StackedSeries> {
    let len = series.iter().map(Vec::len).max().unwrap_or(0);
    let mut accum = vec![0.0; len];

    series
        .iter()
        .enumerate()
        .filter(|(idx, _)| !omit(*idx))
        .map(|(index, values)| StackedSeries {
            index,
            values: values
                .iter()
                .zip(accum.iter_mut())
                .map(|(value, accum)| {
                    value.map(|value| {
                        *accum += value;
                        *accum
                    })
                })
                .collect(),
        })
        .collect()
}

/// Quantile with linear interpolation between the two closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64))
}

pub fn widen_scale((min, max): (f64, f64)) -> (f64, f64) {
    if max - min < MIN_SCALE_SPAN {
        let center = (min + max) / 2.0;
        (center - MIN_SCALE_SPAN / 2.0, center + MIN_SCALE_SPAN / 2.0)
    } else {
        (min, max)
    }
}

fn quartiles(values: &[f64]) -> Option<(f64, f64)> {
    Some((quantile(values, 0.25)?, quantile(values, 0.75)?))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelineState {
    Idle,
    Active,
}

/// Feeds the latency and framerate graphs. Samples may arrive at any rate, redraws are throttled
/// and gaps are inserted when samples stop.
pub struct StatisticsTimeline {
    pub latency: RollingWindowGraph,
    pub total_latency: RollingSeriesBuffer,
    pub framerate: RollingWindowGraph,
    state: TimelineState,
    gap_padded: bool,
    last_statistics_update_ms: f64,
    last_graph_update_ms: f64,
    last_redraw_ms: f64,
    latency_scale: (f64, f64),
    fps_scale: (f64, f64),
    x_range: (f64, f64),
}

impl StatisticsTimeline {
    pub fn new(now_ms: f64) -> Self {
        Self {
            latency: RollingWindowGraph::new(LatencyBand::ALL.len(), HISTORY_LENGTH, now_ms),
            total_latency: RollingSeriesBuffer::new(HISTORY_LENGTH),
            framerate: RollingWindowGraph::new(2, HISTORY_LENGTH, now_ms),
            state: TimelineState::Idle,
            gap_padded: true,
            last_statistics_update_ms: now_ms,
            last_graph_update_ms: now_ms,
            last_redraw_ms: now_ms,
            latency_scale: INITIAL_LATENCY_SCALE,
            fps_scale: INITIAL_FPS_SCALE,
            x_range: (now_ms - WINDOW_MS, now_ms),
        }
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn latency_scale(&self) -> (f64, f64) {
        self.latency_scale
    }

    pub fn fps_scale(&self) -> (f64, f64) {
        self.fps_scale
    }

    pub fn x_range(&self) -> (f64, f64) {
        self.x_range
    }

    pub fn push_sample(&mut self, sample: &GraphStatistics, now_ms: f64) {
        self.last_statistics_update_ms = now_ms;
        self.gap_padded = false;

        if self.state == TimelineState::Idle {
            // Separate the new run of samples from the previous one
            self.append_gap(now_ms - GAP_OFFSET_MS, now_ms);
            self.state = TimelineState::Active;
        }

        self.append(sample, now_ms);
        self.redraw(now_ms);
    }

    /// Called on every frame. Returns true if the graphs were redrawn.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        if self.state == TimelineState::Idle {
            return false;
        }

        if now_ms - STALE_TIMEOUT_MS >= self.last_statistics_update_ms {
            self.state = TimelineState::Idle;
            return false;
        }

        if now_ms - REDRAW_INTERVAL_MS <= self.last_redraw_ms {
            return false;
        }

        if now_ms - GAP_PADDING_MS > self.last_graph_update_ms && !self.gap_padded {
            self.gap_padded = true;
            self.append_gap(self.last_graph_update_ms + GAP_OFFSET_MS, now_ms);
        }

        self.redraw(now_ms)
    }

    fn append(&mut self, sample: &GraphStatistics, now_ms: f64) {
        let total = sample.total_latency_ms.filter(|total| total.is_finite());

        if total.is_some() {
            let idle = match (sample.idle_ms, sample.wait_ms) {
                (Some(idle), Some(wait)) => Some(idle + wait),
                (idle, wait) => idle.or(wait),
            };
            let bands = [
                sample.receive_ms,
                sample.render_ms,
                idle,
                sample.encode_ms,
                sample.send_ms,
                sample.decode_ms,
                sample.client_idle_ms,
            ];
            self.latency.append(sample.timestamp_ms, Some(&bands));
        } else {
            self.latency.append(sample.timestamp_ms, None);
        }
        self.total_latency.push(total);

        let mut fps = [None; 2];
        fps[SERVER_FPS_SERIES] = sample.server_fps;
        fps[CLIENT_FPS_SERIES] = sample.client_fps;
        self.framerate.append(sample.timestamp_ms, Some(&fps));

        self.last_graph_update_ms = now_ms;
    }

    fn append_gap(&mut self, timestamp_ms: f64, now_ms: f64) {
        self.latency.append(timestamp_ms, None);
        self.total_latency.push(None);
        self.framerate.append(timestamp_ms, None);

        self.last_graph_update_ms = now_ms;
    }

    fn redraw(&mut self, now_ms: f64) -> bool {
        if now_ms <= self.last_redraw_ms + REDRAW_INTERVAL_MS {
            return false;
        }

        let since_ms = now_ms - WINDOW_MS;
        self.x_range = (since_ms, now_ms);

        let total_values = window_values(&self.latency.timestamps, &self.total_latency, since_ms);
        if let Some((q1, q3)) = quartiles(&total_values) {
            self.latency_scale = (0.0, (q3 + (q3 - q1) * 3.0).max(MIN_SCALE_SPAN));
        }

        let mut fps_values = self.framerate.window_values(SERVER_FPS_SERIES, since_ms);
        fps_values.extend(self.framerate.window_values(CLIENT_FPS_SERIES, since_ms));
        if let Some((q1, q3)) = quartiles(&fps_values) {
            let iqr = q3 - q1;
            self.fps_scale = widen_scale((q1 - iqr * 1.5, q3 + iqr * 1.5));
        }

        self.last_redraw_ms = now_ms;

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp_ms: f64, total: f64, fps: f64) -> GraphStatistics {
        GraphStatistics {
            timestamp_ms,
            total_latency_ms: Some(total),
            receive_ms: Some(1.0),
            render_ms: Some(2.0),
            idle_ms: Some(1.0),
            wait_ms: Some(0.5),
            encode_ms: Some(3.0),
            send_ms: Some(1.0),
            decode_ms: Some(2.0),
            client_idle_ms: Some(total - 10.5),
            client_fps: Some(fps),
            server_fps: Some(fps),
        }
    }

    #[test]
    fn stacking_follows_visibility() {
        let series = vec![vec![Some(1.0)], vec![Some(4.0)], vec![Some(7.0)]];

        let stacked = stack(&series, |_| false);
        assert_eq!(
            stacked.iter().map(|s| s.values[0]).collect::<Vec<_>>(),
            vec![Some(1.0), Some(5.0), Some(12.0)]
        );

        let stacked = stack(&series, |idx| idx == 1);
        assert_eq!(
            stacked.iter().map(|s| (s.index, s.values[0])).collect::<Vec<_>>(),
            vec![(0, Some(1.0)), (2, Some(8.0))]
        );
    }

    #[test]
    fn stacking_is_recomputed_on_toggle() {
        let mut graph = RollingWindowGraph::new(3, 4, 0.0);
        graph.append(1.0, Some(&[Some(1.0), Some(4.0), Some(7.0)]));

        graph.toggle(1);
        let last = |graph: &RollingWindowGraph| {
            graph
                .stacked()
                .iter()
                .map(|s| s.values[3])
                .collect::<Vec<_>>()
        };
        assert_eq!(last(&graph), vec![Some(1.0), Some(8.0)]);

        graph.toggle(1);
        assert_eq!(last(&graph), vec![Some(1.0), Some(5.0), Some(12.0)]);
    }

    #[test]
    fn gaps_stay_gaps() {
        let series = vec![vec![Some(1.0), None], vec![Some(2.0), Some(3.0)]];
        let stacked = stack(&series, |_| false);

        assert_eq!(stacked[0].values, vec![Some(1.0), None]);
        assert_eq!(stacked[1].values, vec![Some(3.0), Some(3.0)]);
    }

    #[test]
    fn rolling_buffer_is_bounded() {
        let mut graph = RollingWindowGraph::new(2, 1200, 0.0);

        for i in 0..5000 {
            let values = if i % 7 == 0 {
                None
            } else {
                Some([Some(i as f64), None])
            };
            graph.append(i as f64, values.as_ref().map(|v| &v[..]));

            assert_eq!(graph.len(), 1200);
            for series in 0..graph.series_count() {
                assert_eq!(graph.series(series).unwrap().len(), 1200);
            }
        }

        assert_eq!(graph.timestamps().last(), Some(4999.0));
        assert_eq!(graph.series(0).unwrap().get(1199), Some(4999.0));
    }

    #[test]
    fn quantile_interpolates() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[3.0], 0.25), Some(3.0));
        assert_eq!(quantile(&[4.0, 1.0, 3.0, 2.0], 0.5), Some(2.5));
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.25), Some(2.0));
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.75), Some(4.0));
    }

    #[test]
    fn window_values_skip_gaps_and_zeros() {
        let mut graph = RollingWindowGraph::new(1, 5, 0.0);
        graph.append(100.0, Some(&[Some(1.0)]));
        graph.append(200.0, Some(&[Some(0.0)]));
        graph.append(300.0, None);
        graph.append(400.0, Some(&[Some(4.0)]));

        assert_eq!(graph.window_values(0, 150.0), vec![4.0]);
        assert_eq!(graph.window_values(0, 0.0), vec![1.0, 4.0]);
    }

    #[test]
    fn timeline_activates_with_gap() {
        let mut timeline = StatisticsTimeline::new(0.0);
        assert_eq!(timeline.state(), TimelineState::Idle);

        timeline.push_sample(&sample(1000.0, 20.0, 72.0), 1000.0);

        assert_eq!(timeline.state(), TimelineState::Active);
        let timestamps = timeline.latency.timestamps().collect::<Vec<_>>();
        assert_eq!(timestamps[HISTORY_LENGTH - 2], 980.0);
        assert_eq!(timestamps[HISTORY_LENGTH - 1], 1000.0);
        assert_eq!(timeline.total_latency.get(HISTORY_LENGTH - 2), None);
        assert_eq!(timeline.total_latency.get(HISTORY_LENGTH - 1), Some(20.0));
        // idle band merges idle and wait
        assert_eq!(
            timeline.latency.series(2).unwrap().get(HISTORY_LENGTH - 1),
            Some(1.5)
        );
    }

    #[test]
    fn timeline_pads_and_goes_idle() {
        let mut timeline = StatisticsTimeline::new(0.0);
        timeline.push_sample(&sample(1000.0, 20.0, 72.0), 1000.0);

        // Too early for a redraw
        assert!(!timeline.tick(1010.0));

        // Samples stopped: a gap is appended once, right after the last sample
        assert!(timeline.tick(1150.0));
        let timestamps = timeline.latency.timestamps().collect::<Vec<_>>();
        assert_eq!(timestamps[HISTORY_LENGTH - 1], 1020.0);
        assert_eq!(timeline.total_latency.get(HISTORY_LENGTH - 1), None);

        assert!(timeline.tick(1200.0));
        let timestamps = timeline.latency.timestamps().collect::<Vec<_>>();
        assert_eq!(timestamps[HISTORY_LENGTH - 1], 1020.0);

        assert!(!timeline.tick(2000.0));
        assert_eq!(timeline.state(), TimelineState::Idle);
    }

    #[test]
    fn scales_follow_window() {
        let mut timeline = StatisticsTimeline::new(0.0);
        assert_eq!(timeline.latency_scale(), INITIAL_LATENCY_SCALE);
        assert_eq!(timeline.fps_scale(), INITIAL_FPS_SCALE);

        let mut now = 1000.0;
        for total in [10.0, 20.0, 30.0, 40.0, 50.0] {
            now += 50.0;
            timeline.push_sample(&sample(now, total, 72.0), now);
        }

        // q1 = 20, q3 = 40
        assert_eq!(timeline.latency_scale(), (0.0, 100.0));
        // Constant framerate still gets a drawable range
        assert_eq!(timeline.fps_scale(), (71.0, 73.0));
        assert_eq!(timeline.x_range(), (now - WINDOW_MS, now));
    }

    #[test]
    fn constant_series_keep_a_minimum_span() {
        let mut timeline = StatisticsTimeline::new(0.0);

        let mut now = 1000.0;
        for _ in 0..100 {
            now += 50.0;
            let mut stats = sample(now, 0.5, 72.0);
            stats.client_idle_ms = Some(0.1);
            timeline.push_sample(&stats, now);
        }

        assert_eq!(timeline.latency_scale(), (0.0, MIN_SCALE_SPAN));
        let (min, max) = timeline.fps_scale();
        assert!(max - min >= MIN_SCALE_SPAN);
        assert!(min < 72.0 && 72.0 < max);

        assert_eq!(widen_scale((10.0, 90.0)), (10.0, 90.0));
    }
}
