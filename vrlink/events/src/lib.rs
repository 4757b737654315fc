use serde::{Deserialize, Serialize};
use serde_json as json;
use std::collections::{BTreeMap, HashSet};
use vrlink_common::{anyhow::Result, bail, Context, LogSeverity};

const PAYLOAD_START: &str = "#{";
const PAYLOAD_END: &str = "}#";

/// Live statistics panel content. Keys are shown as they arrive.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Statistics(pub BTreeMap<String, json::Value>);

/// One sample of the performance graphs. On the wire it is a positional array:
/// `[timestamp, total, receive, render, idle, wait, encode, send, decode, client_idle,
/// client_fps, server_fps]`, latencies in milliseconds.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(try_from = "Vec<Option<f64>>", into = "Vec<Option<f64>>")]
pub struct GraphStatistics {
    pub timestamp_ms: f64,
    pub total_latency_ms: Option<f64>,
    pub receive_ms: Option<f64>,
    pub render_ms: Option<f64>,
    pub idle_ms: Option<f64>,
    pub wait_ms: Option<f64>,
    pub encode_ms: Option<f64>,
    pub send_ms: Option<f64>,
    pub decode_ms: Option<f64>,
    pub client_idle_ms: Option<f64>,
    pub client_fps: Option<f64>,
    pub server_fps: Option<f64>,
}

const GRAPH_STATISTICS_LEN: usize = 12;

impl TryFrom<Vec<Option<f64>>> for GraphStatistics {
    type Error = String;

    fn try_from(values: Vec<Option<f64>>) -> Result<Self, Self::Error> {
        if values.len() < GRAPH_STATISTICS_LEN {
            return Err(format!(
                "expected {GRAPH_STATISTICS_LEN} graph values, found {}",
                values.len()
            ));
        }

        Ok(Self {
            timestamp_ms: values[0].ok_or("missing graph timestamp")?,
            total_latency_ms: values[1],
            receive_ms: values[2],
            render_ms: values[3],
            idle_ms: values[4],
            wait_ms: values[5],
            encode_ms: values[6],
            send_ms: values[7],
            decode_ms: values[8],
            client_idle_ms: values[9],
            client_fps: values[10],
            server_fps: values[11],
        })
    }
}

impl From<GraphStatistics> for Vec<Option<f64>> {
    fn from(stats: GraphStatistics) -> Self {
        vec![
            Some(stats.timestamp_ms),
            stats.total_latency_ms,
            stats.receive_ms,
            stats.render_ms,
            stats.idle_ms,
            stats.wait_ms,
            stats.encode_ms,
            stats.send_ms,
            stats.decode_ms,
            stats.client_idle_ms,
            stats.client_fps,
            stats.server_fps,
        ]
    }
}

/// Payload embedded in a log line between the `#{` and `}#` sentinels.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub id: String,
    #[serde(default)]
    pub data: json::Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventType {
    Statistics(Statistics),
    GraphStatistics(GraphStatistics),
    SessionUpdated,
    // Any other id is looked up in the notification table
    Other(String),
}

impl EventType {
    pub fn from_record(record: EventRecord) -> Result<Self> {
        Ok(match record.id.as_str() {
            "Statistics" => EventType::Statistics(
                json::from_value(record.data).context("Invalid Statistics payload")?,
            ),
            "GraphStatistics" => EventType::GraphStatistics(
                json::from_value(record.data).context("Invalid GraphStatistics payload")?,
            ),
            "SessionUpdated" => EventType::SessionUpdated,
            _ => EventType::Other(record.id),
        })
    }
}

/// A line of the server log stream: `TIMESTAMP [LEVEL] message`.
#[derive(Clone, Debug, PartialEq)]
pub struct LogLine {
    pub timestamp: String,
    pub level_tag: String,
    pub severity: Option<LogSeverity>,
    // Text after the timestamp and the level tag
    pub message: String,
    pub raw_payload: Option<String>,
}

impl LogLine {
    pub fn parse(line: &str) -> Self {
        let mut split = line.splitn(3, ' ');
        let timestamp = split.next().unwrap_or_default().to_owned();
        let level_tag = split.next().unwrap_or_default().trim().to_owned();
        let message = split.next().unwrap_or_default().trim().to_owned();

        let raw_payload = line.find(PAYLOAD_START).and_then(|start| {
            line[start..]
                .find(PAYLOAD_END)
                .map(|end| line[start + 1..start + end + 1].to_owned())
        });

        Self {
            severity: LogSeverity::from_tag(&level_tag),
            timestamp,
            level_tag,
            message,
            raw_payload,
        }
    }

    pub fn has_payload(&self) -> bool {
        self.raw_payload.is_some()
    }

    /// Decoded payload. Errors carry the offending text.
    pub fn event(&self) -> Option<Result<EventType>> {
        self.raw_payload.as_ref().map(|text| {
            json::from_str::<EventRecord>(text)
                .with_context(|| format!("Malformed event payload: {text}"))
                .and_then(|record| {
                    EventType::from_record(record)
                        .with_context(|| format!("Malformed event payload: {text}"))
                })
        })
    }
}

/// Embed an event into a log message, the way the server does.
pub fn format_event(record: &EventRecord) -> Result<String> {
    let text = json::to_string(record)?;

    Ok(format!("#{}#", text))
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NotificationLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl NotificationLevel {
    pub fn from_variant(variant: &str) -> Result<Self> {
        Ok(match variant {
            "error" | "Error" => NotificationLevel::Error,
            "warning" | "Warning" => NotificationLevel::Warning,
            "info" | "Info" => NotificationLevel::Info,
            "debug" | "Debug" => NotificationLevel::Debug,
            _ => bail!("Unknown notification level \"{variant}\""),
        })
    }

    pub fn min_severity(self) -> LogSeverity {
        match self {
            NotificationLevel::Error => LogSeverity::Error,
            NotificationLevel::Warning => LogSeverity::Warning,
            NotificationLevel::Info => LogSeverity::Info,
            NotificationLevel::Debug => LogSeverity::Debug,
        }
    }
}

/// Severities that raise a toast. No configured level means no toasts.
pub fn allowed_severities(level: Option<NotificationLevel>) -> HashSet<LogSeverity> {
    let Some(level) = level else {
        return HashSet::new();
    };

    [
        LogSeverity::Error,
        LogSeverity::Warning,
        LogSeverity::Info,
        LogSeverity::Debug,
    ]
    .into_iter()
    .filter(|severity| *severity >= level.min_severity())
    .collect()
}
