use crate::translation::Translations;
use serde_json as json;
use std::{
    collections::{HashSet, VecDeque},
    time::{Duration, Instant},
};
use vrlink_common::{error, LogSeverity};
use vrlink_events::{
    allowed_severities, EventType, GraphStatistics, LogLine, NotificationLevel, Statistics,
};

pub const MAX_TOASTS: usize = 2;
pub const TOAST_DURATION: Duration = Duration::from_secs(5);
pub const STREAMING_TIMEOUT: Duration = Duration::from_secs(2);
pub const LOG_LIMIT: usize = 500;

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub severity: LogSeverity,
    pub title: String,
    pub message: String,
    pub shown_at: Instant,
}

#[derive(Default)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
}

impl ToastQueue {
    /// Returns false if the toast was dropped because too many are already shown.
    pub fn push(&mut self, toast: Toast) -> bool {
        self.expire(toast.shown_at);

        if self.toasts.len() >= MAX_TOASTS {
            return false;
        }
        self.toasts.push_back(toast);

        true
    }

    pub fn expire(&mut self, now: Instant) {
        self.toasts
            .retain(|toast| now.saturating_duration_since(toast.shown_at) < TOAST_DURATION);
    }

    pub fn dismiss(&mut self, index: usize) {
        self.toasts.remove(index);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogRow {
    pub timestamp: String,
    pub level_tag: String,
    pub severity: Option<LogSeverity>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TelemetryAction {
    Statistics(Statistics),
    GraphStatistics(GraphStatistics),
    RefetchSession,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationSettings {
    pub level: Option<NotificationLevel>,
    pub exclude_without_id: bool,
}

impl NotificationSettings {
    pub fn from_session_settings(settings: &json::Value) -> Self {
        let extra = &settings["extra"];

        let level = extra["notificationLevel"]["variant"]
            .as_str()
            .and_then(|variant| NotificationLevel::from_variant(variant).ok());
        let exclude_without_id = extra["excludeNotificationsWithoutId"]
            .as_bool()
            .unwrap_or(false);

        Self {
            level,
            exclude_without_id,
        }
    }
}

/// Routes the lines of the server log stream.
pub struct TelemetryDispatcher {
    allowed_severities: HashSet<LogSeverity>,
    exclude_without_id: bool,
    toasts: ToastQueue,
    log_rows: VecDeque<LogRow>,
    streaming_deadline: Option<Instant>,
    session_fetch_pending: bool,
}

impl TelemetryDispatcher {
    pub fn new() -> Self {
        Self {
            allowed_severities: HashSet::new(),
            exclude_without_id: false,
            toasts: ToastQueue::default(),
            log_rows: VecDeque::new(),
            streaming_deadline: None,
            session_fetch_pending: false,
        }
    }

    pub fn update_settings(&mut self, settings: &NotificationSettings) {
        self.allowed_severities = allowed_severities(settings.level);
        self.exclude_without_id = settings.exclude_without_id;
    }

    pub fn dispatch(
        &mut self,
        line: &str,
        translations: &Translations,
        now: Instant,
    ) -> Vec<TelemetryAction> {
        let parsed = LogLine::parse(line);
        let mut actions = vec![];

        let mut event_id = None;
        match parsed.event() {
            Some(Ok(EventType::Statistics(statistics))) => {
                self.streaming_deadline = Some(now + STREAMING_TIMEOUT);
                actions.push(TelemetryAction::Statistics(statistics));

                return actions;
            }
            Some(Ok(EventType::GraphStatistics(graph_statistics))) => {
                actions.push(TelemetryAction::GraphStatistics(graph_statistics));

                return actions;
            }
            Some(Ok(EventType::SessionUpdated)) => {
                if !self.session_fetch_pending {
                    self.session_fetch_pending = true;
                    actions.push(TelemetryAction::RefetchSession);
                }
                event_id = Some("SessionUpdated".to_owned());
            }
            Some(Ok(EventType::Other(id))) => event_id = Some(id),
            Some(Err(e)) => {
                error!("{e:#}");
                self.push_toast(
                    LogSeverity::Error,
                    "Malformed telemetry".into(),
                    format!("{e:#}"),
                    now,
                );
            }
            None => (),
        }

        let notify = parsed
            .severity
            .map(|severity| self.allowed_severities.contains(&severity))
            .unwrap_or(false)
            && !(self.exclude_without_id && !parsed.has_payload());
        if notify {
            let (title, message) = match &event_id {
                Some(id) => match translations.notification(id) {
                    Some(text) => (text.title.to_owned(), text.message.to_owned()),
                    None => (parsed.level_tag.clone(), format!("{id}: {}", parsed.message)),
                },
                None => (parsed.level_tag.clone(), parsed.message.clone()),
            };
            self.push_toast(
                parsed.severity.unwrap_or(LogSeverity::Info),
                title,
                message,
                now,
            );
        }

        self.push_log_row(LogRow {
            timestamp: parsed.timestamp,
            level_tag: parsed.level_tag,
            severity: parsed.severity,
            message: event_id.unwrap_or(parsed.message),
        });

        actions
    }

    pub fn push_toast(
        &mut self,
        severity: LogSeverity,
        title: String,
        message: String,
        now: Instant,
    ) {
        self.toasts.push(Toast {
            severity,
            title,
            message,
            shown_at: now,
        });
    }

    pub fn push_log_row(&mut self, row: LogRow) {
        if self.log_rows.len() >= LOG_LIMIT {
            self.log_rows.pop_front();
        }
        self.log_rows.push_back(row);
    }

    pub fn session_fetched(&mut self) {
        self.session_fetch_pending = false;
    }

    pub fn is_streaming(&self, now: Instant) -> bool {
        self.streaming_deadline
            .map(|deadline| now < deadline)
            .unwrap_or(false)
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    pub fn log_rows(&self) -> impl DoubleEndedIterator<Item = &LogRow> {
        self.log_rows.iter()
    }

    pub fn clear_logs(&mut self) {
        self.log_rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filtered_dispatcher(
        level: Option<NotificationLevel>,
        exclude_without_id: bool,
    ) -> TelemetryDispatcher {
        let mut dispatcher = TelemetryDispatcher::new();
        dispatcher.update_settings(&NotificationSettings {
            level,
            exclude_without_id,
        });

        dispatcher
    }

    #[test]
    fn settings_from_document() {
        let settings = NotificationSettings::from_session_settings(&json::json!({
            "extra": {
                "notificationLevel": { "variant": "warning" },
                "excludeNotificationsWithoutId": true
            }
        }));
        assert_eq!(settings.level, Some(NotificationLevel::Warning));
        assert!(settings.exclude_without_id);

        assert_eq!(
            NotificationSettings::from_session_settings(&json::json!({})),
            NotificationSettings::default()
        );
    }

    #[test]
    fn statistics_do_not_reach_the_log() {
        let mut dispatcher = filtered_dispatcher(Some(NotificationLevel::Debug), false);
        let now = Instant::now();

        let actions = dispatcher.dispatch(
            r#"10:00:00.0 [INFO] #{"id":"Statistics","data":{"fps":72}}#"#,
            &Translations::default(),
            now,
        );

        assert!(matches!(&actions[..], [TelemetryAction::Statistics(_)]));
        assert!(dispatcher.is_streaming(now + Duration::from_secs(1)));
        assert!(!dispatcher.is_streaming(now + Duration::from_secs(3)));
        assert_eq!(dispatcher.log_rows().count(), 0);
        assert_eq!(dispatcher.toasts().len(), 0);
    }

    #[test]
    fn session_refetch_is_guarded() {
        let mut dispatcher = filtered_dispatcher(None, false);
        let line = r#"10:00:00.0 [INFO] #{"id":"SessionUpdated"}#"#;
        let translations = Translations::default();

        let first = dispatcher.dispatch(line, &translations, Instant::now());
        let second = dispatcher.dispatch(line, &translations, Instant::now());
        assert_eq!(first, vec![TelemetryAction::RefetchSession]);
        assert!(second.is_empty());

        dispatcher.session_fetched();
        let third = dispatcher.dispatch(line, &translations, Instant::now());
        assert_eq!(third, vec![TelemetryAction::RefetchSession]);
    }

    #[test]
    fn severity_filter() {
        let translations = Translations::default();
        let now = Instant::now();

        let mut dispatcher = filtered_dispatcher(Some(NotificationLevel::Warning), false);
        dispatcher.dispatch("10:00:00.0 [INFO] Connected", &translations, now);
        assert_eq!(dispatcher.toasts().len(), 0);
        dispatcher.dispatch("10:00:00.0 [WARN] Packet loss", &translations, now);
        assert_eq!(dispatcher.toasts().len(), 1);

        let toast = dispatcher.toasts().iter().next().unwrap();
        assert_eq!(toast.title, "[WARN]");
        assert_eq!(toast.message, "Packet loss");
        assert_eq!(dispatcher.log_rows().count(), 2);

        let mut dispatcher = filtered_dispatcher(None, false);
        dispatcher.dispatch("10:00:00.0 [ERROR] Crash", &translations, now);
        assert_eq!(dispatcher.toasts().len(), 0);
    }

    #[test]
    fn exclude_lines_without_id() {
        let translations = Translations::new(
            Default::default(),
            [
                ("ClientFoundWrongVersion.title".into(), "Wrong version".into()),
                ("ClientFoundWrongVersion.msg".into(), "Update the client".into()),
            ]
            .into_iter()
            .collect(),
        );
        let now = Instant::now();
        let mut dispatcher = filtered_dispatcher(Some(NotificationLevel::Error), true);

        dispatcher.dispatch("10:00:00.0 [ERROR] Plain error", &translations, now);
        assert_eq!(dispatcher.toasts().len(), 0);

        dispatcher.dispatch(
            r#"10:00:00.0 [ERROR] #{"id":"ClientFoundWrongVersion","data":"1.0"}#"#,
            &translations,
            now,
        );
        let toast = dispatcher.toasts().iter().next().unwrap();
        assert_eq!(toast.title, "Wrong version");
        assert_eq!(toast.message, "Update the client");

        let last_row = dispatcher.log_rows().last().unwrap();
        assert_eq!(last_row.message, "ClientFoundWrongVersion");
    }

    #[test]
    fn untranslated_id_falls_back_to_level() {
        let now = Instant::now();
        let mut dispatcher = filtered_dispatcher(Some(NotificationLevel::Info), false);

        dispatcher.dispatch(
            r#"10:00:00.0 [INFO] #{"id":"ServerRestart"}#"#,
            &Translations::default(),
            now,
        );

        let toast = dispatcher.toasts().iter().next().unwrap();
        assert_eq!(toast.title, "[INFO]");
        assert!(toast.message.starts_with("ServerRestart: "));
    }

    #[test]
    fn malformed_payload_raises_error_toast() {
        let now = Instant::now();
        let mut dispatcher = filtered_dispatcher(None, false);

        let actions = dispatcher.dispatch(
            "10:00:00.0 [INFO] #{not json}#",
            &Translations::default(),
            now,
        );

        assert!(actions.is_empty());
        let toast = dispatcher.toasts().iter().next().unwrap();
        assert_eq!(toast.severity, LogSeverity::Error);

        // The stream keeps going
        dispatcher.dispatch("10:00:00.1 [INFO] Next line", &Translations::default(), now);
        assert_eq!(dispatcher.log_rows().count(), 2);
    }

    #[test]
    fn at_most_two_toasts() {
        let now = Instant::now();
        let mut dispatcher = filtered_dispatcher(Some(NotificationLevel::Debug), false);

        for i in 0..4 {
            dispatcher.dispatch(
                &format!("10:00:00.0 [INFO] Message {i}"),
                &Translations::default(),
                now,
            );
        }
        assert_eq!(dispatcher.toasts().len(), MAX_TOASTS);

        dispatcher
            .toasts_mut()
            .expire(now + TOAST_DURATION + Duration::from_millis(1));
        assert_eq!(dispatcher.toasts().len(), 0);
    }

    #[test]
    fn log_table_is_capped() {
        let mut dispatcher = filtered_dispatcher(None, false);

        for i in 0..(LOG_LIMIT + 20) {
            dispatcher.dispatch(
                &format!("10:00:00.0 [DEBUG] Line {i}"),
                &Translations::default(),
                Instant::now(),
            );
        }

        assert_eq!(dispatcher.log_rows().count(), LOG_LIMIT);
        assert_eq!(dispatcher.log_rows().next().unwrap().message, "Line 20");
    }
}
