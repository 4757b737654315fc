mod basic_components;
mod components;

use self::components::{
    default_extensions, ConnectionsRequest, ConnectionsTab, ExtensionRegistry, FormEngine,
    LogsTab, NotificationBar, SettingsTab, StatisticsTab,
};
use crate::{
    config::Config,
    data_sources::{DashboardRequest, DataSources, PolledEvent},
    graph::REDRAW_INTERVAL_MS,
    session_sync::ChangeKind,
    telemetry::{LogRow, NotificationSettings, TelemetryAction, TelemetryDispatcher},
    theme,
    translation::Translations,
};
use eframe::egui::{
    self, Align, CentralPanel, Frame, Layout, Margin, RichText, ScrollArea, SidePanel, Stroke,
};
use serde_json as json;
use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};
use vrlink_common::{info, show_err, LogSeverity, VRLINK_NAME};
use vrlink_session::{SchemaNode, SessionDesc};

const SYSTEM_LOCALE: &str = "system";
const DEFAULT_LOCALE: &str = "en";

// Loads to repeat once the streamer is reachable. The schema is requested again if the first
// attempt failed.
fn reconnect_requests(schema_loaded: bool) -> Vec<DashboardRequest> {
    let mut requests = vec![];
    if !schema_loaded {
        requests.push(DashboardRequest::GetSchema);
    }
    requests.push(DashboardRequest::GetSession);
    requests.push(DashboardRequest::GetAudioDevices);

    requests
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
enum Tab {
    Connections,
    Statistics,
    Settings,
    Logs,
}

pub struct Dashboard {
    data_sources: DataSources,
    config: Config,
    just_opened: bool,
    setup_wizard_open: bool,
    selected_tab: Tab,
    tab_labels: BTreeMap<Tab, &'static str>,
    connections_tab: ConnectionsTab,
    statistics_tab: StatisticsTab,
    settings_tab: SettingsTab,
    logs_tab: LogsTab,
    dispatcher: TelemetryDispatcher,
    translations: Translations,
    translations_locale: Option<String>,
    extensions: ExtensionRegistry,
    schema: Option<SchemaNode>,
    pending_session: Option<json::Value>,
    engine: Option<FormEngine>,
}

impl Dashboard {
    pub fn new(
        creation_context: &eframe::CreationContext<'_>,
        data_sources: DataSources,
        config: Config,
    ) -> Self {
        data_sources.request(DashboardRequest::GetSchema);
        data_sources.request(DashboardRequest::GetSession);
        data_sources.request(DashboardRequest::GetAudioDevices);

        theme::set_theme(&creation_context.egui_ctx);

        Self {
            data_sources,
            config,
            just_opened: true,
            setup_wizard_open: false,
            selected_tab: Tab::Connections,
            tab_labels: [
                (Tab::Connections, "🔌  Connections"),
                (Tab::Statistics, "📈  Statistics"),
                (Tab::Settings, "⚙  Settings"),
                (Tab::Logs, "📝  Logs"),
            ]
            .into_iter()
            .collect(),
            connections_tab: ConnectionsTab::new(),
            statistics_tab: StatisticsTab::new(),
            settings_tab: SettingsTab::new(),
            logs_tab: LogsTab::new(),
            dispatcher: TelemetryDispatcher::new(),
            translations: Translations::default(),
            translations_locale: None,
            extensions: default_extensions(),
            schema: None,
            pending_session: None,
            engine: None,
        }
    }

    fn effective_locale(&self) -> String {
        let session_locale = self
            .engine
            .as_ref()
            .map(|engine| engine.session().locale.clone());

        match self.config.locale.clone().or(session_locale) {
            Some(locale) if locale != SYSTEM_LOCALE => locale,
            _ => DEFAULT_LOCALE.into(),
        }
    }

    // The form can only be compiled once both the schema and a first session have arrived
    fn try_build_engine(&mut self) {
        let (Some(schema), Some(session_json)) = (&self.schema, &self.pending_session) else {
            return;
        };

        let engine = FormEngine::new(
            schema.clone(),
            SessionDesc::from_schema(schema),
            Box::new(self.data_sources.session_backend()),
            &self.extensions,
        )
        .and_then(|mut engine| {
            engine.load_session_json(session_json)?;
            Ok(engine)
        });

        if let Some(engine) = show_err(engine) {
            self.engine = Some(engine);
            self.pending_session = None;
            self.on_session_loaded();
        }
    }

    fn on_session_loaded(&mut self) {
        self.dispatcher.session_fetched();

        let Some(engine) = &self.engine else {
            return;
        };
        let session = engine.session();

        self.dispatcher
            .update_settings(&NotificationSettings::from_session_settings(
                &session.session_settings,
            ));

        if self.just_opened {
            self.setup_wizard_open = session.setup_wizard;
            self.just_opened = false;
        }

        let locale = self.effective_locale();
        if self.translations_locale.as_ref() != Some(&locale) {
            info!("Loading translations for locale \"{locale}\"");
            self.translations = Translations::load(&self.config.translations_dir, &locale);
            self.translations_locale = Some(locale);
        }
    }

    fn store_failure_toast(&mut self, message: String) {
        self.dispatcher.push_toast(
            LogSeverity::Error,
            "Failed to save settings".into(),
            message,
            Instant::now(),
        );
    }

    fn handle_event(&mut self, event: PolledEvent) {
        match event {
            PolledEvent::Schema(schema) => {
                if self.engine.is_none() {
                    self.schema = Some(*schema);
                    self.try_build_engine();
                }
            }
            PolledEvent::Session(session_json) => match &mut self.engine {
                Some(engine) => {
                    show_err(engine.load_session_json(&session_json));
                    self.on_session_loaded();
                }
                None => {
                    self.pending_session = Some(session_json);
                    self.try_build_engine();
                }
            },
            // Allow the next SessionUpdated event to trigger a new load
            PolledEvent::SessionLoadFailed => self.dispatcher.session_fetched(),
            PolledEvent::StoreRejected(body) => {
                if let Some(engine) = &mut self.engine {
                    if engine.store_failed(&body) {
                        self.on_session_loaded();
                    }
                }
                self.store_failure_toast("The streamer settings were restored".into());
            }
            PolledEvent::StoreError(message) => {
                if let Some(engine) = &mut self.engine {
                    engine.sync_mut().refetch();
                }
                self.store_failure_toast(message);
            }
            PolledEvent::AudioDevices(list) => self.settings_tab.update_audio_devices(list),
            PolledEvent::TelemetryLine(line) => {
                for action in self
                    .dispatcher
                    .dispatch(&line, &self.translations, Instant::now())
                {
                    match action {
                        TelemetryAction::Statistics(statistics) => {
                            self.statistics_tab.update_statistics(statistics)
                        }
                        TelemetryAction::GraphStatistics(statistics) => {
                            self.statistics_tab.update_graph_statistics(statistics)
                        }
                        TelemetryAction::RefetchSession => {
                            self.data_sources.request(DashboardRequest::GetSession)
                        }
                    }
                }
            }
            PolledEvent::TelemetryConnected(connected) => {
                // The streamer may have restarted with a different document
                if connected {
                    for request in reconnect_requests(self.schema.is_some()) {
                        self.data_sources.request(request);
                    }
                }
            }
            PolledEvent::DashboardLog { timestamp, entry } => {
                self.dispatcher.push_log_row(LogRow {
                    timestamp,
                    level_tag: entry.severity.tag().into(),
                    severity: Some(entry.severity),
                    message: entry.content,
                })
            }
        }
    }

    fn handle_connections_request(&mut self, request: ConnectionsRequest) {
        match request {
            ConnectionsRequest::AddClient {
                display_name,
                hostname,
                ip,
            } => self.data_sources.request(DashboardRequest::AddClient {
                display_name,
                hostname,
                ip,
            }),
            ConnectionsRequest::TrustClient { hostname, ip } => self
                .data_sources
                .request(DashboardRequest::TrustClient { hostname, ip }),
            ConnectionsRequest::RemoveClient { hostname, ip } => self
                .data_sources
                .request(DashboardRequest::RemoveClient { hostname, ip }),
            ConnectionsRequest::UpdateClient {
                hostname,
                client_desc,
            } => {
                if let Some(engine) = &mut self.engine {
                    let sync = engine.sync_mut();
                    sync.session_mut()
                        .client_connections
                        .insert(hostname, client_desc);
                    sync.commit(ChangeKind::ClientList);
                }
            }
        }
    }

    fn setup_wizard_ui(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(60.0);
            ui.heading(RichText::new(format!("Welcome to {VRLINK_NAME}")).size(30.0));
            ui.add_space(20.0);
            ui.label("Connect a headset from the Connections tab, then review the settings.");
            ui.add_space(20.0);
            if ui.button("Finish").clicked() {
                if let Some(engine) = &mut self.engine {
                    engine.sync_mut().disable_setup_wizard();
                }
                self.setup_wizard_open = false;
            }
        });
    }
}

impl eframe::App for Dashboard {
    fn update(&mut self, context: &egui::Context, _: &mut eframe::Frame) {
        while let Some(event) = self.data_sources.poll_event() {
            self.handle_event(event);
        }

        // The graph timer runs whichever tab is shown
        if self.statistics_tab.tick() {
            context.request_repaint_after(Duration::from_millis(REDRAW_INTERVAL_MS as u64));
        }

        let now = Instant::now();
        let streaming = self.dispatcher.is_streaming(now);
        let telemetry_connected = self.data_sources.telemetry_connected();

        NotificationBar::ui(context, self.dispatcher.toasts_mut(), now);

        if self.setup_wizard_open {
            CentralPanel::default().show(context, |ui| self.setup_wizard_ui(ui));

            return;
        }

        SidePanel::left("side_panel")
            .resizable(false)
            .frame(
                Frame::new()
                    .fill(theme::LIGHTER_BG)
                    .inner_margin(Margin::same(7))
                    .stroke(Stroke::new(1.0, theme::SEPARATOR_BG)),
            )
            .exact_width(150.0)
            .show(context, |ui| {
                ui.with_layout(Layout::top_down_justified(Align::Center), |ui| {
                    ui.add_space(13.0);
                    ui.heading(RichText::new(VRLINK_NAME).size(25.0).strong());
                    egui::warn_if_debug_build(ui);
                });

                ui.with_layout(Layout::top_down_justified(Align::Min), |ui| {
                    for (tab, label) in &self.tab_labels {
                        ui.selectable_value(&mut self.selected_tab, *tab, *label);
                    }
                });

                ui.with_layout(
                    Layout::bottom_up(Align::Center).with_cross_justify(true),
                    |ui| {
                        ui.add_space(5.0);
                        ui.horizontal(|ui| {
                            ui.add_space(5.0);
                            ui.label("Streamer:");
                            ui.add_space(-10.0);
                            if telemetry_connected {
                                ui.label(RichText::new("Connected").color(theme::OK_GREEN));
                            } else {
                                ui.label(RichText::new("Disconnected").color(theme::KO_RED));
                            }
                        })
                    },
                )
            });

        let mut connections_request = None;
        CentralPanel::default()
            .frame(Frame::new().inner_margin(Margin::same(20)).fill(theme::BG))
            .show(context, |ui| {
                ui.with_layout(Layout::top_down_justified(Align::LEFT), |ui| {
                    if let Some(label) = self.tab_labels.get(&self.selected_tab) {
                        ui.heading(RichText::new(*label).size(25.0));
                    }

                    ScrollArea::new([false, true]).show(ui, |ui| match self.selected_tab {
                        Tab::Connections => {
                            let default_session = SessionDesc::default();
                            let session = self
                                .engine
                                .as_ref()
                                .map(FormEngine::session)
                                .unwrap_or(&default_session);

                            connections_request =
                                self.connections_tab.ui(ui, session, streaming);
                        }
                        Tab::Statistics => self.statistics_tab.ui(ui, streaming),
                        Tab::Settings => {
                            self.settings_tab
                                .ui(ui, self.engine.as_mut(), &self.translations);
                        }
                        Tab::Logs => {
                            if self.logs_tab.ui(ui, self.dispatcher.log_rows()) {
                                self.dispatcher.clear_logs();
                            }
                        }
                    })
                })
            });

        if let Some(request) = connections_request {
            self.handle_connections_request(request);
        }
    }
}
