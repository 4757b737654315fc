use crate::session_sync::{SessionBackend, StoreRequest};
use eframe::egui;
use serde_json as json;
use std::{
    io::ErrorKind,
    net::{TcpStream, ToSocketAddrs},
    str::FromStr,
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
    time::Duration,
};
use tungstenite::http::Uri;
use vrlink_common::{
    anyhow, anyhow::Result, debug, error, info, warn, LogEntry, RelaxedAtomic, ToAny,
};
use vrlink_session::{AudioDevicesList, SchemaNode};

const REQUEST_TIMEOUT: Duration = Duration::from_millis(500);
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(500);
const READ_POLL_INTERVAL: Duration = Duration::from_millis(50);
const REQUEST_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Debug)]
pub enum DashboardRequest {
    GetSchema,
    GetSession,
    GetAudioDevices,
    StoreSession(Box<StoreRequest>),
    AddClient {
        display_name: String,
        hostname: String,
        ip: String,
    },
    TrustClient {
        hostname: String,
        ip: Option<String>,
    },
    RemoveClient {
        hostname: String,
        ip: Option<String>,
    },
}

pub enum PolledEvent {
    Schema(Box<SchemaNode>),
    Session(json::Value),
    SessionLoadFailed,
    // Non-empty store response body
    StoreRejected(String),
    StoreError(String),
    AudioDevices(AudioDevicesList),
    TelemetryLine(String),
    TelemetryConnected(bool),
    DashboardLog { timestamp: String, entry: LogEntry },
}

/// Session pushes and reloads are queued on the requests thread.
pub struct RequestsBackend {
    sender: mpsc::Sender<DashboardRequest>,
}

impl RequestsBackend {
    pub fn new(sender: mpsc::Sender<DashboardRequest>) -> Self {
        Self { sender }
    }
}

impl SessionBackend for RequestsBackend {
    fn store(&mut self, request: StoreRequest) {
        self.sender
            .send(DashboardRequest::StoreSession(Box::new(request)))
            .ok();
    }

    fn fetch(&mut self) {
        self.sender.send(DashboardRequest::GetSession).ok();
    }
}

fn response_body(response: ureq::Response) -> Result<String> {
    Ok(response.into_string()?)
}

fn execute_request(
    agent: &ureq::Agent,
    base_uri: &str,
    request: DashboardRequest,
    events_sender: &mpsc::Sender<PolledEvent>,
) -> Result<()> {
    match request {
        DashboardRequest::GetSchema => {
            let schema = agent
                .get(&format!("{base_uri}/settings-schema"))
                .call()?
                .into_json::<SchemaNode>()?;
            events_sender.send(PolledEvent::Schema(Box::new(schema)))?;
        }
        DashboardRequest::GetSession => {
            let session = agent
                .get(&format!("{base_uri}/session/load"))
                .call()?
                .into_json::<json::Value>()?;
            events_sender.send(PolledEvent::Session(session))?;
        }
        DashboardRequest::GetAudioDevices => {
            let list = agent
                .get(&format!("{base_uri}/audio-devices"))
                .call()?
                .into_json::<AudioDevicesList>()?;
            events_sender.send(PolledEvent::AudioDevices(list))?;
        }
        DashboardRequest::StoreSession(request) => {
            let result = agent
                .post(&format!("{base_uri}/session/store"))
                .send_json(&*request);

            // The server answers a rejected store with its own document
            let event = match result {
                Ok(response) => {
                    let body = response_body(response)?;
                    (!body.trim().is_empty()).then_some(PolledEvent::StoreRejected(body))
                }
                Err(ureq::Error::Status(code, response)) => {
                    let body = response_body(response)?;
                    Some(if body.trim().is_empty() {
                        PolledEvent::StoreError(format!("status code {code}"))
                    } else {
                        PolledEvent::StoreRejected(body)
                    })
                }
                Err(e) => Some(PolledEvent::StoreError(e.to_string())),
            };
            if let Some(event) = event {
                events_sender.send(event)?;
            }
        }
        DashboardRequest::AddClient {
            display_name,
            hostname,
            ip,
        } => {
            agent
                .post(&format!("{base_uri}/client/add"))
                .send_json(json::json!([display_name, hostname, ip]))?;
        }
        DashboardRequest::TrustClient { hostname, ip } => {
            agent
                .post(&format!("{base_uri}/client/trust"))
                .send_json(json::json!([hostname, ip]))?;
        }
        DashboardRequest::RemoveClient { hostname, ip } => {
            agent
                .post(&format!("{base_uri}/client/remove"))
                .send_json(json::json!([hostname, ip]))?;
        }
    }

    Ok(())
}

fn connect_telemetry(host: &str) -> Result<tungstenite::WebSocket<TcpStream>> {
    let uri = Uri::from_str(&format!("ws://{host}/api/log"))?;
    let address = host.to_socket_addrs()?.next().to_any()?;

    let socket = TcpStream::connect_timeout(&address, REQUEST_TIMEOUT)?;
    // A peer that accepts but never answers the upgrade must not block the thread forever
    socket.set_read_timeout(Some(REQUEST_TIMEOUT))?;
    let (ws, _) = tungstenite::client(uri, socket).map_err(|e| anyhow!("{e}"))?;
    ws.get_ref().set_nonblocking(true)?;

    Ok(ws)
}

pub struct DataSources {
    running: Arc<RelaxedAtomic>,
    requests_sender: mpsc::Sender<DashboardRequest>,
    events_receiver: mpsc::Receiver<PolledEvent>,
    telemetry_connected: Arc<RelaxedAtomic>,
    requests_thread: Option<JoinHandle<()>>,
    telemetry_thread: Option<JoinHandle<()>>,
}

impl DataSources {
    pub fn new(
        context: egui::Context,
        host: String,
        events_sender: mpsc::Sender<PolledEvent>,
        events_receiver: mpsc::Receiver<PolledEvent>,
    ) -> Self {
        let running = Arc::new(RelaxedAtomic::new(true));
        let (requests_sender, requests_receiver) = mpsc::channel::<DashboardRequest>();
        let telemetry_connected = Arc::new(RelaxedAtomic::new(false));

        let requests_thread = thread::spawn({
            let running = Arc::clone(&running);
            let context = context.clone();
            let events_sender = events_sender.clone();
            let host = host.clone();
            move || {
                let base_uri = format!("http://{host}/api");
                let request_agent = ureq::AgentBuilder::new()
                    .timeout_connect(REQUEST_TIMEOUT)
                    .build();

                while running.value() {
                    while let Ok(request) = requests_receiver.try_recv() {
                        debug!("Dashboard request: {request:?}");
                        let session_load = matches!(request, DashboardRequest::GetSession);

                        if let Err(e) =
                            execute_request(&request_agent, &base_uri, request, &events_sender)
                        {
                            error!("Request to {host} failed: {e:#}");
                            if session_load {
                                events_sender.send(PolledEvent::SessionLoadFailed).ok();
                            }
                        }
                        context.request_repaint();
                    }

                    thread::sleep(REQUEST_POLL_INTERVAL);
                }
            }
        });

        let telemetry_thread = thread::spawn({
            let running = Arc::clone(&running);
            let telemetry_connected = Arc::clone(&telemetry_connected);
            move || {
                while running.value() {
                    let mut ws = match connect_telemetry(&host) {
                        Ok(ws) => ws,
                        Err(e) => {
                            debug!("Telemetry connection failed: {e:#}");
                            thread::sleep(CONNECT_RETRY_INTERVAL);

                            continue;
                        }
                    };

                    info!("Telemetry connected");
                    telemetry_connected.set(true);
                    events_sender.send(PolledEvent::TelemetryConnected(true)).ok();
                    context.request_repaint();

                    while running.value() {
                        match ws.read() {
                            Ok(tungstenite::Message::Text(text)) => {
                                for line in text.lines().filter(|line| !line.trim().is_empty()) {
                                    events_sender
                                        .send(PolledEvent::TelemetryLine(line.to_owned()))
                                        .ok();
                                }
                                context.request_repaint();
                            }
                            Ok(tungstenite::Message::Close(_)) => break,
                            Err(tungstenite::Error::Io(e)) if e.kind() == ErrorKind::WouldBlock => {
                                thread::sleep(READ_POLL_INTERVAL);
                            }
                            Err(e) => {
                                warn!("Telemetry stream error: {e}");
                                break;
                            }
                            _ => (),
                        }
                    }

                    // Reconnect right away, a restarted server is usually back quickly
                    info!("Telemetry disconnected");
                    telemetry_connected.set(false);
                    events_sender.send(PolledEvent::TelemetryConnected(false)).ok();
                    context.request_repaint();
                }
            }
        });

        Self {
            running,
            requests_sender,
            events_receiver,
            telemetry_connected,
            requests_thread: Some(requests_thread),
            telemetry_thread: Some(telemetry_thread),
        }
    }

    pub fn request(&self, request: DashboardRequest) {
        self.requests_sender.send(request).ok();
    }

    pub fn session_backend(&self) -> RequestsBackend {
        RequestsBackend::new(self.requests_sender.clone())
    }

    pub fn poll_event(&self) -> Option<PolledEvent> {
        self.events_receiver.try_recv().ok()
    }

    pub fn telemetry_connected(&self) -> bool {
        self.telemetry_connected.value()
    }
}

impl Drop for DataSources {
    fn drop(&mut self) {
        self.running.set(false);

        if let Some(thread) = self.requests_thread.take() {
            thread.join().ok();
        }
        if let Some(thread) = self.telemetry_thread.take() {
            thread.join().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_sync::ChangeKind;
    use vrlink_session::SessionDesc;

    #[test]
    fn backend_queues_requests() {
        let (sender, receiver) = mpsc::channel();
        let mut backend = RequestsBackend::new(sender);

        backend.fetch();
        backend.store(StoreRequest {
            change_kind: ChangeKind::Settings,
            client_id: "abc".into(),
            document: SessionDesc::default(),
        });

        assert!(matches!(receiver.try_recv(), Ok(DashboardRequest::GetSession)));
        match receiver.try_recv() {
            Ok(DashboardRequest::StoreSession(request)) => {
                assert_eq!(request.change_kind, ChangeKind::Settings)
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn silent_peer_fails_the_handshake() {
        // Bound but never accepted: the connection completes and no reply ever arrives
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let host = listener.local_addr().unwrap().to_string();

        let start = std::time::Instant::now();
        assert!(connect_telemetry(&host).is_err());
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
