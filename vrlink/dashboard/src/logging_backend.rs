use crate::data_sources::PolledEvent;
use std::{
    io::Write,
    sync::{mpsc, Arc},
};
use vrlink_common::{log::LevelFilter, parking_lot::Mutex, LogEntry, LogSeverity};

pub fn init_logging(event_sender: mpsc::Sender<PolledEvent>) {
    let event_sender = Arc::new(Mutex::new(event_sender));

    env_logger::Builder::new()
        .filter(Some("ureq"), LevelFilter::Off)
        .filter(Some("tungstenite"), LevelFilter::Off)
        .filter(Some("eframe"), LevelFilter::Warn)
        .filter(Some("egui_glow"), LevelFilter::Warn)
        .filter_level(if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .format(move |f, record| {
            let timestamp = chrono::Local::now().format("%H:%M:%S.%f").to_string();

            event_sender
                .lock()
                .send(PolledEvent::DashboardLog {
                    timestamp: timestamp.clone(),
                    entry: LogEntry {
                        severity: LogSeverity::from_log_level(record.level()),
                        content: format!("{}", record.args()),
                    },
                })
                .ok();

            writeln!(
                f,
                "[{} {} {}] {}",
                timestamp,
                record.level(),
                record.module_path().unwrap_or_default(),
                record.args()
            )
        })
        .init();
}
