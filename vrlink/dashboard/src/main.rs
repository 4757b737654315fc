// hide console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod config;
mod dashboard;
mod data_sources;
mod graph;
mod logging_backend;
mod session_sync;
mod telemetry;
mod theme;
mod translation;

use config::Invocation;
use dashboard::Dashboard;
use data_sources::DataSources;
use eframe::{egui::ViewportBuilder, NativeOptions};
use pico_args::Arguments;
use std::{process::ExitCode, sync::mpsc};
use vrlink_common::{error, info, VRLINK_NAME};

fn main() -> ExitCode {
    let config = match config::parse_args(Arguments::from_env()) {
        Ok(Invocation::Run(config)) => config,
        Ok(Invocation::Help) => {
            println!("{}", config::HELP);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{e}\n{}", config::HELP);
            return ExitCode::FAILURE;
        }
    };

    let (events_sender, events_receiver) = mpsc::channel();
    logging_backend::init_logging(events_sender.clone());
    vrlink_common::set_panic_hook();

    info!("Connecting to streamer at {}", config.host);

    let res = eframe::run_native(
        &format!("{VRLINK_NAME} dashboard"),
        NativeOptions {
            viewport: ViewportBuilder::default()
                .with_app_id("vrlink.dashboard")
                .with_inner_size((900.0, 600.0)),
            centered: true,
            ..Default::default()
        },
        Box::new(move |creation_context| {
            let data_sources = DataSources::new(
                creation_context.egui_ctx.clone(),
                config.host.clone(),
                events_sender,
                events_receiver,
            );

            Ok(Box::new(Dashboard::new(
                creation_context,
                data_sources,
                config,
            )))
        }),
    );

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Dashboard failed: {e}");
            ExitCode::FAILURE
        }
    }
}
