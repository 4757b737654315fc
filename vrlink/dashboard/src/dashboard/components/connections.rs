use crate::theme;
use eframe::egui::{self, Frame, RichText, Ui, Window};
use std::{collections::HashSet, net::IpAddr};
use vrlink_common::warn;
use vrlink_session::{ClientConnectionDesc, SessionDesc};

#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionsRequest {
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
    // Edited locally and stored with the whole document
    UpdateClient {
        hostname: String,
        client_desc: ClientConnectionDesc,
    },
}

struct EditPopupState {
    new_client: bool,
    hostname: String,
    display_name: String,
    ip_addresses: Vec<String>,
    trusted: bool,
}

fn parse_ip_addresses(addresses: &[String]) -> HashSet<IpAddr> {
    addresses
        .iter()
        .filter_map(|address| match address.trim().parse() {
            Ok(address) => Some(address),
            Err(e) => {
                warn!("Ignoring IP address \"{address}\": {e}");
                None
            }
        })
        .collect()
}

fn first_ip(client_desc: &ClientConnectionDesc) -> Option<String> {
    client_desc.manual_ips.iter().next().map(|ip| ip.to_string())
}

pub struct ConnectionsTab {
    edit_popup_state: Option<EditPopupState>,
}

impl ConnectionsTab {
    pub fn new() -> Self {
        Self {
            edit_popup_state: None,
        }
    }

    pub fn ui(
        &mut self,
        ui: &mut Ui,
        session: &SessionDesc,
        streaming: bool,
    ) -> Option<ConnectionsRequest> {
        let mut response = None;

        ui.horizontal(|ui| {
            ui.label("Client status:");
            if streaming {
                ui.label(RichText::new("Streaming").color(theme::OK_GREEN));
            } else {
                ui.label(RichText::new("Not streaming").color(theme::KO_RED));
            }
        });

        let mut clients = session.client_connections.iter().collect::<Vec<_>>();
        clients.sort_by(|(a, _), (b, _)| a.cmp(b));
        let (trusted, new): (Vec<_>, Vec<_>) =
            clients.into_iter().partition(|(_, client_desc)| client_desc.trusted);

        Frame::group(ui.style())
            .fill(theme::LIGHTER_BG)
            .show(ui, |ui| {
                ui.label(RichText::new("New clients").size(18.0));
                for (hostname, client_desc) in new {
                    ui.horizontal(|ui| {
                        ui.label(format!("{} ({hostname})", client_desc.display_name));
                        if ui.button("Trust").clicked() {
                            response = Some(ConnectionsRequest::TrustClient {
                                hostname: hostname.clone(),
                                ip: first_ip(client_desc),
                            });
                        }
                        if ui.button("Remove").clicked() {
                            response = Some(ConnectionsRequest::RemoveClient {
                                hostname: hostname.clone(),
                                ip: first_ip(client_desc),
                            });
                        }
                    });
                }
            });
        ui.add_space(10.0);
        Frame::group(ui.style())
            .fill(theme::LIGHTER_BG)
            .show(ui, |ui| {
                ui.label(RichText::new("Trusted clients").size(18.0));
                for (hostname, client_desc) in trusted {
                    ui.horizontal(|ui| {
                        ui.label(format!("{} ({hostname})", client_desc.display_name));
                        if ui.button("Edit").clicked() {
                            self.edit_popup_state = Some(EditPopupState {
                                new_client: false,
                                hostname: hostname.clone(),
                                display_name: client_desc.display_name.clone(),
                                ip_addresses: client_desc
                                    .manual_ips
                                    .iter()
                                    .map(|addr| addr.to_string())
                                    .collect(),
                                trusted: client_desc.trusted,
                            });
                        }
                        if ui.button("Remove").clicked() {
                            response = Some(ConnectionsRequest::RemoveClient {
                                hostname: hostname.clone(),
                                ip: first_ip(client_desc),
                            });
                        }
                    });
                }
            });
        ui.add_space(10.0);
        if ui.button("Add client manually").clicked() {
            self.edit_popup_state = Some(EditPopupState {
                new_client: true,
                hostname: "client.local".into(),
                display_name: "Headset".into(),
                ip_addresses: vec!["192.168.1.2".into()],
                trusted: true,
            });
        }

        let mut close_popup = false;
        if let Some(state) = &mut self.edit_popup_state {
            Window::new("Edit connection")
                .anchor(egui::Align2::CENTER_CENTER, (0.0, 0.0))
                .resizable(false)
                .collapsible(false)
                .show(ui.ctx(), |ui| {
                    ui.columns(2, |ui| {
                        ui[0].label("Hostname:");
                        ui[1].add_enabled(
                            state.new_client,
                            egui::TextEdit::singleline(&mut state.hostname),
                        );
                        ui[0].label("Display name:");
                        ui[1].text_edit_singleline(&mut state.display_name);
                        ui[0].label("IP addresses:");
                        if ui[1].button("Add new").clicked() {
                            state.ip_addresses.push("192.168.1.2".into());
                        }
                    });
                    // A new client is registered with a single address
                    let shown = if state.new_client { 1 } else { usize::MAX };
                    for address in state.ip_addresses.iter_mut().take(shown) {
                        ui.text_edit_singleline(address);
                    }
                    ui.columns(2, |ui| {
                        if ui[0].button("Ok").clicked() {
                            response = Some(if state.new_client {
                                ConnectionsRequest::AddClient {
                                    display_name: state.display_name.clone(),
                                    hostname: state.hostname.clone(),
                                    ip: state.ip_addresses.first().cloned().unwrap_or_default(),
                                }
                            } else {
                                ConnectionsRequest::UpdateClient {
                                    hostname: state.hostname.clone(),
                                    client_desc: ClientConnectionDesc {
                                        display_name: state.display_name.clone(),
                                        manual_ips: parse_ip_addresses(&state.ip_addresses),
                                        trusted: state.trusted,
                                    },
                                }
                            });

                            close_popup = true;
                        }
                        if ui[1].button("Cancel").clicked() {
                            close_popup = true;
                        }
                    })
                });
        }

        if close_popup {
            self.edit_popup_state = None;
        }

        response
    }
}
