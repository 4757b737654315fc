use super::FormEngine;
use crate::translation::Translations;
use eframe::egui::{Label, RichText, Ui};
use vrlink_session::AudioDevicesList;

pub struct SettingsTab {
    audio_devices: AudioDevicesList,
}

impl SettingsTab {
    pub fn new() -> Self {
        Self {
            audio_devices: AudioDevicesList::default(),
        }
    }

    pub fn update_audio_devices(&mut self, list: AudioDevicesList) {
        self.audio_devices = list;
    }

    /// Returns true if an edit was pushed to the server.
    pub fn ui(
        &mut self,
        ui: &mut Ui,
        engine: Option<&mut FormEngine>,
        translations: &Translations,
    ) -> bool {
        let Some(engine) = engine else {
            ui.add(Label::new(RichText::new("Waiting for the settings schema...").italics()));

            return false;
        };

        let mut show_advanced = engine.show_advanced();
        ui.horizontal(|ui| {
            ui.checkbox(&mut show_advanced, "Advanced settings");
            for name in engine.unhandled_extensions() {
                ui.weak(format!("Missing control: {name}"));
            }
        });
        if show_advanced != engine.show_advanced() {
            engine.set_show_advanced(show_advanced);
            // Preset shortcuts are only offered in the simple view
            engine.set_show_special(!show_advanced);
        }

        ui.separator();

        engine.ui(ui, translations, &self.audio_devices)
    }
}
