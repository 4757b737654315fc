use super::{ExtensionControl, ExtensionRegistry, FormEdit, FormView, NestingInfo};
use eframe::egui::{ComboBox, Ui};
use serde_json as json;
use vrlink_session::{AudioDevicesList, Path, PathValuePair};

const DEFAULT_VARIANT: &str = "default";
const NAME_VARIANT: &str = "name";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceList {
    Output,
    Input,
}

impl DeviceList {
    fn devices(self, list: &AudioDevicesList) -> &[String] {
        match self {
            DeviceList::Output => &list.output,
            DeviceList::Input => &list.input,
        }
    }
}

/// Picks an audio device for a sibling choice with a `default` variant and a `name` variant
/// holding the device name.
pub struct DeviceDropdown {
    id: Path,
    target: Path,
    list: DeviceList,
}

impl DeviceDropdown {
    pub fn new(nesting_info: &NestingInfo, target_name: &str, list: DeviceList) -> Self {
        Self {
            id: nesting_info.path.clone(),
            target: nesting_info
                .path
                .parent()
                .unwrap_or_default()
                .join(target_name),
            list,
        }
    }

    // None is the system default device
    pub fn selected_device<'a>(
        &self,
        lookup: impl Fn(&Path) -> Option<&'a json::Value>,
    ) -> Option<String> {
        let variant = lookup(&self.target.join("variant"))?.as_str()?;
        if variant != NAME_VARIANT {
            return None;
        }

        lookup(&self.target.join(NAME_VARIANT))?
            .as_str()
            .map(str::to_owned)
    }

    pub fn select(&self, device: Option<&str>) -> FormEdit {
        let variant_path = self.target.join("variant");

        FormEdit::Batch(match device {
            Some(name) => vec![
                PathValuePair {
                    path: variant_path,
                    value: json::Value::String(NAME_VARIANT.into()),
                },
                PathValuePair {
                    path: self.target.join(NAME_VARIANT),
                    value: json::Value::String(name.into()),
                },
            ],
            None => vec![PathValuePair {
                path: variant_path,
                value: json::Value::String(DEFAULT_VARIANT.into()),
            }],
        })
    }
}

impl ExtensionControl for DeviceDropdown {
    fn ui(&mut self, ui: &mut Ui, view: &FormView) -> Option<FormEdit> {
        let selected = self.selected_device(|path| view.value(path));
        let devices = self.list.devices(view.audio_devices);

        let mut request = None;
        ComboBox::from_id_salt(self.id.to_string())
            .selected_text(selected.as_deref().unwrap_or("Default"))
            .show_ui(ui, |ui| {
                if ui.selectable_label(selected.is_none(), "Default").clicked() {
                    request = Some(self.select(None));
                }
                for device in devices {
                    if ui
                        .selectable_label(selected.as_deref() == Some(device.as_str()), device)
                        .clicked()
                    {
                        request = Some(self.select(Some(device)));
                    }
                }
            });

        request
    }
}

pub fn register(registry: &mut ExtensionRegistry) {
    registry.register("deviceDropdown", |nesting_info| {
        Box::new(DeviceDropdown::new(nesting_info, "deviceId", DeviceList::Output))
    });
    registry.register("inputDeviceDropdown", |nesting_info| {
        Box::new(DeviceDropdown::new(
            nesting_info,
            "inputDeviceId",
            DeviceList::Output,
        ))
    });
    registry.register("outputDeviceDropdown", |nesting_info| {
        Box::new(DeviceDropdown::new(
            nesting_info,
            "outputDeviceId",
            DeviceList::Input,
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::components::settings_controls::ParentKind;
    use vrlink_session::{get_value, parse_path};

    fn dropdown() -> DeviceDropdown {
        let nesting_info = NestingInfo::root()
            .child("audio", ParentKind::Section)
            .child("deviceDropdown", ParentKind::Section);

        DeviceDropdown::new(&nesting_info, "deviceId", DeviceList::Output)
    }

    #[test]
    fn reads_sibling_choice() {
        let dropdown = dropdown();

        let named = json::json!({
            "audio": { "deviceId": { "variant": "name", "name": "Speakers" } }
        });
        assert_eq!(
            dropdown.selected_device(|path| get_value(&named, path)),
            Some("Speakers".into())
        );

        let default = json::json!({
            "audio": { "deviceId": { "variant": "default", "name": "Speakers" } }
        });
        assert_eq!(dropdown.selected_device(|path| get_value(&default, path)), None);
    }

    #[test]
    fn selection_is_one_batch() {
        let dropdown = dropdown();

        let FormEdit::Batch(pairs) = dropdown.select(Some("Headphones")) else {
            panic!("expected a batch");
        };
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].path, parse_path("audio.deviceId.variant"));
        assert_eq!(pairs[1].value, json::json!("Headphones"));

        let FormEdit::Batch(pairs) = dropdown.select(None) else {
            panic!("expected a batch");
        };
        assert_eq!(pairs[0].value, json::json!("default"));
    }

    #[test]
    fn device_lists() {
        let list = AudioDevicesList {
            output: vec!["Speakers".into()],
            input: vec!["Microphone".into()],
        };

        assert_eq!(DeviceList::Output.devices(&list), ["Speakers".to_owned()]);
        assert_eq!(DeviceList::Input.devices(&list), ["Microphone".to_owned()]);
    }
}
