use super::{ExtensionControl, ExtensionRegistry, FormEdit, FormView, NestingInfo};
use crate::dashboard::basic_components;
use eframe::egui::{ComboBox, Ui};
use serde_json as json;
use vrlink_session::{parse_path_value_pair, ChoiceControlType, Path, PathValuePair};

const RESOLUTION_SCALES: [u32; 8] = [25, 50, 66, 75, 100, 125, 150, 200];
const REFRESH_RATES: [u32; 5] = [60, 72, 80, 90, 120];

pub struct PresetOption {
    pub name: String,
    // Relative to the section containing the preset
    pub modifiers: Vec<PathValuePair>,
}

impl PresetOption {
    pub fn new(name: impl Into<String>, modifiers: &[&str]) -> Self {
        Self {
            name: name.into(),
            modifiers: modifiers
                .iter()
                .map(|modifier| parse_path_value_pair(modifier))
                .collect(),
        }
    }
}

// Numbers may come back from the server as integers or floats
pub fn json_values_eq(a: &json::Value, b: &json::Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => (a - b).abs() < 1e-6,
        _ => a == b,
    }
}

/// A dropdown whose options each set a group of values at once.
pub struct PresetSelector {
    id: Path,
    base: Path,
    options: Vec<PresetOption>,
    gui: ChoiceControlType,
}

impl PresetSelector {
    pub fn new(
        nesting_info: &NestingInfo,
        options: Vec<PresetOption>,
        gui: ChoiceControlType,
    ) -> Self {
        Self {
            id: nesting_info.path.clone(),
            base: nesting_info.path.parent().unwrap_or_default(),
            options,
            gui,
        }
    }

    fn absolute_path(&self, relative: &Path) -> Path {
        let mut path = self.base.clone();
        path.extend(relative.iter().cloned());

        path
    }

    pub fn absolute_modifiers(&self, index: usize) -> Vec<PathValuePair> {
        self.options
            .get(index)
            .map(|option| {
                option
                    .modifiers
                    .iter()
                    .map(|modifier| PathValuePair {
                        path: self.absolute_path(&modifier.path),
                        value: modifier.value.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First option whose modifiers all match the current values.
    pub fn selected_option<'a>(
        &self,
        lookup: impl Fn(&Path) -> Option<&'a json::Value>,
    ) -> Option<usize> {
        (0..self.options.len()).find(|&index| {
            self.absolute_modifiers(index).iter().all(|modifier| {
                lookup(&modifier.path)
                    .map(|value| json_values_eq(value, &modifier.value))
                    .unwrap_or(false)
            })
        })
    }

    pub fn select(&self, index: usize) -> Option<FormEdit> {
        let modifiers = self.absolute_modifiers(index);

        (!modifiers.is_empty()).then_some(FormEdit::Batch(modifiers))
    }
}

impl ExtensionControl for PresetSelector {
    fn ui(&mut self, ui: &mut Ui, view: &FormView) -> Option<FormEdit> {
        let selected = self.selected_option(|path| view.value(path));

        let options = self
            .options
            .iter()
            .map(|option| (option.name.clone(), option.name.clone()))
            .collect::<Vec<_>>();
        let mut selection = selected
            .and_then(|index| options.get(index))
            .map(|(name, _)| name.clone())
            .unwrap_or_default();

        let changed = match self.gui {
            ChoiceControlType::ButtonGroup => {
                ui.horizontal(|ui| {
                    basic_components::button_group_clicked(ui, &options, &mut selection)
                })
                .inner
            }
            ChoiceControlType::Dropdown => {
                let mut changed = false;
                ComboBox::from_id_salt(self.id.to_string())
                    .selected_text(if selection.is_empty() {
                        "Custom"
                    } else {
                        selection.as_str()
                    })
                    .show_ui(ui, |ui| {
                        for (name, label) in &options {
                            if ui.selectable_label(*name == selection, label).clicked() {
                                selection.clone_from(name);
                                changed = true;
                            }
                        }
                    });

                changed
            }
        };

        if changed {
            let index = options.iter().position(|(name, _)| *name == selection)?;
            self.select(index)
        } else {
            None
        }
    }
}

pub fn resolution_preset(nesting_info: &NestingInfo) -> PresetSelector {
    let options = RESOLUTION_SCALES
        .iter()
        .map(|scale| {
            let scale_value = *scale as f64 / 100.0;
            PresetOption::new(
                format!("{scale}%"),
                &[
                    "renderResolution.variant = \"scale\"",
                    &format!("renderResolution.scale = {scale_value}"),
                    "recommendedTargetResolution.variant = \"scale\"",
                    &format!("recommendedTargetResolution.scale = {scale_value}"),
                ],
            )
        })
        .collect();

    PresetSelector::new(nesting_info, options, ChoiceControlType::Dropdown)
}

pub fn refresh_rate_preset(nesting_info: &NestingInfo) -> PresetSelector {
    let options = REFRESH_RATES
        .iter()
        .map(|fps| {
            PresetOption::new(format!("{fps} Hz"), &[&format!("preferredFps = {fps}.0")])
        })
        .collect();

    PresetSelector::new(nesting_info, options, ChoiceControlType::ButtonGroup)
}

pub fn tracking_speed_preset(nesting_info: &NestingInfo) -> PresetSelector {
    let options = vec![
        PresetOption::new(
            "Oculus",
            &["clientsidePrediction = true", "serversidePrediction = false"],
        ),
        PresetOption::new(
            "SteamVR",
            &["clientsidePrediction = false", "serversidePrediction = true"],
        ),
        PresetOption::new(
            "Normal",
            &[
                "clientsidePrediction = false",
                "serversidePrediction = false",
                "poseTimeOffset = 0.01",
            ],
        ),
        PresetOption::new(
            "Medium",
            &[
                "clientsidePrediction = false",
                "serversidePrediction = false",
                "poseTimeOffset = -0.03",
            ],
        ),
        PresetOption::new(
            "Fast",
            &[
                "clientsidePrediction = false",
                "serversidePrediction = false",
                "poseTimeOffset = -1",
            ],
        ),
    ];

    PresetSelector::new(nesting_info, options, ChoiceControlType::ButtonGroup)
}

pub fn register(registry: &mut ExtensionRegistry) {
    registry.register("resolutionDropdown", |nesting_info| {
        Box::new(resolution_preset(nesting_info))
    });
    registry.register("displayRefreshRate", |nesting_info| {
        Box::new(refresh_rate_preset(nesting_info))
    });
    registry.register("trackingSpeed", |nesting_info| {
        Box::new(tracking_speed_preset(nesting_info))
    });
}
