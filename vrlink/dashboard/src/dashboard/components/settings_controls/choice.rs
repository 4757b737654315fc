use super::{
    reset, CompileContext, FormEdit, FormView, LeafControl, LeafKind, NestingInfo, ParentKind,
    RawInput, SettingControl,
};
use crate::dashboard::basic_components;
use eframe::{
    egui::{ComboBox, Layout, Ui},
    emath::Align,
};
use serde_json as json;
use std::collections::HashMap;
use vrlink_session::{ChoiceControlType, ChoiceVariant, Path};

struct Variant {
    tag: String,
    advanced: bool,
    // None for data-less variants
    control: Option<SettingControl>,
}

pub struct Control {
    nesting_info: NestingInfo,
    variant_path: Path,
    default_variant: String,
    variants: Vec<Variant>,
    variant_indices: HashMap<String, usize>,
    gui: ChoiceControlType,
}

impl Control {
    pub fn new(
        nesting_info: NestingInfo,
        default: &str,
        schema_variants: &[ChoiceVariant],
        gui: ChoiceControlType,
        context: &mut CompileContext,
    ) -> Self {
        let variant_path = nesting_info.path.join("variant");
        context.registry.register(
            variant_path.clone(),
            LeafControl::new(
                LeafKind::Variant {
                    tags: schema_variants
                        .iter()
                        .map(|variant| variant.name.clone())
                        .collect(),
                },
                json::Value::String(default.to_owned()),
                nesting_info.placement(false),
            ),
        );

        let variants = schema_variants
            .iter()
            .map(|variant| {
                let control = variant.content.as_ref().map(|schema| {
                    let nesting_info = nesting_info
                        .child(variant.name.as_str(), ParentKind::Choice)
                        .with_advanced(variant.advanced)
                        .with_gate(
                            variant_path.clone(),
                            json::Value::String(variant.name.clone()),
                        );

                    SettingControl::new(nesting_info, schema, context)
                });

                Variant {
                    tag: variant.name.clone(),
                    advanced: variant.advanced,
                    control,
                }
            })
            .collect::<Vec<_>>();

        let variant_indices = variants
            .iter()
            .enumerate()
            .map(|(idx, variant)| (variant.tag.clone(), idx))
            .collect();

        Self {
            nesting_info,
            variant_path,
            default_variant: default.to_owned(),
            variants,
            variant_indices,
            gui,
        }
    }

    fn variant_label(&self, view: &FormView, tag: &str) -> String {
        view.translations.setting_name(&self.nesting_info.path.join(tag))
    }

    pub fn ui(&mut self, ui: &mut Ui, view: &FormView, allow_inline: bool) -> Option<FormEdit> {
        super::grid_flow_inline(ui, allow_inline);

        let mut selected = view
            .value(&self.variant_path)
            .and_then(json::Value::as_str)
            .unwrap_or(&self.default_variant)
            .to_owned();

        // Advanced variants are offered only in advanced mode, unless already selected
        let options = self
            .variants
            .iter()
            .filter(|variant| !variant.advanced || view.show_advanced || variant.tag == selected)
            .map(|variant| (variant.tag.clone(), self.variant_label(view, &variant.tag)))
            .collect::<Vec<_>>();

        let mut request = None;
        ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
            let changed = match self.gui {
                ChoiceControlType::ButtonGroup => {
                    basic_components::button_group_clicked(ui, &options, &mut selected)
                }
                ChoiceControlType::Dropdown => {
                    let selected_label = options
                        .iter()
                        .find(|(tag, _)| *tag == selected)
                        .map(|(_, label)| label.clone())
                        .unwrap_or_default();

                    let mut changed = false;
                    ComboBox::from_id_salt(self.variant_path.to_string())
                        .selected_text(selected_label)
                        .show_ui(ui, |ui| {
                            for (tag, label) in &options {
                                if ui.selectable_label(*tag == selected, label).clicked() {
                                    selected.clone_from(tag);
                                    changed = true;
                                }
                            }
                        });

                    changed
                }
            };
            if changed {
                request = Some(FormEdit::Single {
                    path: self.variant_path.clone(),
                    input: RawInput::SelectVariant(selected.clone()),
                });
            }

            let default_label = format!("\"{}\"", self.variant_label(view, &self.default_variant));
            if reset::reset_button(ui, selected != self.default_variant, &default_label).clicked()
            {
                request = Some(FormEdit::Single {
                    path: self.variant_path.clone(),
                    input: RawInput::Reset,
                });
            }
        });

        // Only the active variant is rendered, the others keep their values in the document
        let Some(&index) = self.variant_indices.get(&selected) else {
            return request;
        };
        if let Some(control) = &mut self.variants[index].control {
            ui.end_row();

            let content_path = self.nesting_info.path.join(selected.as_str());
            super::setting_label(ui, view, &content_path, self.nesting_info.depth);
            request = control.ui(ui, view, true).or(request);
        }

        request
    }
}
