use super::{
    reset, CompileContext, FormEdit, FormView, LeafControl, LeafKind, NestingInfo, ParentKind,
    RawInput, SettingControl,
};
use crate::dashboard::basic_components;
use eframe::{
    egui::{Layout, Ui},
    emath::Align,
};
use serde_json as json;
use vrlink_session::{Path, SchemaNode};

pub struct Control {
    enabled_path: Path,
    default_enabled: bool,
    default_string: String,
    content_control: Box<SettingControl>,
}

impl Control {
    pub fn new(
        nesting_info: NestingInfo,
        default_enabled: bool,
        content_advanced: bool,
        schema_content: &SchemaNode,
        context: &mut CompileContext,
    ) -> Self {
        let default_string = if default_enabled {
            "ON".into()
        } else {
            "OFF".into()
        };

        let enabled_path = nesting_info.path.join("enabled");
        context.registry.register(
            enabled_path.clone(),
            LeafControl::new(
                LeafKind::Boolean,
                json::Value::Bool(default_enabled),
                nesting_info.placement(false),
            ),
        );

        let control = {
            let nesting_info = nesting_info
                .child("content", ParentKind::Switch)
                .with_advanced(content_advanced)
                .with_gate(enabled_path.clone(), json::Value::Bool(true));

            SettingControl::new(nesting_info, schema_content, context)
        };

        Self {
            enabled_path,
            default_enabled,
            default_string,
            content_control: Box::new(control),
        }
    }

    pub fn ui(&mut self, ui: &mut Ui, view: &FormView, allow_inline: bool) -> Option<FormEdit> {
        super::grid_flow_inline(ui, allow_inline);

        let mut enabled = view
            .value(&self.enabled_path)
            .and_then(json::Value::as_bool)
            .unwrap_or(self.default_enabled);

        let mut request = None;
        ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
            if basic_components::switch(ui, &mut enabled).clicked() {
                request = Some(FormEdit::Single {
                    path: self.enabled_path.clone(),
                    input: RawInput::Checked(enabled),
                });
            }

            if reset::reset_button(
                ui,
                enabled != self.default_enabled,
                &self.default_string,
            )
            .clicked()
            {
                request = Some(FormEdit::Single {
                    path: self.enabled_path.clone(),
                    input: RawInput::Reset,
                });
            }
        });

        if enabled {
            ui.end_row();

            request = self.content_control.ui(ui, view, false).or(request);
        }

        request
    }
}
