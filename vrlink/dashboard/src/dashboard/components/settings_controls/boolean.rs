use super::{reset, CompileContext, FormEdit, FormView, LeafControl, LeafKind, NestingInfo, RawInput};
use crate::dashboard::basic_components;
use eframe::{
    egui::{Layout, Ui},
    emath::Align,
};
use serde_json as json;

pub struct Control {
    nesting_info: NestingInfo,
    default: bool,
    default_string: String,
}

impl Control {
    pub fn new(nesting_info: NestingInfo, default: bool, context: &mut CompileContext) -> Self {
        let default_string = if default { "ON".into() } else { "OFF".into() };

        context.registry.register(
            nesting_info.path.clone(),
            LeafControl::new(
                LeafKind::Boolean,
                json::Value::Bool(default),
                nesting_info.placement(false),
            ),
        );

        Self {
            nesting_info,
            default,
            default_string,
        }
    }

    pub fn ui(&mut self, ui: &mut Ui, view: &FormView, allow_inline: bool) -> Option<FormEdit> {
        super::grid_flow_inline(ui, allow_inline);

        let path = &self.nesting_info.path;
        let mut enabled = view
            .value(path)
            .and_then(json::Value::as_bool)
            .unwrap_or(self.default);

        let mut request = None;
        ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
            if basic_components::switch(ui, &mut enabled).clicked() {
                request = Some(FormEdit::Single {
                    path: path.clone(),
                    input: RawInput::Checked(enabled),
                });
            }

            if reset::reset_button(ui, enabled != self.default, &self.default_string).clicked() {
                request = Some(FormEdit::Single {
                    path: path.clone(),
                    input: RawInput::Reset,
                });
            }
        });

        request
    }
}
