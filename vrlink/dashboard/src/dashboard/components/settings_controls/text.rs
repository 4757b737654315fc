use super::{reset, CompileContext, FormEdit, FormView, LeafControl, LeafKind, NestingInfo, RawInput};
use eframe::{
    egui::{Layout, TextEdit, Ui},
    emath::Align,
};
use serde_json as json;

pub struct Control {
    nesting_info: NestingInfo,
    default: String,
    editing_value: Option<String>,
}

impl Control {
    pub fn new(nesting_info: NestingInfo, default: &str, context: &mut CompileContext) -> Self {
        context.registry.register(
            nesting_info.path.clone(),
            LeafControl::new(
                LeafKind::Text,
                json::Value::String(default.to_owned()),
                nesting_info.placement(false),
            ),
        );

        Self {
            nesting_info,
            default: default.to_owned(),
            editing_value: None,
        }
    }

    pub fn ui(&mut self, ui: &mut Ui, view: &FormView, allow_inline: bool) -> Option<FormEdit> {
        super::grid_flow_inline(ui, allow_inline);

        let path = &self.nesting_info.path;
        let session_value = view
            .value(path)
            .and_then(json::Value::as_str)
            .unwrap_or(&self.default)
            .to_owned();

        let mut request = None;
        ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
            let mut text = self
                .editing_value
                .clone()
                .unwrap_or_else(|| session_value.clone());

            let response = ui.add(TextEdit::singleline(&mut text).desired_width(200.0));
            if response.lost_focus() {
                request = Some(FormEdit::Single {
                    path: path.clone(),
                    input: RawInput::Text(text),
                });
                self.editing_value = None;
            } else if response.has_focus() {
                self.editing_value = Some(text);
            }

            if reset::reset_button(
                ui,
                session_value != self.default,
                &format!("\"{}\"", self.default),
            )
            .clicked()
            {
                request = Some(FormEdit::Single {
                    path: path.clone(),
                    input: RawInput::Reset,
                });
            }
        });

        request
    }
}
