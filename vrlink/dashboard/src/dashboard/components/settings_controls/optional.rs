use super::{
    reset, CompileContext, FormEdit, FormView, LeafControl, LeafKind, NestingInfo, ParentKind,
    RawInput, SettingControl,
};
use eframe::{
    egui::{Layout, Ui},
    emath::Align,
};
use serde_json as json;
use vrlink_session::{Path, SchemaNode};

pub struct Control {
    set_path: Path,
    default_set: bool,
    default_string: String,
    content_control: Box<SettingControl>,
}

impl Control {
    pub fn new(
        nesting_info: NestingInfo,
        default_set: bool,
        content_advanced: bool,
        schema_content: &SchemaNode,
        context: &mut CompileContext,
    ) -> Self {
        let default_string = if default_set {
            "Set".into()
        } else {
            "Default".into()
        };

        let set_path = nesting_info.path.join("set");
        context.registry.register(
            set_path.clone(),
            LeafControl::new(
                LeafKind::Boolean,
                json::Value::Bool(default_set),
                nesting_info.placement(false),
            ),
        );

        let control = {
            let nesting_info = nesting_info
                .child("content", ParentKind::Optional)
                .with_advanced(content_advanced)
                .with_gate(set_path.clone(), json::Value::Bool(true));

            SettingControl::new(nesting_info, schema_content, context)
        };

        Self {
            set_path,
            default_set,
            default_string,
            content_control: Box::new(control),
        }
    }

    pub fn ui(&mut self, ui: &mut Ui, view: &FormView, allow_inline: bool) -> Option<FormEdit> {
        super::grid_flow_inline(ui, allow_inline);

        let set = view
            .value(&self.set_path)
            .and_then(json::Value::as_bool)
            .unwrap_or(self.default_set);

        let mut request = None;
        ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
            for (label, value) in [("Default", false), ("Set", true)] {
                if ui.selectable_label(set == value, label).clicked() && set != value {
                    request = Some(FormEdit::Single {
                        path: self.set_path.clone(),
                        input: RawInput::Checked(value),
                    });
                }
            }

            if reset::reset_button(ui, set != self.default_set, &self.default_string).clicked() {
                request = Some(FormEdit::Single {
                    path: self.set_path.clone(),
                    input: RawInput::Reset,
                });
            }
        });

        if set {
            ui.end_row();

            request = self.content_control.ui(ui, view, false).or(request);
        }

        request
    }
}
