use super::{
    reset, CompileContext, FormEdit, FormView, LeafControl, LeafKind, NestingInfo, RawInput,
    StepDirection,
};
use eframe::{
    egui::{DragValue, Layout, Response, Slider, TextEdit, Ui},
    emath::Align,
};
use serde_json as json;
use vrlink_session::{NumericGuiType, NumericSchema};

fn default_json(schema: &NumericSchema, integer: bool) -> json::Value {
    if integer {
        json::Value::from(schema.default as i64)
    } else {
        json::Number::from_f64(schema.default)
            .map(json::Value::Number)
            .unwrap_or(json::Value::Null)
    }
}

pub struct Control {
    nesting_info: NestingInfo,
    schema: NumericSchema,
    integer: bool,
    gui_type: NumericGuiType,
    default_string: String,
    editing_value_f64: Option<f64>,
    editing_text: Option<String>,
}

impl Control {
    pub fn new(
        nesting_info: NestingInfo,
        schema: &NumericSchema,
        integer: bool,
        context: &mut CompileContext,
    ) -> Self {
        let kind = if integer {
            LeafKind::Integer(schema.clone())
        } else {
            LeafKind::Float(schema.clone())
        };
        context.registry.register(
            nesting_info.path.clone(),
            LeafControl::new(
                kind,
                default_json(schema, integer),
                nesting_info.placement(false),
            ),
        );

        Self {
            nesting_info,
            schema: schema.clone(),
            integer,
            gui_type: schema.gui_type(),
            default_string: format!("{}", schema.default),
            editing_value_f64: None,
            editing_text: None,
        }
    }

    fn request(&self, input: RawInput) -> Option<FormEdit> {
        Some(FormEdit::Single {
            path: self.nesting_info.path.clone(),
            input,
        })
    }

    // Value commits when the interaction ends, not on every frame of a drag
    fn track_editing(
        &mut self,
        response: &Response,
        session_value: f64,
        editing_value: f64,
    ) -> Option<FormEdit> {
        if response.drag_started() || response.gained_focus() {
            self.editing_value_f64 = Some(session_value);
        } else if response.drag_stopped() || response.lost_focus() {
            self.editing_value_f64 = None;

            return self.request(RawInput::Number(editing_value));
        } else if self.editing_value_f64.is_some() {
            self.editing_value_f64 = Some(editing_value);
        } else if response.changed() {
            return self.request(RawInput::Number(editing_value));
        }

        None
    }

    pub fn ui(&mut self, ui: &mut Ui, view: &FormView, allow_inline: bool) -> Option<FormEdit> {
        super::grid_flow_inline(ui, allow_inline);

        let session_value = view
            .value(&self.nesting_info.path)
            .and_then(json::Value::as_f64)
            .unwrap_or(self.schema.default);

        let mut request = None;
        ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
            let mut editing_value = self.editing_value_f64.unwrap_or(session_value);

            match (self.gui_type, self.schema.bounds()) {
                (NumericGuiType::Slider, Some((min, max))) => {
                    let mut slider = Slider::new(&mut editing_value, min..=max);
                    if let Some(step) = self.schema.step {
                        slider = slider.step_by(step);
                    }
                    if self.integer {
                        slider = slider.integer();
                    }

                    let response = ui.add(slider);
                    request = self.track_editing(&response, session_value, editing_value);
                }
                (NumericGuiType::UpDown, Some((min, max))) => {
                    let mut drag_value = DragValue::new(&mut editing_value)
                        .range(min..=max)
                        .speed(self.schema.step.unwrap_or(1.0));
                    if self.integer {
                        drag_value = drag_value.fixed_decimals(0);
                    }

                    let response = ui.add(drag_value);
                    request = self.track_editing(&response, session_value, editing_value);

                    if ui.small_button("−").clicked() {
                        request = self.request(RawInput::Step(StepDirection::Down));
                    }
                    if ui.small_button("+").clicked() {
                        request = self.request(RawInput::Step(StepDirection::Up));
                    }
                }
                _ => {
                    // Free text, coerced when the box loses focus
                    let mut text = self
                        .editing_text
                        .clone()
                        .unwrap_or_else(|| session_value.to_string());

                    let response = ui.add(TextEdit::singleline(&mut text).desired_width(100.0));
                    if response.lost_focus() {
                        self.editing_text = None;
                        request = self.request(RawInput::Text(text));
                    } else if response.has_focus() {
                        self.editing_text = Some(text);
                    }
                }
            }

            if reset::reset_button(
                ui,
                session_value != self.schema.default,
                &self.default_string,
            )
            .clicked()
            {
                request = self.request(RawInput::Reset);
            }
        });

        request
    }
}
