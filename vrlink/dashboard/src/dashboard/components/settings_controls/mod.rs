pub mod array;
pub mod boolean;
pub mod choice;
pub mod device_dropdown;
pub mod engine;
pub mod extension;
pub mod number;
pub mod optional;
pub mod presets;
pub mod reset;
pub mod section;
pub mod switch;
pub mod text;

pub use engine::{
    ControlRegistry, FormEdit, FormEngine, LeafControl, LeafKind, Placement, PushMode, RawInput,
    StepDirection,
};
pub use extension::{default_extensions, ExtensionControl, ExtensionRegistry};

use crate::{theme::log_colors::INFO_LIGHT, translation::Translations};
use eframe::egui::Ui;
use serde_json as json;
use std::collections::BTreeSet;
use vrlink_session::{AudioDevicesList, Path, PathSegment, SchemaNode};

pub const INDENTATION_STEP: f32 = 20.0;

fn grid_flow_inline(ui: &mut Ui, allow_inline: bool) {
    if !allow_inline {
        // Note: ui.add_space() does not work
        ui.label(" ");
    }
}

// Name of the control at `path`, followed by a help marker when a description exists
fn setting_label(ui: &mut Ui, view: &FormView, path: &Path, indentation: usize) {
    ui.horizontal(|ui| {
        ui.add_space(INDENTATION_STEP * indentation as f32);
        let label_res = ui.label(view.translations.setting_name(path));
        if cfg!(debug_assertions) {
            label_res.on_hover_text(path.to_string());
        }

        if let Some(help) = view.translations.setting_help(path) {
            ui.colored_label(INFO_LIGHT, "❓").on_hover_text(help);
        }
    });
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParentKind {
    Root,
    Section,
    Switch,
    Optional,
    Choice,
    Array,
}

/// Condition under which nested controls are live: the value at `selector` must be equal to
/// `open_value`.
#[derive(Clone, Debug, PartialEq)]
pub struct Gate {
    pub selector: Path,
    pub open_value: json::Value,
}

#[derive(Clone, Debug)]
pub struct NestingInfo {
    pub path: Path,
    pub depth: usize,
    pub parent_kind: ParentKind,
    // Inherited from any ancestor
    pub advanced: bool,
    pub gates: Vec<Gate>,
}

impl NestingInfo {
    pub fn root() -> Self {
        Self {
            path: Path::root(),
            depth: 0,
            parent_kind: ParentKind::Root,
            advanced: false,
            gates: vec![],
        }
    }

    pub fn child(&self, segment: impl Into<PathSegment>, parent_kind: ParentKind) -> Self {
        Self {
            path: self.path.join(segment),
            depth: self.depth + 1,
            parent_kind,
            advanced: self.advanced,
            gates: self.gates.clone(),
        }
    }

    pub fn with_advanced(mut self, advanced: bool) -> Self {
        self.advanced |= advanced;

        self
    }

    pub fn with_gate(mut self, selector: Path, open_value: json::Value) -> Self {
        self.gates.push(Gate {
            selector,
            open_value,
        });

        self
    }

    pub fn placement(&self, special: bool) -> Placement {
        Placement {
            advanced: self.advanced,
            special,
            gates: self.gates.clone(),
        }
    }
}

/// State shared by the compilation of a whole schema tree.
pub struct CompileContext<'a> {
    pub registry: &'a mut ControlRegistry,
    pub extensions: &'a ExtensionRegistry,
    pub unhandled_extensions: &'a mut BTreeSet<String>,
}

/// Read-only state the controls render from.
pub struct FormView<'a> {
    pub registry: &'a ControlRegistry,
    pub translations: &'a Translations,
    pub audio_devices: &'a AudioDevicesList,
    pub show_advanced: bool,
    pub show_special: bool,
}

impl FormView<'_> {
    pub fn value(&self, path: &Path) -> Option<&json::Value> {
        self.registry.value(path)
    }

    pub fn is_visible(&self, path: &Path) -> bool {
        self.registry
            .is_visible(path, self.show_advanced, self.show_special)
    }
}

pub enum SettingControl {
    Section(section::Control),
    Choice(choice::Control),
    Optional(optional::Control),
    Switch(switch::Control),
    Boolean(boolean::Control),
    Text(text::Control),
    Numeric(number::Control),
    Array(array::Control),
    Extension(extension::Control),
}

impl SettingControl {
    pub fn new(nesting_info: NestingInfo, schema: &SchemaNode, context: &mut CompileContext) -> Self {
        match schema {
            SchemaNode::Section { entries } => {
                Self::Section(section::Control::new(nesting_info, entries, context))
            }
            SchemaNode::Choice {
                default,
                variants,
                gui,
            } => Self::Choice(choice::Control::new(
                nesting_info,
                default,
                variants,
                *gui,
                context,
            )),
            SchemaNode::Optional {
                default_set,
                content_advanced,
                content,
            } => Self::Optional(optional::Control::new(
                nesting_info,
                *default_set,
                *content_advanced,
                content,
                context,
            )),
            SchemaNode::Switch {
                default_enabled,
                content_advanced,
                content,
            } => Self::Switch(switch::Control::new(
                nesting_info,
                *default_enabled,
                *content_advanced,
                content,
                context,
            )),
            SchemaNode::Boolean { default } => {
                Self::Boolean(boolean::Control::new(nesting_info, *default, context))
            }
            SchemaNode::Integer(schema) => Self::Numeric(number::Control::new(
                nesting_info,
                schema,
                true,
                context,
            )),
            SchemaNode::Float(schema) => Self::Numeric(number::Control::new(
                nesting_info,
                schema,
                false,
                context,
            )),
            SchemaNode::Text { default } => {
                Self::Text(text::Control::new(nesting_info, default, context))
            }
            SchemaNode::Array(elements) => {
                Self::Array(array::Control::new(nesting_info, elements, context))
            }
            SchemaNode::Extension(name) => {
                Self::Extension(extension::Control::new(nesting_info, name, context))
            }
        }
    }

    // inline: first field child, could be rendered beside the field label
    pub fn ui(&mut self, ui: &mut Ui, view: &FormView, allow_inline: bool) -> Option<FormEdit> {
        match self {
            Self::Section(control) => control.ui(ui, view, allow_inline),
            Self::Choice(control) => control.ui(ui, view, allow_inline),
            Self::Optional(control) => control.ui(ui, view, allow_inline),
            Self::Switch(control) => control.ui(ui, view, allow_inline),
            Self::Boolean(control) => control.ui(ui, view, allow_inline),
            Self::Text(control) => control.ui(ui, view, allow_inline),
            Self::Numeric(control) => control.ui(ui, view, allow_inline),
            Self::Array(control) => control.ui(ui, view, allow_inline),
            Self::Extension(control) => control.ui(ui, view, allow_inline),
        }
    }
}
