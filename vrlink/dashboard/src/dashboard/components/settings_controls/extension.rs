use super::{
    device_dropdown, presets, CompileContext, FormEdit, FormView, LeafControl, LeafKind,
    NestingInfo,
};
use eframe::egui::Ui;
use serde_json as json;
use std::collections::HashMap;
use vrlink_common::warn;

/// Widget for a schema field that has no generic control.
pub trait ExtensionControl {
    fn ui(&mut self, ui: &mut Ui, view: &FormView) -> Option<FormEdit>;
}

type ExtensionConstructor = Box<dyn Fn(&NestingInfo) -> Box<dyn ExtensionControl>>;

#[derive(Default)]
pub struct ExtensionRegistry {
    constructors: HashMap<String, ExtensionConstructor>,
}

impl ExtensionRegistry {
    pub fn register(
        &mut self,
        name: &str,
        constructor: impl Fn(&NestingInfo) -> Box<dyn ExtensionControl> + 'static,
    ) {
        self.constructors.insert(name.to_owned(), Box::new(constructor));
    }

    pub fn construct(
        &self,
        name: &str,
        nesting_info: &NestingInfo,
    ) -> Option<Box<dyn ExtensionControl>> {
        self.constructors
            .get(name)
            .map(|constructor| constructor(nesting_info))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }
}

pub fn default_extensions() -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::default();
    presets::register(&mut registry);
    device_dropdown::register(&mut registry);

    registry
}

pub struct Control {
    name: String,
    widget: Option<Box<dyn ExtensionControl>>,
}

impl Control {
    pub fn new(nesting_info: NestingInfo, name: &str, context: &mut CompileContext) -> Self {
        context.registry.register(
            nesting_info.path.clone(),
            LeafControl::new(
                LeafKind::Extension(name.to_owned()),
                json::Value::Null,
                nesting_info.placement(true),
            ),
        );

        let widget = context.extensions.construct(name, &nesting_info);
        if widget.is_none() && context.unhandled_extensions.insert(name.to_owned()) {
            warn!("No widget registered for extension \"{name}\"");
        }

        Self {
            name: name.to_owned(),
            widget,
        }
    }

    pub fn ui(&mut self, ui: &mut Ui, view: &FormView, allow_inline: bool) -> Option<FormEdit> {
        super::grid_flow_inline(ui, allow_inline);

        match &mut self.widget {
            Some(widget) => widget.ui(ui, view),
            None => {
                ui.add_enabled_ui(false, |ui| ui.label("Unimplemented UI"))
                    .response
                    .on_disabled_hover_text(&self.name);

                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::components::settings_controls::{ControlRegistry, ParentKind};
    use std::collections::BTreeSet;
    use vrlink_session::parse_path;

    #[test]
    fn builtin_extensions() {
        let registry = default_extensions();

        for name in [
            "resolutionDropdown",
            "displayRefreshRate",
            "trackingSpeed",
            "deviceDropdown",
            "inputDeviceDropdown",
            "outputDeviceDropdown",
        ] {
            assert!(registry.contains(name), "{name}");
        }
    }

    #[test]
    fn unknown_extension_is_reported_once() {
        let extensions = ExtensionRegistry::default();
        let mut registry = ControlRegistry::default();
        let mut unhandled = BTreeSet::new();
        let mut context = CompileContext {
            registry: &mut registry,
            extensions: &extensions,
            unhandled_extensions: &mut unhandled,
        };

        let root = NestingInfo::root();
        Control::new(root.child("first", ParentKind::Section), "custom", &mut context);
        Control::new(root.child("second", ParentKind::Section), "custom", &mut context);

        assert_eq!(unhandled.len(), 1);
        assert!(registry.get(&parse_path("first")).is_some());
        assert!(registry.bound_addresses().is_empty());
    }
}
