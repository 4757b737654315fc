use super::{CompileContext, ExtensionRegistry, FormView, Gate, NestingInfo, SettingControl};
use crate::{
    session_sync::{ChangeKind, SessionBackend, SessionSync},
    translation::Translations,
};
use eframe::egui::Ui;
use serde_json as json;
use std::collections::{BTreeSet, HashMap};
use vrlink_common::{anyhow::Result, debug, error, warn};
use vrlink_session::{
    AudioDevicesList, NumericSchema, Path, PathValuePair, SchemaNode, SessionDesc,
};

#[derive(Clone, Debug, PartialEq)]
pub enum LeafKind {
    Boolean,
    Integer(NumericSchema),
    Float(NumericSchema),
    Text,
    // The `variant` field of a choice
    Variant { tags: Vec<String> },
    // Custom widget, bound to no document value
    Extension(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Placement {
    pub advanced: bool,
    pub special: bool,
    pub gates: Vec<Gate>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeafControl {
    pub kind: LeafKind,
    pub default: json::Value,
    // Displayed value
    pub value: json::Value,
    pub placement: Placement,
}

impl LeafControl {
    pub fn new(kind: LeafKind, default: json::Value, placement: Placement) -> Self {
        Self {
            kind,
            value: default.clone(),
            default,
            placement,
        }
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self.kind, LeafKind::Extension(_))
    }
}

/// Every control of a compiled form, keyed by address.
#[derive(Default)]
pub struct ControlRegistry {
    controls: HashMap<Path, LeafControl>,
}

impl ControlRegistry {
    pub fn register(&mut self, path: Path, control: LeafControl) {
        if self.controls.contains_key(&path) {
            error!("Address collision at \"{path}\"");
            return;
        }

        self.controls.insert(path, control);
    }

    pub fn get(&self, path: &Path) -> Option<&LeafControl> {
        self.controls.get(path)
    }

    pub fn value(&self, path: &Path) -> Option<&json::Value> {
        self.controls.get(path).map(|control| &control.value)
    }

    pub fn is_interactive(&self, path: &Path) -> bool {
        self.controls
            .get(path)
            .map(|control| {
                control
                    .placement
                    .gates
                    .iter()
                    .all(|gate| self.value(&gate.selector) == Some(&gate.open_value))
            })
            .unwrap_or(false)
    }

    pub fn is_visible(&self, path: &Path, show_advanced: bool, show_special: bool) -> bool {
        let Some(control) = self.controls.get(path) else {
            return false;
        };

        self.is_interactive(path)
            && (show_advanced || !control.placement.advanced)
            && (show_special || !control.placement.special)
    }

    /// Addresses of the controls bound to a document value, sorted.
    pub fn bound_addresses(&self) -> Vec<Path> {
        let mut addresses = self
            .controls
            .iter()
            .filter(|(_, control)| control.is_bound())
            .map(|(path, _)| path.clone())
            .collect::<Vec<_>>();
        addresses.sort();

        addresses
    }

    fn set_displayed(&mut self, path: &Path, value: json::Value) -> bool {
        match self.controls.get_mut(path) {
            Some(control) if control.is_bound() => {
                control.value = value;
                true
            }
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepDirection {
    Up,
    Down,
}

/// Value as produced by a widget, before coercion.
#[derive(Clone, Debug, PartialEq)]
pub enum RawInput {
    Checked(bool),
    Number(f64),
    Text(String),
    Step(StepDirection),
    SelectVariant(String),
    Reset,
}

impl RawInput {
    pub fn from_json(value: &json::Value, kind: &LeafKind) -> Self {
        match value {
            json::Value::Bool(checked) => RawInput::Checked(*checked),
            json::Value::Number(number) => RawInput::Number(number.as_f64().unwrap_or_default()),
            json::Value::String(text) if matches!(kind, LeafKind::Variant { .. }) => {
                RawInput::SelectVariant(text.clone())
            }
            json::Value::String(text) => RawInput::Text(text.clone()),
            other => RawInput::Text(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormEdit {
    Single { path: Path, input: RawInput },
    // One logical action touching several addresses, pushed once
    Batch(Vec<PathValuePair>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushMode {
    Immediate,
    Deferred,
}

fn numeric_value(schema: &NumericSchema, number: f64, integer: bool) -> Option<json::Value> {
    if !number.is_finite() {
        return None;
    }

    let number = schema.clamp(if integer { number.trunc() } else { number });

    if integer {
        Some(json::Value::from(number as i64))
    } else {
        json::Number::from_f64(number).map(json::Value::Number)
    }
}

/// Turn a widget value into the value stored in the document. `None` means the input is
/// rejected and nothing changes.
pub fn coerce(control: &LeafControl, input: RawInput) -> Option<json::Value> {
    if input == RawInput::Reset {
        return Some(control.default.clone());
    }

    match (&control.kind, input) {
        (LeafKind::Boolean, RawInput::Checked(checked)) => Some(json::Value::Bool(checked)),
        (LeafKind::Integer(schema) | LeafKind::Float(schema), input) => {
            let integer = matches!(control.kind, LeafKind::Integer(_));
            let number = match input {
                RawInput::Number(number) => number,
                RawInput::Text(text) => match text.trim().parse::<f64>() {
                    Ok(number) => number,
                    Err(_) => {
                        debug!("Ignoring non-numeric input \"{text}\"");
                        return None;
                    }
                },
                RawInput::Step(direction) => {
                    let current = control.value.as_f64().unwrap_or(schema.default);
                    let step = schema.step.unwrap_or(1.0);
                    let stepped = match direction {
                        StepDirection::Up => current + step,
                        StepDirection::Down => current - step,
                    };

                    // A step never leaves a declared bound, even when the other is missing
                    let stepped = schema.min.map_or(stepped, |min| stepped.max(min));
                    schema.max.map_or(stepped, |max| stepped.min(max))
                }
                _ => return None,
            };

            numeric_value(schema, number, integer)
        }
        (LeafKind::Text, RawInput::Text(text)) => Some(json::Value::String(text)),
        (LeafKind::Variant { tags }, RawInput::SelectVariant(tag) | RawInput::Text(tag)) => {
            if tags.contains(&tag) {
                Some(json::Value::String(tag))
            } else {
                warn!("Unknown variant \"{tag}\"");
                None
            }
        }
        _ => None,
    }
}

/// Common path of every change: update the displayed value, then, unless a document is being
/// applied, store it and optionally push. Returns true if the document was modified.
pub fn handle_change(
    registry: &mut ControlRegistry,
    sync: &mut SessionSync,
    path: &Path,
    value: json::Value,
    push: PushMode,
) -> bool {
    let variant = matches!(
        registry.get(path).map(|control| &control.kind),
        Some(LeafKind::Variant { .. })
    );

    if !registry.set_displayed(path, value.clone()) {
        debug!("No control at \"{path}\", skipping");
        return false;
    }

    if sync.is_applying() {
        return false;
    }

    let res = match (variant, value.as_str(), path.parent()) {
        (true, Some(tag), Some(choice_path)) => sync.set_variant(&choice_path.join(tag)),
        _ => sync.set_param(path, value),
    };
    if let Err(e) = res {
        warn!("Cannot store \"{path}\": {e}");
        return false;
    }

    if push == PushMode::Immediate {
        sync.commit(ChangeKind::Settings);
    }

    true
}

/// A compiled settings form bound to its session document.
pub struct FormEngine {
    schema: SchemaNode,
    sync: SessionSync,
    registry: ControlRegistry,
    root: SettingControl,
    show_advanced: bool,
    show_special: bool,
    unhandled_extensions: BTreeSet<String>,
}

impl FormEngine {
    pub fn new(
        schema: SchemaNode,
        session: SessionDesc,
        backend: Box<dyn SessionBackend>,
        extensions: &ExtensionRegistry,
    ) -> Result<Self> {
        schema.validate()?;

        let mut registry = ControlRegistry::default();
        let mut unhandled_extensions = BTreeSet::new();
        let root = SettingControl::new(
            NestingInfo::root(),
            &schema,
            &mut CompileContext {
                registry: &mut registry,
                extensions,
                unhandled_extensions: &mut unhandled_extensions,
            },
        );

        let mut engine = Self {
            schema,
            sync: SessionSync::new(SessionDesc::default(), backend),
            registry,
            root,
            show_advanced: false,
            show_special: true,
            unhandled_extensions,
        };
        engine.replace_session(session);

        Ok(engine)
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    pub fn session(&self) -> &SessionDesc {
        self.sync.session()
    }

    pub fn sync_mut(&mut self) -> &mut SessionSync {
        &mut self.sync
    }

    /// User edit of a single control. Returns true if the document was modified and pushed.
    pub fn edit(&mut self, path: &Path, input: RawInput) -> bool {
        let Some(control) = self.registry.get(path) else {
            warn!("No control at \"{path}\"");
            return false;
        };
        if !self.registry.is_interactive(path) {
            debug!("Control \"{path}\" is not interactive");
            return false;
        }
        let Some(value) = coerce(control, input) else {
            return false;
        };

        handle_change(
            &mut self.registry,
            &mut self.sync,
            path,
            value,
            PushMode::Immediate,
        )
    }

    /// Set several addresses, then push once.
    pub fn edit_batch(&mut self, pairs: &[PathValuePair]) -> bool {
        let mut modified = false;
        for pair in pairs {
            let Some(control) = self.registry.get(&pair.path) else {
                warn!("No control at \"{}\", skipping", pair.path);
                continue;
            };
            let input = RawInput::from_json(&pair.value, &control.kind);
            let Some(value) = coerce(control, input) else {
                continue;
            };

            modified |= handle_change(
                &mut self.registry,
                &mut self.sync,
                &pair.path,
                value,
                PushMode::Deferred,
            );
        }

        modified && self.sync.commit(ChangeKind::Settings)
    }

    pub fn apply_edit(&mut self, edit: FormEdit) -> bool {
        match edit {
            FormEdit::Single { path, input } => self.edit(&path, input),
            FormEdit::Batch(pairs) => self.edit_batch(&pairs),
        }
    }

    /// Show the values of a settings tree without pushing anything back.
    pub fn apply_document(&mut self, session_settings: &json::Value) {
        let session = SessionDesc {
            session_settings: session_settings.clone(),
            ..self.sync.session().clone()
        };

        self.replace_session(session);
    }

    /// Swap in a document pushed by the server.
    pub fn replace_session(&mut self, session: SessionDesc) {
        let registry = &mut self.registry;
        let leaves = session.setting_leaves();

        self.sync.replace(session, |sync| {
            for (path, value) in leaves {
                handle_change(registry, sync, &path, value, PushMode::Deferred);
            }
        });
    }

    /// Merge a loaded document into the current one, tolerating schema drift.
    pub fn load_session_json(&mut self, session_json: &json::Value) -> Result<()> {
        let mut session = self.sync.session().clone();
        session.merge_from_json(&self.schema, session_json)?;

        self.replace_session(session);

        Ok(())
    }

    /// Handle a non-empty store response. Returns true if the response replaced the document.
    pub fn store_failed(&mut self, body: &str) -> bool {
        match self.sync.store_failed(body) {
            Some(session) => {
                self.replace_session(session);
                true
            }
            None => false,
        }
    }

    pub fn show_advanced(&self) -> bool {
        self.show_advanced
    }

    pub fn set_show_advanced(&mut self, show: bool) {
        self.show_advanced = show;
    }

    pub fn set_show_special(&mut self, show: bool) {
        self.show_special = show;
    }

    pub fn is_visible(&self, path: &Path) -> bool {
        self.registry
            .is_visible(path, self.show_advanced, self.show_special)
    }

    pub fn is_interactive(&self, path: &Path) -> bool {
        self.registry.is_interactive(path)
    }

    pub fn displayed_value(&self, path: &Path) -> Option<&json::Value> {
        self.registry.value(path)
    }

    pub fn control_addresses(&self) -> Vec<Path> {
        self.registry.bound_addresses()
    }

    pub fn unhandled_extensions(&self) -> &BTreeSet<String> {
        &self.unhandled_extensions
    }

    pub fn ui(
        &mut self,
        ui: &mut Ui,
        translations: &Translations,
        audio_devices: &AudioDevicesList,
    ) -> bool {
        let view = FormView {
            registry: &self.registry,
            translations,
            audio_devices,
            show_advanced: self.show_advanced,
            show_special: self.show_special,
        };

        match self.root.ui(ui, &view, false) {
            Some(edit) => self.apply_edit(edit),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dashboard::components::settings_controls::default_extensions,
        session_sync::test_backend::RecordingBackend,
    };
    use vrlink_session::{leaves, parse_path, parse_path_value_pair, session_settings_default};

    fn full_schema() -> SchemaNode {
        json::from_value(json::json!({
            "type": "section",
            "content": { "entries": [
                ["video", { "content": {
                    "type": "section",
                    "content": { "entries": [
                        ["bitrate", { "content": {
                            "type": "integer",
                            "content": { "default": 5, "min": 0, "max": 10, "step": 1 }
                        }}],
                        ["resolutionDropdown", null],
                        ["renderResolution", { "advanced": true, "content": {
                            "type": "choice",
                            "content": {
                                "default": "scale",
                                "variants": [
                                    ["scale", { "content": {
                                        "type": "float",
                                        "content": { "default": 1.0, "min": 0.25, "max": 2.0 }
                                    }}],
                                    ["absolute", { "content": {
                                        "type": "section",
                                        "content": { "entries": [
                                            ["width", { "content": {
                                                "type": "integer", "content": { "default": 1920 }
                                            }}]
                                        ]}
                                    }}]
                                ]
                            }
                        }}],
                        ["recommendedTargetResolution", { "advanced": true, "content": {
                            "type": "choice",
                            "content": {
                                "default": "scale",
                                "variants": [
                                    ["scale", { "content": {
                                        "type": "float",
                                        "content": { "default": 1.0, "min": 0.25, "max": 2.0 }
                                    }}],
                                    ["absolute", null]
                                ]
                            }
                        }}],
                        ["codec", { "content": {
                            "type": "choice",
                            "content": {
                                "default": "A",
                                "variants": [
                                    ["A", { "content": {
                                        "type": "boolean", "content": { "default": true }
                                    }}],
                                    ["B", { "content": {
                                        "type": "integer", "content": { "default": 2 }
                                    }}],
                                    ["C", { "content": {
                                        "type": "text", "content": { "default": "c" }
                                    }}]
                                ]
                            }
                        }}]
                    ]}
                }}],
                ["audio", { "content": {
                    "type": "section",
                    "content": { "entries": [
                        ["gameAudio", { "content": {
                            "type": "switch",
                            "content": {
                                "defaultEnabled": true,
                                "content": {
                                    "type": "section",
                                    "content": { "entries": [
                                        ["volume", { "content": {
                                            "type": "float",
                                            "content": { "default": 0.5, "min": 0.0, "max": 1.0 }
                                        }}],
                                        ["mystery", null]
                                    ]}
                                }
                            }
                        }}],
                        ["bufferOverride", { "content": {
                            "type": "optional",
                            "content": {
                                "defaultSet": false,
                                "content": { "type": "integer", "content": { "default": 5 } }
                            }
                        }}],
                        ["position", { "content": {
                            "type": "array",
                            "content": [
                                { "type": "float", "content": { "default": 0.0 } },
                                { "type": "float", "content": { "default": 1.5 } }
                            ]
                        }}],
                        ["name", { "content": { "type": "text", "content": { "default": "pc" } } }]
                    ]}
                }}]
            ]}
        }))
        .unwrap()
    }

    fn engine_with(schema: SchemaNode, session: SessionDesc) -> (FormEngine, RecordingBackend) {
        let backend = RecordingBackend::default();
        let engine = FormEngine::new(
            schema,
            session,
            Box::new(backend.clone()),
            &default_extensions(),
        )
        .unwrap();

        (engine, backend)
    }

    fn full_engine() -> (FormEngine, RecordingBackend) {
        let schema = full_schema();
        let session = SessionDesc::from_schema(&schema);

        engine_with(schema, session)
    }

    fn pushes(backend: &RecordingBackend) -> usize {
        backend.0.borrow().stores.len()
    }

    fn assert_isomorphic(engine: &FormEngine, document: &json::Value) {
        let document_addresses = leaves(document)
            .into_iter()
            .map(|(path, _)| path)
            .collect::<BTreeSet<_>>();
        let control_addresses = engine
            .control_addresses()
            .into_iter()
            .collect::<BTreeSet<_>>();
        assert_eq!(document_addresses, control_addresses);

        for path in engine.control_addresses() {
            assert_eq!(
                engine.displayed_value(&path),
                vrlink_session::get_value(document, &path),
                "{path}"
            );
        }
    }

    #[test]
    fn addresses_follow_the_document() {
        let (mut engine, _) = full_engine();
        let mut document = session_settings_default(engine.schema());
        document["video"]["bitrate"] = json::json!(7);
        document["video"]["codec"]["variant"] = json::json!("C");
        document["audio"]["position"][1] = json::json!(3.0);
        document["audio"]["gameAudio"]["content"]["volume"] = json::json!(0.75);

        engine.apply_document(&document);

        assert_isomorphic(&engine, &document);
        assert!(engine
            .control_addresses()
            .contains(&parse_path("audio.gameAudio.enabled")));
        assert!(engine
            .control_addresses()
            .contains(&parse_path("audio.bufferOverride.set")));
        assert!(engine
            .control_addresses()
            .contains(&parse_path("video.renderResolution.absolute.width")));
    }

    #[test]
    fn compiling_twice_gives_same_addresses() {
        let (first, _) = full_engine();
        let (second, _) = full_engine();

        assert_eq!(first.control_addresses(), second.control_addresses());
    }

    #[test]
    fn round_trip_keeps_displayed_values() {
        let (mut engine, backend) = full_engine();
        engine.edit(&parse_path("audio.name"), RawInput::Text("studio".into()));

        let before = engine
            .control_addresses()
            .into_iter()
            .map(|path| (path.clone(), engine.displayed_value(&path).cloned()))
            .collect::<Vec<_>>();

        let serialized = json::to_string(&engine.session().session_settings).unwrap();
        engine.apply_document(&json::from_str(&serialized).unwrap());

        for (path, value) in before {
            assert_eq!(engine.displayed_value(&path).cloned(), value);
        }
        assert_eq!(pushes(&backend), 1);
    }

    #[test]
    fn apply_never_pushes() {
        let (mut engine, backend) = full_engine();
        let mut document = engine.session().session_settings.clone();
        document["video"]["codec"]["variant"] = json::json!("B");
        document["audio"]["gameAudio"]["enabled"] = json::json!(false);
        document["audio"]["bufferOverride"]["set"] = json::json!(true);
        document["audio"]["position"] = json::json!([1.0, 2.0]);
        document["audio"]["name"] = json::json!("laptop");

        engine.apply_document(&document);
        engine.replace_session(SessionDesc {
            session_settings: document.clone(),
            ..Default::default()
        });

        assert_eq!(pushes(&backend), 0);
        assert_eq!(engine.session().session_settings, document);
        assert!(!engine.sync_mut().is_applying());
    }

    #[test]
    fn numeric_input_is_clamped() {
        let (mut engine, backend) = full_engine();
        let bitrate = parse_path("video.bitrate");

        engine.edit(&bitrate, RawInput::Text("15".into()));
        assert_eq!(engine.displayed_value(&bitrate), Some(&json::json!(10)));
        assert_eq!(engine.session().get_setting(&bitrate), Some(&json::json!(10)));

        engine.edit(&bitrate, RawInput::Text("-5".into()));
        assert_eq!(engine.session().get_setting(&bitrate), Some(&json::json!(0)));

        engine.edit(&bitrate, RawInput::Text("7.9".into()));
        assert_eq!(engine.session().get_setting(&bitrate), Some(&json::json!(7)));
        assert_eq!(pushes(&backend), 3);

        // Rejected input keeps the prior value and pushes nothing
        assert!(!engine.edit(&bitrate, RawInput::Text("abc".into())));
        assert_eq!(engine.session().get_setting(&bitrate), Some(&json::json!(7)));
        assert_eq!(pushes(&backend), 3);

        engine.edit(&bitrate, RawInput::Step(StepDirection::Up));
        engine.edit(&bitrate, RawInput::Step(StepDirection::Up));
        engine.edit(&bitrate, RawInput::Step(StepDirection::Up));
        assert_eq!(engine.session().get_setting(&bitrate), Some(&json::json!(10)));

        engine.edit(&bitrate, RawInput::Reset);
        assert_eq!(engine.session().get_setting(&bitrate), Some(&json::json!(5)));
    }

    #[test]
    fn choice_keeps_inactive_variants() {
        let (mut engine, backend) = full_engine();
        let selector = parse_path("video.codec.variant");

        assert!(engine.is_interactive(&parse_path("video.codec.A")));
        assert!(!engine.is_interactive(&parse_path("video.codec.B")));

        assert!(engine.edit(&selector, RawInput::SelectVariant("B".into())));

        let settings = &engine.session().session_settings;
        assert_eq!(settings["video"]["codec"]["variant"], json::json!("B"));
        assert_eq!(settings["video"]["codec"]["A"], json::json!(true));
        assert_eq!(settings["video"]["codec"]["C"], json::json!("c"));

        assert!(engine.is_visible(&parse_path("video.codec.B")));
        assert!(!engine.is_visible(&parse_path("video.codec.A")));
        assert!(!engine.is_visible(&parse_path("video.codec.C")));

        // Inert controls reject edits
        assert!(!engine.edit(&parse_path("video.codec.C"), RawInput::Text("x".into())));
        assert!(!engine.edit(&selector, RawInput::SelectVariant("D".into())));
        assert_eq!(pushes(&backend), 1);
    }

    #[test]
    fn gates_hide_but_keep_content() {
        let (mut engine, _) = full_engine();
        let volume = parse_path("audio.gameAudio.content.volume");

        engine.edit(&volume, RawInput::Number(0.8));
        engine.edit(&parse_path("audio.gameAudio.enabled"), RawInput::Checked(false));

        assert!(!engine.is_visible(&volume));
        assert_eq!(engine.session().get_setting(&volume), Some(&json::json!(0.8)));

        let buffer = parse_path("audio.bufferOverride.content");
        assert!(!engine.is_interactive(&buffer));
        engine.edit(&parse_path("audio.bufferOverride.set"), RawInput::Checked(true));
        assert!(engine.is_interactive(&buffer));
    }

    #[test]
    fn advanced_toggle_is_presentation_only() {
        let (mut engine, backend) = full_engine();
        let scale = parse_path("video.renderResolution.scale");
        let document = engine.session().session_settings.clone();

        assert!(!engine.is_visible(&scale));
        engine.set_show_advanced(true);
        assert!(engine.is_visible(&scale));
        engine.set_show_advanced(false);

        assert_eq!(engine.session().session_settings, document);
        assert_eq!(pushes(&backend), 0);
    }

    #[test]
    fn unhandled_extensions_are_reported_once() {
        let (engine, _) = full_engine();

        assert_eq!(
            engine.unhandled_extensions().iter().collect::<Vec<_>>(),
            vec!["mystery"]
        );
    }

    #[test]
    fn preset_pushes_once() {
        let (mut engine, backend) = full_engine();

        let pushed = engine.apply_edit(FormEdit::Batch(vec![
            parse_path_value_pair("video.renderResolution.variant = \"scale\""),
            parse_path_value_pair("video.renderResolution.scale = 0.5"),
            parse_path_value_pair("video.recommendedTargetResolution.variant = \"scale\""),
            parse_path_value_pair("video.recommendedTargetResolution.scale = 0.5"),
            parse_path_value_pair("video.removedSetting = 3"),
        ]));

        assert!(pushed);
        let recorded = backend.0.borrow();
        assert_eq!(recorded.stores.len(), 1);
        let settings = &recorded.stores[0].document.session_settings;
        assert_eq!(settings["video"]["renderResolution"]["scale"], json::json!(0.5));
        assert_eq!(
            settings["video"]["recommendedTargetResolution"]["scale"],
            json::json!(0.5)
        );
    }

    #[test]
    fn bitrate_scenario() {
        let schema = json::from_value(json::json!({
            "type": "section",
            "content": { "entries": [
                ["video", { "content": {
                    "type": "section",
                    "content": { "entries": [
                        ["bitrate", { "content": {
                            "type": "integer",
                            "content": { "default": 30, "min": 5, "max": 100, "step": 1 }
                        }}]
                    ]}
                }}]
            ]}
        }))
        .unwrap();
        let session = SessionDesc {
            session_settings: json::json!({ "video": { "bitrate": 30 } }),
            ..Default::default()
        };
        let (mut engine, backend) = engine_with(schema, session);
        let bitrate = parse_path("video.bitrate");

        engine.edit(&bitrate, RawInput::Number(45.0));
        {
            let recorded = backend.0.borrow();
            assert_eq!(recorded.stores.len(), 1);
            assert_eq!(recorded.stores[0].change_kind, ChangeKind::Settings);
            assert_eq!(
                recorded.stores[0].document.session_settings,
                json::json!({ "video": { "bitrate": 45 } })
            );
        }

        engine.replace_session(SessionDesc {
            session_settings: json::json!({ "video": { "bitrate": 20 } }),
            ..Default::default()
        });
        assert_eq!(engine.displayed_value(&bitrate), Some(&json::json!(20)));
        assert_eq!(pushes(&backend), 1);
    }

    #[test]
    fn steps_respect_a_single_bound() {
        let schema = json::from_value(json::json!({
            "type": "section",
            "content": { "entries": [
                ["audio", { "content": {
                    "type": "section",
                    "content": { "entries": [
                        ["buffer", { "content": {
                            "type": "integer",
                            "content": { "default": 1, "min": 0, "step": 1 }
                        }}],
                        ["gain", { "content": {
                            "type": "float",
                            "content": { "default": 0.75, "max": 1.0, "step": 0.5 }
                        }}]
                    ]}
                }}]
            ]}
        }))
        .unwrap();
        let session = SessionDesc::from_schema(&schema);
        let (mut engine, _backend) = engine_with(schema, session);
        let buffer = parse_path("audio.buffer");
        let gain = parse_path("audio.gain");

        engine.edit(&buffer, RawInput::Step(StepDirection::Down));
        engine.edit(&buffer, RawInput::Step(StepDirection::Down));
        assert_eq!(engine.session().get_setting(&buffer), Some(&json::json!(0)));
        engine.edit(&buffer, RawInput::Step(StepDirection::Up));
        assert_eq!(engine.session().get_setting(&buffer), Some(&json::json!(1)));

        engine.edit(&gain, RawInput::Step(StepDirection::Up));
        assert_eq!(engine.session().get_setting(&gain), Some(&json::json!(1.0)));
        engine.edit(&gain, RawInput::Step(StepDirection::Down));
        engine.edit(&gain, RawInput::Step(StepDirection::Down));
        engine.edit(&gain, RawInput::Step(StepDirection::Down));
        assert_eq!(engine.session().get_setting(&gain), Some(&json::json!(-0.5)));
    }

    #[test]
    fn drift_is_skipped() {
        let (mut engine, backend) = full_engine();
        let mut document = engine.session().session_settings.clone();
        document["video"]["obsolete"] = json::json!(1);

        engine.apply_document(&document);
        assert_eq!(engine.displayed_value(&parse_path("video.obsolete")), None);

        assert!(!engine.edit(&parse_path("video.obsolete"), RawInput::Number(2.0)));
        assert_eq!(pushes(&backend), 0);
    }

    #[test]
    fn server_document_wins_after_failed_store() {
        let (mut engine, backend) = full_engine();
        let mut server_session = engine.session().clone();
        server_session.session_settings["audio"]["name"] = json::json!("server");

        assert!(engine.store_failed(&json::to_string(&server_session).unwrap()));
        assert_eq!(
            engine.displayed_value(&parse_path("audio.name")),
            Some(&json::json!("server"))
        );
        assert_eq!(pushes(&backend), 0);

        assert!(!engine.store_failed("bad gateway"));
        assert_eq!(backend.0.borrow().fetches, 1);
    }

    #[test]
    fn load_merges_drifted_document() {
        let (mut engine, backend) = full_engine();

        engine
            .load_session_json(&json::json!({
                "setupWizard": false,
                "sessionSettings": {
                    "video": { "bitrate": "fast", "codec": { "variant": "C" } },
                    "audio": { "name": "desk" }
                }
            }))
            .unwrap();

        assert!(!engine.session().setup_wizard);
        assert_eq!(
            engine.displayed_value(&parse_path("video.bitrate")),
            Some(&json::json!(5))
        );
        assert_eq!(
            engine.displayed_value(&parse_path("video.codec.variant")),
            Some(&json::json!("C"))
        );
        assert_eq!(
            engine.displayed_value(&parse_path("audio.name")),
            Some(&json::json!("desk"))
        );
        assert_eq!(pushes(&backend), 0);
    }
}
