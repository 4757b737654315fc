use crate::path::{Path, PathSegment};
use serde::{Deserialize, Serialize};
use serde_json as json;
use std::collections::HashSet;
use vrlink_common::{anyhow::Result, bail};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NumericGuiType {
    Slider,
    #[serde(alias = "upDown")]
    UpDown,
    TextBox,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ChoiceControlType {
    #[default]
    Dropdown,
    ButtonGroup,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NumericSchema {
    pub default: f64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub gui: Option<NumericGuiType>,
}

impl NumericSchema {
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.min.zip(self.max)
    }

    // An explicit hint wins only if the bounds it needs are present
    pub fn gui_type(&self) -> NumericGuiType {
        let bounded = self.bounds().is_some();
        match self.gui {
            Some(NumericGuiType::Slider | NumericGuiType::UpDown) if !bounded => {
                NumericGuiType::TextBox
            }
            Some(gui) => gui,
            None if bounded && self.step.is_some() => NumericGuiType::Slider,
            None if bounded => NumericGuiType::UpDown,
            None => NumericGuiType::TextBox,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        match self.bounds() {
            Some((min, max)) if min <= max => value.clamp(min, max),
            _ => value,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SchemaEntry {
    pub name: String,
    pub advanced: bool,
    pub content: SchemaNode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceVariant {
    pub name: String,
    pub advanced: bool,
    pub content: Option<SchemaNode>,
}

/// Description of a tree of settings. The session settings document mirrors its shape.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(from = "RawSchemaNode")]
pub enum SchemaNode {
    Section {
        entries: Vec<SchemaEntry>,
    },
    Switch {
        default_enabled: bool,
        content_advanced: bool,
        content: Box<SchemaNode>,
    },
    Optional {
        default_set: bool,
        content_advanced: bool,
        content: Box<SchemaNode>,
    },
    Choice {
        default: String,
        variants: Vec<ChoiceVariant>,
        gui: ChoiceControlType,
    },
    Array(Vec<SchemaNode>),
    Integer(NumericSchema),
    Float(NumericSchema),
    Boolean {
        default: bool,
    },
    Text {
        default: String,
    },
    // Field without a generic control, rendered by a widget registered under this name
    Extension(String),
}

impl SchemaNode {
    /// Settings fragment holding the declared defaults. Every branch is present, including
    /// the content of disabled switches and of inactive choice variants.
    pub fn default_value(&self) -> json::Value {
        match self {
            SchemaNode::Section { entries } => json::Value::Object(
                entries
                    .iter()
                    .filter(|entry| !matches!(entry.content, SchemaNode::Extension(_)))
                    .map(|entry| (entry.name.clone(), entry.content.default_value()))
                    .collect(),
            ),
            SchemaNode::Switch {
                default_enabled,
                content,
                ..
            } => json::json!({
                "enabled": default_enabled,
                "content": content.default_value(),
            }),
            SchemaNode::Optional {
                default_set,
                content,
                ..
            } => json::json!({
                "set": default_set,
                "content": content.default_value(),
            }),
            SchemaNode::Choice {
                default, variants, ..
            } => {
                let mut fields = variants
                    .iter()
                    .filter_map(|variant| {
                        variant
                            .content
                            .as_ref()
                            .map(|content| (variant.name.clone(), content.default_value()))
                    })
                    .collect::<json::Map<_, _>>();
                fields.insert("variant".into(), json::Value::String(default.clone()));

                json::Value::Object(fields)
            }
            SchemaNode::Array(elements) => {
                json::Value::Array(elements.iter().map(SchemaNode::default_value).collect())
            }
            SchemaNode::Integer(schema) => json::Value::from(schema.default as i64),
            SchemaNode::Float(schema) => json::Number::from_f64(schema.default)
                .map(json::Value::Number)
                .unwrap_or(json::Value::Null),
            SchemaNode::Boolean { default } => json::Value::Bool(*default),
            SchemaNode::Text { default } => json::Value::String(default.clone()),
            SchemaNode::Extension(_) => json::Value::Null,
        }
    }

    /// Checks the invariants the form relies on: unique names inside a section and choice
    /// defaults that name an existing variant.
    pub fn validate(&self) -> Result<()> {
        validate_node(self, &Path::root())
    }
}

fn validate_node(node: &SchemaNode, path: &Path) -> Result<()> {
    match node {
        SchemaNode::Section { entries } => {
            let mut names = HashSet::new();
            for entry in entries {
                if !names.insert(entry.name.as_str()) {
                    bail!("Duplicate entry \"{}\" in section \"{path}\"", entry.name);
                }
                validate_node(&entry.content, &path.join(entry.name.as_str()))?;
            }
        }
        SchemaNode::Switch { content, .. } | SchemaNode::Optional { content, .. } => {
            validate_node(content, &path.join("content"))?
        }
        SchemaNode::Choice {
            default, variants, ..
        } => {
            if !variants.iter().any(|variant| variant.name == *default) {
                bail!("Default variant \"{default}\" of choice \"{path}\" does not exist");
            }

            let mut names = HashSet::new();
            for variant in variants {
                if variant.name == "variant" || !names.insert(variant.name.as_str()) {
                    bail!("Invalid variant name \"{}\" in \"{path}\"", variant.name);
                }
                if let Some(content) = &variant.content {
                    validate_node(content, &path.join(variant.name.as_str()))?;
                }
            }
        }
        SchemaNode::Array(elements) => {
            for (idx, element) in elements.iter().enumerate() {
                validate_node(element, &path.join(PathSegment::Index(idx)))?;
            }
        }
        SchemaNode::Integer(_)
        | SchemaNode::Float(_)
        | SchemaNode::Boolean { .. }
        | SchemaNode::Text { .. }
        | SchemaNode::Extension(_) => (),
    }

    Ok(())
}

// Wire representation, as served by the streamer web server

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntryData {
    #[serde(default)]
    advanced: bool,
    content: RawSchemaNode,
}

#[derive(Serialize, Deserialize)]
struct RawSection {
    entries: Vec<(String, Option<RawEntryData>)>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSwitch {
    default_enabled: bool,
    #[serde(default)]
    advanced: bool,
    content: Box<RawSchemaNode>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOptional {
    default_set: bool,
    #[serde(default)]
    advanced: bool,
    content: Box<RawSchemaNode>,
}

#[derive(Serialize, Deserialize)]
struct RawChoice {
    default: String,
    variants: Vec<(String, Option<RawEntryData>)>,
    #[serde(default)]
    gui: Option<ChoiceControlType>,
}

#[derive(Serialize, Deserialize)]
struct RawBoolean {
    default: bool,
}

#[derive(Serialize, Deserialize)]
struct RawText {
    default: String,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "camelCase")]
enum RawSchemaNode {
    Section(RawSection),
    Switch(RawSwitch),
    Optional(RawOptional),
    Choice(RawChoice),
    Array(Vec<RawSchemaNode>),
    Integer(NumericSchema),
    Float(NumericSchema),
    Boolean(RawBoolean),
    Text(RawText),
}

impl From<RawSchemaNode> for SchemaNode {
    fn from(raw: RawSchemaNode) -> Self {
        match raw {
            RawSchemaNode::Section(section) => SchemaNode::Section {
                entries: section
                    .entries
                    .into_iter()
                    .map(|(name, maybe_data)| match maybe_data {
                        Some(data) => SchemaEntry {
                            name,
                            advanced: data.advanced,
                            content: data.content.into(),
                        },
                        None => SchemaEntry {
                            content: SchemaNode::Extension(name.clone()),
                            name,
                            advanced: false,
                        },
                    })
                    .collect(),
            },
            RawSchemaNode::Switch(switch) => SchemaNode::Switch {
                default_enabled: switch.default_enabled,
                content_advanced: switch.advanced,
                content: Box::new((*switch.content).into()),
            },
            RawSchemaNode::Optional(optional) => SchemaNode::Optional {
                default_set: optional.default_set,
                content_advanced: optional.advanced,
                content: Box::new((*optional.content).into()),
            },
            RawSchemaNode::Choice(choice) => SchemaNode::Choice {
                default: choice.default,
                variants: choice
                    .variants
                    .into_iter()
                    .map(|(name, maybe_data)| ChoiceVariant {
                        name,
                        advanced: maybe_data.as_ref().map(|d| d.advanced).unwrap_or(false),
                        content: maybe_data.map(|data| data.content.into()),
                    })
                    .collect(),
                gui: choice.gui.unwrap_or_default(),
            },
            RawSchemaNode::Array(elements) => {
                SchemaNode::Array(elements.into_iter().map(Into::into).collect())
            }
            RawSchemaNode::Integer(schema) => SchemaNode::Integer(schema),
            RawSchemaNode::Float(schema) => SchemaNode::Float(schema),
            RawSchemaNode::Boolean(boolean) => SchemaNode::Boolean {
                default: boolean.default,
            },
            RawSchemaNode::Text(text) => SchemaNode::Text {
                default: text.default,
            },
        }
    }
}
