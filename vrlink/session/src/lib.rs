mod path;
mod schema;

pub use path::*;
pub use schema::*;

use serde::{Deserialize, Serialize};
use serde_json as json;
use std::{
    collections::{HashMap, HashSet},
    net::IpAddr,
};
use vrlink_common::{anyhow::Result, bail, debug, ToAny};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientConnectionDesc {
    pub display_name: String,
    pub manual_ips: HashSet<IpAddr>,
    pub trusted: bool,
}

// Device names as enumerated by the streamer
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AudioDevicesList {
    pub output: Vec<String>,
    pub input: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionDesc {
    pub setup_wizard: bool,
    pub locale: String,
    // The hashmap key is the hostname
    pub client_connections: HashMap<String, ClientConnectionDesc>,
    // Contains every branch of the schema, even unused ones
    pub session_settings: json::Value,
}

impl Default for SessionDesc {
    fn default() -> Self {
        Self {
            setup_wizard: true,
            locale: "system".into(),
            client_connections: HashMap::new(),
            session_settings: json::Value::Object(json::Map::new()),
        }
    }
}

impl SessionDesc {
    pub fn from_schema(schema: &SchemaNode) -> Self {
        Self {
            session_settings: session_settings_default(schema),
            ..Default::default()
        }
    }

    pub fn get_setting(&self, path: &Path) -> Option<&json::Value> {
        get_value(&self.session_settings, path)
    }

    pub fn set_setting(&mut self, path: &Path, value: json::Value) -> Result<()> {
        set_value(&mut self.session_settings, path, value)
    }

    /// Select a choice variant. `radio_path` addresses the variant itself: its last segment is
    /// the tag, which gets stored in the sibling `variant` field.
    pub fn set_variant(&mut self, radio_path: &Path) -> Result<()> {
        let (selector_path, tag) = variant_selector(radio_path)?;

        self.set_setting(&selector_path, json::Value::String(tag))
    }

    pub fn setting_leaves(&self) -> Vec<(Path, json::Value)> {
        leaves(&self.session_settings)
    }

    // If json_value is not a valid representation of SessionDesc (because of version upgrade),
    // extrapolate as much information as possible. `session_settings` is merged node by node
    // following the schema, other fields are taken if their types match.
    pub fn merge_from_json(&mut self, schema: &SchemaNode, json_value: &json::Value) -> Result<()> {
        const SESSION_SETTINGS_STR: &str = "sessionSettings";

        let old_session_json = json::to_value(&*self)?;
        let old_session_fields = old_session_json.as_object().to_any()?;

        let old_settings = if self.session_settings.is_object() {
            self.session_settings.clone()
        } else {
            session_settings_default(schema)
        };
        let session_settings = match json_value.get(SESSION_SETTINGS_STR) {
            Some(new_settings) => extrapolate_session_settings(&old_settings, new_settings, schema),
            None => old_settings,
        };

        let new_fields = old_session_fields
            .iter()
            .filter(|(name, _)| name.as_str() != SESSION_SETTINGS_STR)
            .map(|(name, old_field_value)| {
                let field_value = json_value
                    .get(name)
                    .filter(|new_value| same_json_kind(new_value, old_field_value))
                    .unwrap_or(old_field_value);
                (name.clone(), field_value.clone())
            })
            .chain([(SESSION_SETTINGS_STR.to_owned(), session_settings.clone())])
            .collect();

        *self = match json::from_value(json::Value::Object(new_fields)) {
            Ok(session_desc) => session_desc,
            Err(e) => {
                // Failure to extrapolate other fields is not fatal
                debug!("Discarding session fields after merge error: {e}");
                SessionDesc {
                    session_settings,
                    ..self.clone()
                }
            }
        };

        Ok(())
    }
}

/// Default settings tree for a schema, including the content of every branch.
pub fn session_settings_default(schema: &SchemaNode) -> json::Value {
    schema.default_value()
}

/// Split a variant address into the selector address and the variant tag.
pub fn variant_selector(radio_path: &Path) -> Result<(Path, String)> {
    let Some(PathSegment::Name(tag)) = radio_path.last() else {
        bail!("\"{radio_path}\" does not address a variant");
    };
    let tag = tag.clone();

    let mut selector_path = radio_path.clone();
    selector_path.pop();
    selector_path.push(PathSegment::Name("variant".into()));

    Ok((selector_path, tag))
}

pub fn get_value<'a>(root: &'a json::Value, path: &Path) -> Option<&'a json::Value> {
    path.iter().try_fold(root, |value, segment| match segment {
        PathSegment::Name(name) => value.as_object()?.get(name),
        PathSegment::Index(index) => value.as_array()?.get(*index),
    })
}

pub fn set_value(root: &mut json::Value, path: &Path, new_value: json::Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        *root = new_value;
        return Ok(());
    };

    let mut value = root;
    for (depth, segment) in parents.iter().enumerate() {
        let traversed = Path(path[..=depth].to_vec());
        value = match segment {
            PathSegment::Name(name) => match value {
                json::Value::Object(map) => map
                    .entry(name.clone())
                    .or_insert_with(|| json::Value::Object(json::Map::new())),
                _ => bail!("Cannot traverse \"{traversed}\": parent is not an object"),
            },
            PathSegment::Index(index) => match value {
                json::Value::Array(vec) => match vec.get_mut(*index) {
                    Some(element) => element,
                    None => bail!("Index out of bounds at \"{traversed}\""),
                },
                _ => bail!("Cannot traverse \"{traversed}\": parent is not an array"),
            },
        };
    }

    match (last, value) {
        (PathSegment::Name(name), json::Value::Object(map)) => {
            map.insert(name.clone(), new_value);
        }
        (PathSegment::Index(index), json::Value::Array(vec)) if *index < vec.len() => {
            vec[*index] = new_value;
        }
        _ => bail!("Cannot set \"{path}\""),
    }

    Ok(())
}

/// All scalar values of a settings tree, with their addresses.
pub fn leaves(root: &json::Value) -> Vec<(Path, json::Value)> {
    fn collect(value: &json::Value, path: Path, out: &mut Vec<(Path, json::Value)>) {
        match value {
            json::Value::Object(map) => {
                for (name, child) in map {
                    collect(child, path.join(name.as_str()), out);
                }
            }
            json::Value::Array(vec) => {
                for (index, child) in vec.iter().enumerate() {
                    collect(child, path.join(index), out);
                }
            }
            scalar => out.push((path, scalar.clone())),
        }
    }

    let mut out = vec![];
    collect(root, Path::root(), &mut out);

    out
}

fn same_json_kind(a: &json::Value, b: &json::Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

// Current data extrapolation strategy: match both field name and value type exactly.
// Choice variants that the schema does not know about are dropped.
fn extrapolate_session_settings(
    old_session_settings: &json::Value,
    new_session_settings: &json::Value,
    schema: &SchemaNode,
) -> json::Value {
    let merge_child = |name: &str, content: &SchemaNode| {
        if let Some(new_value_json) = new_session_settings.get(name) {
            extrapolate_session_settings(&old_session_settings[name], new_value_json, content)
        } else {
            old_session_settings[name].clone()
        }
    };

    match schema {
        SchemaNode::Section { entries } => json::Value::Object(
            entries
                .iter()
                .filter(|entry| !matches!(entry.content, SchemaNode::Extension(_)))
                .map(|entry| (entry.name.clone(), merge_child(&entry.name, &entry.content)))
                .collect(),
        ),
        SchemaNode::Choice { variants, .. } => {
            let variant_json = new_session_settings
                .get("variant")
                .filter(|new_variant_json| {
                    new_variant_json
                        .as_str()
                        .map(|tag| variants.iter().any(|variant| variant.name == tag))
                        .unwrap_or(false)
                })
                .cloned()
                .unwrap_or_else(|| old_session_settings["variant"].clone());

            let mut fields = variants
                .iter()
                .filter_map(|variant| {
                    variant
                        .content
                        .as_ref()
                        .map(|content| (variant.name.clone(), merge_child(&variant.name, content)))
                })
                .collect::<json::Map<_, _>>();
            fields.insert("variant".into(), variant_json);

            json::Value::Object(fields)
        }
        SchemaNode::Optional { content, .. } => {
            let set_json = new_session_settings
                .get("set")
                .filter(|new_set_json| new_set_json.is_boolean())
                .cloned()
                .unwrap_or_else(|| old_session_settings["set"].clone());

            json::json!({
                "set": set_json,
                "content": merge_child("content", content),
            })
        }
        SchemaNode::Switch { content, .. } => {
            let enabled_json = new_session_settings
                .get("enabled")
                .filter(|new_enabled_json| new_enabled_json.is_boolean())
                .cloned()
                .unwrap_or_else(|| old_session_settings["enabled"].clone());

            json::json!({
                "enabled": enabled_json,
                "content": merge_child("content", content),
            })
        }
        SchemaNode::Array(elements) => json::Value::Array(
            elements
                .iter()
                .enumerate()
                .map(|(idx, element)| match new_session_settings.get(idx) {
                    Some(new_element) => extrapolate_session_settings(
                        &old_session_settings[idx],
                        new_element,
                        element,
                    ),
                    None => old_session_settings[idx].clone(),
                })
                .collect(),
        ),
        SchemaNode::Boolean { .. } if new_session_settings.is_boolean() => {
            new_session_settings.clone()
        }
        SchemaNode::Integer(_) if new_session_settings.is_i64() || new_session_settings.is_u64() => {
            new_session_settings.clone()
        }
        SchemaNode::Float(_) if new_session_settings.is_number() => new_session_settings.clone(),
        SchemaNode::Text { .. } if new_session_settings.is_string() => {
            new_session_settings.clone()
        }
        _ => old_session_settings.clone(),
    }
}
