use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json as json;
use std::{
    fmt::{self, Display},
    ops::{Deref, DerefMut},
};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Name(String),
    Index(usize),
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Name(name) => write!(f, ".{name}"),
            PathSegment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Name(name.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Name(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Address of a value inside the settings tree. The same address identifies the control
/// bound to that value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(pub Vec<PathSegment>);

impl Path {
    pub fn root() -> Self {
        Self(vec![])
    }

    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut path = self.clone();
        path.0.push(segment.into());

        path
    }

    pub fn parent(&self) -> Option<Path> {
        (!self.0.is_empty()).then(|| Path(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn last_name(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|segment| match segment {
            PathSegment::Name(name) => Some(name.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl Deref for Path {
    type Target = Vec<PathSegment>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Path {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .iter()
                .map(ToString::to_string)
                .collect::<String>()
                .trim_start_matches('.')
        )
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(parse_path(&String::deserialize(deserializer)?))
    }
}

// Best effort parsing. It may accept some invalid syntax
pub fn parse_path(path: &str) -> Path {
    let segments = path
        .split('.')
        .filter(|s| !s.is_empty())
        .flat_map(|s| {
            s.trim_end_matches(']')
                .split('[')
                .map(|p| p.trim_end_matches(']'))
                .filter(|p| !p.is_empty())
                .map(|p| {
                    p.parse::<usize>()
                        .map(PathSegment::Index)
                        .unwrap_or_else(|_| PathSegment::Name(p.to_string()))
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Path(segments)
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathValuePair {
    pub path: Path,
    pub value: json::Value,
}

impl Display for PathValuePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.path, self.value)
    }
}

// Best effort parsing. It may accept some invalid syntax
pub fn parse_path_value_pair(string: &str) -> PathValuePair {
    let (path_str, value_str) = string.split_once('=').unwrap_or((string, ""));
    let path_str = path_str.trim();
    let value_str = value_str.trim();

    let path = parse_path(path_str);
    let value = json::from_str(value_str).unwrap_or(json::Value::String(value_str.to_string()));

    PathValuePair { path, value }
}

impl Serialize for PathValuePair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PathValuePair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(parse_path_value_pair(&String::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display_and_parse() {
        let path = Path::root()
            .join("headset")
            .join("position")
            .join(1)
            .join("content");

        assert_eq!(path.to_string(), "headset.position[1].content");
        assert_eq!(parse_path("headset.position[1].content"), path);
    }

    #[test]
    fn parse_consecutive_indices() {
        assert_eq!(
            parse_path("matrix[0][2]"),
            Path(vec!["matrix".into(), 0.into(), 2.into()])
        );
    }

    #[test]
    fn parse_path_value_pairs() {
        let pair = parse_path_value_pair("video.bitrate = 45");
        assert_eq!(pair.path, parse_path("video.bitrate"));
        assert_eq!(pair.value, json::json!(45));

        let pair = parse_path_value_pair("audio.device = Speakers (USB)");
        assert_eq!(pair.value, json::json!("Speakers (USB)"));
    }

    #[test]
    fn last_name_skips_indices() {
        assert_eq!(parse_path("a.b[3]").last_name(), Some("b"));
        assert_eq!(Path::root().last_name(), None);
    }
}
