//! Core types for offer templates

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::vocab;

/// A JSON-LD node body: IRI keys (plus `@id`/`@type`) to value arrays.
pub type JsonMap = Map<String, Value>;

/// The six node kinds of an offer graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Offer,
    Permission,
    Prohibition,
    Duty,
    Constraint,
    Target,
}

impl EntityKind {
    /// Kinds that live in pools, in pool order.
    pub const CHILDREN: [EntityKind; 5] = [
        EntityKind::Permission,
        EntityKind::Prohibition,
        EntityKind::Constraint,
        EntityKind::Duty,
        EntityKind::Target,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Permission => "permission",
            Self::Prohibition => "prohibition",
            Self::Duty => "duty",
            Self::Constraint => "constraint",
            Self::Target => "target",
        }
    }

    /// The data key under which a parent references children of this kind.
    pub fn relation_key(self) -> Option<&'static str> {
        match self {
            Self::Offer => None,
            Self::Permission => Some(vocab::ODRL_PERMISSION_KEY),
            Self::Prohibition => Some(vocab::ODRL_PROHIBITION_KEY),
            Self::Duty => Some(vocab::ODRL_DUTY_KEY),
            Self::Constraint => Some(vocab::ODRL_CONSTRAINT_KEY),
            Self::Target => Some(vocab::ODRL_TARGET_KEY),
        }
    }

    /// Presentation class handed to the UI layer.
    pub fn ui_class(self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Permission | Self::Prohibition | Self::Duty => "rule",
            Self::Constraint => "constraint",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "offer" => Ok(Self::Offer),
            "permission" => Ok(Self::Permission),
            "prohibition" => Ok(Self::Prohibition),
            "duty" => Ok(Self::Duty),
            "constraint" => Ok(Self::Constraint),
            "target" => Ok(Self::Target),
            other => Err(Error::InvalidType(other.to_string())),
        }
    }
}

/// Address of a node in a template: its kind plus its id.
///
/// The offer is addressed by kind alone; its id is carried only for
/// diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn offer() -> Self {
        Self::new(EntityKind::Offer, "")
    }

    /// Build a parent reference from the string form used by the UI layer.
    pub fn parse_parent(kind: &str, id: &str) -> Result<Self> {
        kind.parse()
            .map(|kind| Self::new(kind, id))
            .map_err(|_| Error::invalid_parent(kind, id))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Path into a node's `data`: one segment per nesting level. Numeric
/// segments index into arrays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a dotted path such as `foo.0.bar`. IRI keys contain dots, so
    /// paths through IRI keys must be built from segments instead.
    pub fn parse_dotted(path: &str) -> Self {
        Self::new(path.split('.').filter(|s| !s.is_empty()))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(key: &str) -> Self {
        Self(vec![key.to_string()])
    }
}

impl From<String> for FieldPath {
    fn from(key: String) -> Self {
        Self(vec![key])
    }
}

impl From<Vec<&str>> for FieldPath {
    fn from(segments: Vec<&str>) -> Self {
        Self::new(segments)
    }
}

impl From<Vec<String>> for FieldPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // A bare string is a single key, never split on dots.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Key(String),
            Segments(Vec<String>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Key(key) => Self::from(key),
            Repr::Segments(segments) => Self(segments),
        })
    }
}

/// Deep-assign `value` at `path`, creating intermediate containers.
///
/// A missing or scalar intermediate becomes an array when the next segment
/// is numeric and an object otherwise. Arrays are padded with `null`, at most
/// `MAX_PADDING` slots past their current end.
pub fn set_path(data: &mut JsonMap, path: &FieldPath, value: Value) -> Result<()> {
    let (first, rest) = path.segments().split_first().ok_or(Error::EmptyPath)?;
    let slot = data.entry(first.clone()).or_insert(Value::Null);
    set_in(slot, rest, value).map_err(|_| Error::InvalidPath(path.to_string()))
}

/// How far past the end of an array an index may reach.
pub const MAX_PADDING: usize = 64;

fn set_in(slot: &mut Value, segments: &[String], value: Value) -> std::result::Result<(), ()> {
    let Some((head, rest)) = segments.split_first() else {
        *slot = value;
        return Ok(());
    };
    let index = head.parse::<usize>().ok();

    if let (Value::Array(items), Some(i)) = (&mut *slot, index) {
        if i >= items.len() {
            let len = i.checked_add(1).ok_or(())?;
            if len - items.len() > MAX_PADDING + 1 {
                return Err(());
            }
            items.resize(len, Value::Null);
        }
        return set_in(&mut items[i], rest, value);
    }

    if let Value::Object(map) = &mut *slot {
        return set_in(map.entry(head.clone()).or_insert(Value::Null), rest, value);
    }

    *slot = if index.is_some() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    };
    set_in(slot, segments, value)
}

/// Read the value at `path`, if every segment resolves.
pub fn get_path<'a>(data: &'a JsonMap, path: &FieldPath) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    let mut current = data.get(first)?;
    for segment in rest {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// `{"@id": iri}`
pub fn id_ref(iri: impl Into<String>) -> Value {
    json!({ "@id": iri.into() })
}

/// `{"@value": value}`
pub fn literal(value: impl Into<Value>) -> Value {
    json!({ "@value": value.into() })
}

/// The `@id` of a reference or node object.
pub fn ref_id(value: &Value) -> Option<&str> {
    value.get(vocab::KW_ID).and_then(Value::as_str)
}

/// The `@type` IRIs of a node. A missing `@type` is an empty list; a single
/// string is a one-element list.
pub fn types_of(data: &JsonMap) -> Vec<&str> {
    match data.get(vocab::KW_TYPE) {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(s)) => vec![s.as_str()],
        _ => Vec::new(),
    }
}

/// How a constraint value entered in the UI is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Picked from a list of IRIs; stored as a reference.
    Select,
    /// Numeric input; stored as a number literal.
    Number,
    /// Anything else; stored as a string literal.
    Text,
}

impl InputKind {
    /// Map an HTML input type (`select-one`, `number`, `text`, ...) to an
    /// encoding.
    pub fn from_input_type(input_type: Option<&str>) -> Self {
        match input_type {
            Some(t) if t.contains("select") => Self::Select,
            Some("number") => Self::Number,
            _ => Self::Text,
        }
    }

    /// Encode a raw UI value. `None` means the operand was chosen but no
    /// value entered yet, stored as an empty value object.
    pub fn encode(self, raw: Option<&str>) -> Value {
        let Some(raw) = raw else {
            return Value::Object(Map::new());
        };
        match self {
            Self::Select => id_ref(raw),
            Self::Number => literal(parse_number(raw)),
            Self::Text => literal(raw),
        }
    }
}

/// Numeric coercion for form input: blank is 0, integral values stay
/// integers, anything unparsable or non-finite is `null`.
fn parse_number(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::from(0);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
            Value::from(n as i64)
        }
        Ok(n) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Err(_) => Value::Null,
    }
}
