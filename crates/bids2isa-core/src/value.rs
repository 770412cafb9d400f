//! Recursive metadata values.
//!
//! Sidecar documents have no shared schema, so they are held as a tagged tree
//! rather than deserialized into structs. Maps are `BTreeMap`s to keep every
//! traversal deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Leaf text that marks a field as deliberately unset.
pub const UNDEFINED_SENTINEL: &str = "UNDEFINED";

pub type MetaMap = BTreeMap<String, MetaValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<MetaValue>),
    Map(MetaMap),
}

impl MetaValue {
    pub fn as_map(&self) -> Option<&MetaMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// True for leaves that must never produce a column.
    pub fn is_empty_leaf(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty() || s == UNDEFINED_SENTINEL,
            Self::List(items) => items.is_empty(),
            Self::Map(_) | Self::Bool(_) | Self::Integer(_) | Self::Float(_) => false,
        }
    }

    /// Cell text for this value; `None` for empty leaves.
    pub fn render(&self) -> Option<String> {
        if self.is_empty_leaf() {
            return None;
        }
        Some(self.to_string())
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&Value> for MetaValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            Value::Object(obj) => Self::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for MetaValue {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}

/// Shortest round-trip form; integral values keep a trailing `.0`.
pub fn format_float(x: f64) -> String {
    let s = format!("{x}");
    if x.is_finite() && !s.contains('.') {
        format!("{s}.0")
    } else {
        s
    }
}
