//! Input sources: read-only documents queried by dotted key path.
//!
//! Every structured format (JSON, TOML, YAML, or a hand-built mapping) is
//! decoded into a tree of [`Node`]s and wrapped in a [`MapSource`]. The
//! precedence merger only ever talks to the [`InputSource`] trait, so callers
//! can plug in their own implementation.
//!
//! # Key lookup
//!
//! A key like `top.test` is first tried verbatim as a top-level key. If that
//! fails, it is split on `.` and each segment selects a field of the nested
//! map. Segments match exactly and case-sensitively. There is no array
//! indexing.
//!
//! # Coercion
//!
//! Getters are strict. Integer getters accept integers, and floats only when
//! the fractional part is zero. Duration getters accept a native duration or a
//! string in the duration grammar. Every other mismatch is a
//! [`FlagError::TypeMismatch`]. A missing key (or an explicit null) is a
//! [`FlagError::MissingKey`].

use std::collections::BTreeMap;
use std::time::Duration;

use crate::duration::{format_duration, parse_duration};
use crate::error::FlagError;

/// A decoded document value.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Duration(Duration),
    List(Vec<Node>),
    Map(BTreeMap<String, Node>),
}

impl Node {
    /// Short type name used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "bool",
            Node::Int(_) => "integer",
            Node::Float(_) => "float",
            Node::String(_) => "string",
            Node::Duration(_) => "duration",
            Node::List(_) => "list",
            Node::Map(_) => "map",
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(i) => Some(*i),
            Node::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                // i64::MAX is not representable as f64; the bound is exclusive.
                if *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl From<bool> for Node {
    fn from(v: bool) -> Self {
        Node::Bool(v)
    }
}

impl From<i32> for Node {
    fn from(v: i32) -> Self {
        Node::Int(v.into())
    }
}

impl From<i64> for Node {
    fn from(v: i64) -> Self {
        Node::Int(v)
    }
}

impl From<f64> for Node {
    fn from(v: f64) -> Self {
        Node::Float(v)
    }
}

impl From<&str> for Node {
    fn from(v: &str) -> Self {
        Node::String(v.to_string())
    }
}

impl From<String> for Node {
    fn from(v: String) -> Self {
        Node::String(v)
    }
}

impl From<Duration> for Node {
    fn from(v: Duration) -> Self {
        Node::Duration(v)
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(v: Vec<T>) -> Self {
        Node::List(v.into_iter().map(Into::into).collect())
    }
}

/// A read-only document queryable by dotted key path.
pub trait InputSource {
    /// Diagnostic identifier, usually the file path.
    fn source(&self) -> &str;

    fn int(&self, key: &str) -> Result<i32, FlagError>;
    fn int64(&self, key: &str) -> Result<i64, FlagError>;
    fn duration(&self, key: &str) -> Result<Duration, FlagError>;
    fn float64(&self, key: &str) -> Result<f64, FlagError>;
    fn string(&self, key: &str) -> Result<String, FlagError>;
    fn string_slice(&self, key: &str) -> Result<Vec<String>, FlagError>;
    fn int_slice(&self, key: &str) -> Result<Vec<i32>, FlagError>;
    fn int64_slice(&self, key: &str) -> Result<Vec<i64>, FlagError>;
    fn bool(&self, key: &str) -> Result<bool, FlagError>;

    /// Any scalar, rendered as text for a user-defined value's `set`.
    fn generic(&self, key: &str) -> Result<String, FlagError>;
}

/// An [`InputSource`] over a map of decoded [`Node`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapSource {
    origin: String,
    values: BTreeMap<String, Node>,
}

impl MapSource {
    pub fn new(origin: impl Into<String>, values: BTreeMap<String, Node>) -> Self {
        Self {
            origin: origin.into(),
            values,
        }
    }

    /// A source with no keys. Every lookup reports a missing key.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a top-level entry. Handy for building sources in code.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    fn lookup(&self, key: &str) -> Option<&Node> {
        if let Some(node) = self.values.get(key) {
            return Some(node);
        }
        let mut segments = key.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            match current {
                Node::Map(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    fn node(&self, key: &str) -> Result<&Node, FlagError> {
        match self.lookup(key) {
            Some(Node::Null) | None => Err(FlagError::MissingKey {
                key: key.to_string(),
                origin: self.origin.clone(),
            }),
            Some(node) => Ok(node),
        }
    }

    fn mismatch(&self, key: &str, expected: &'static str, found: impl Into<String>) -> FlagError {
        FlagError::TypeMismatch {
            key: key.to_string(),
            origin: self.origin.clone(),
            expected,
            found: found.into(),
        }
    }

    fn to_i64(&self, key: &str, node: &Node) -> Result<i64, FlagError> {
        node.as_i64()
            .ok_or_else(|| self.mismatch(key, "integer", node.kind()))
    }

    fn to_i32(&self, key: &str, node: &Node) -> Result<i32, FlagError> {
        let wide = self.to_i64(key, node)?;
        i32::try_from(wide)
            .map_err(|_| self.mismatch(key, "integer", format!("out of range {wide}")))
    }

    fn list(&self, key: &str) -> Result<&[Node], FlagError> {
        match self.node(key)? {
            Node::List(items) => Ok(items),
            other => Err(self.mismatch(key, "list", other.kind())),
        }
    }
}

impl InputSource for MapSource {
    fn source(&self) -> &str {
        &self.origin
    }

    fn int(&self, key: &str) -> Result<i32, FlagError> {
        let node = self.node(key)?;
        self.to_i32(key, node)
    }

    fn int64(&self, key: &str) -> Result<i64, FlagError> {
        let node = self.node(key)?;
        self.to_i64(key, node)
    }

    fn duration(&self, key: &str) -> Result<Duration, FlagError> {
        match self.node(key)? {
            Node::Duration(d) => Ok(*d),
            Node::String(s) => parse_duration(s).map_err(|reason| {
                self.mismatch(key, "duration", format!("string '{s}' ({reason})"))
            }),
            other => Err(self.mismatch(key, "duration", other.kind())),
        }
    }

    fn float64(&self, key: &str) -> Result<f64, FlagError> {
        match self.node(key)? {
            Node::Float(f) => Ok(*f),
            Node::Int(i) => Ok(*i as f64),
            other => Err(self.mismatch(key, "float", other.kind())),
        }
    }

    fn string(&self, key: &str) -> Result<String, FlagError> {
        match self.node(key)? {
            Node::String(s) => Ok(s.clone()),
            other => Err(self.mismatch(key, "string", other.kind())),
        }
    }

    fn string_slice(&self, key: &str) -> Result<Vec<String>, FlagError> {
        self.list(key)?
            .iter()
            .map(|item| match item {
                Node::String(s) => Ok(s.clone()),
                other => Err(self.mismatch(
                    key,
                    "list of strings",
                    format!("{} element", other.kind()),
                )),
            })
            .collect()
    }

    fn int_slice(&self, key: &str) -> Result<Vec<i32>, FlagError> {
        self.list(key)?
            .iter()
            .map(|item| self.to_i32(key, item))
            .collect()
    }

    fn int64_slice(&self, key: &str) -> Result<Vec<i64>, FlagError> {
        self.list(key)?
            .iter()
            .map(|item| self.to_i64(key, item))
            .collect()
    }

    fn bool(&self, key: &str) -> Result<bool, FlagError> {
        match self.node(key)? {
            Node::Bool(b) => Ok(*b),
            other => Err(self.mismatch(key, "bool", other.kind())),
        }
    }

    fn generic(&self, key: &str) -> Result<String, FlagError> {
        match self.node(key)? {
            Node::Bool(b) => Ok(b.to_string()),
            Node::Int(i) => Ok(i.to_string()),
            Node::Float(f) => Ok(f.to_string()),
            Node::String(s) => Ok(s.clone()),
            Node::Duration(d) => Ok(format_duration(*d)),
            other => Err(self.mismatch(key, "scalar", other.kind())),
        }
    }
}
