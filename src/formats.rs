//! Structured input sources: JSON, TOML and YAML.
//!
//! Each format decodes into the same [`Node`] tree and is served through a
//! [`MapSource`], so lookup and coercion rules do not depend on the format.
//! The top level of a document must be a map.
//!
//! The `*_source_from_flag` factories plug into
//! [`init_input_source`](crate::init_input_source): they read the path from
//! a string flag and load that file when the flag is set. An unset flag
//! produces an empty source, so the config file stays optional.

use std::collections::BTreeMap;
use std::path::Path;

use crate::command::Context;
use crate::env::{Environment, ProcessEnv};
use crate::error::FlagError;
use crate::source::{InputSource, MapSource, Node};

/// Signature of the `*_source_from_flag` factories.
pub type SourceFactory = Box<dyn Fn(&Context<'_>) -> Result<Box<dyn InputSource>, FlagError>>;

fn decode_error(format: &'static str, origin: &str, reason: impl ToString) -> FlagError {
    FlagError::Decode {
        format,
        origin: origin.to_string(),
        reason: reason.to_string(),
    }
}

fn into_source(format: &'static str, origin: &str, root: Node) -> Result<MapSource, FlagError> {
    match root {
        Node::Map(values) => Ok(MapSource::new(origin, values)),
        other => Err(decode_error(
            format,
            origin,
            format!("top level must be a map, found {}", other.kind()),
        )),
    }
}

fn read(path: &Path, env: &dyn Environment) -> Result<String, FlagError> {
    env.read_file(path).map_err(|source| FlagError::IoError {
        path: path.to_path_buf(),
        source,
    })
}

// -- JSON ---------------------------------------------------------------------

fn json_node(value: serde_json::Value) -> Node {
    use serde_json::Value;
    match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Bool(b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Node::Int(i),
            (None, Some(f)) => Node::Float(f),
            (None, None) => Node::Null,
        },
        Value::String(s) => Node::String(s),
        Value::Array(items) => Node::List(items.into_iter().map(json_node).collect()),
        Value::Object(map) => Node::Map(map.into_iter().map(|(k, v)| (k, json_node(v))).collect()),
    }
}

/// Decode a JSON document. `origin` names it in error messages.
pub fn json_source(origin: &str, content: &str) -> Result<MapSource, FlagError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| decode_error("JSON", origin, e))?;
    into_source("JSON", origin, json_node(value))
}

pub fn json_source_from_file(path: impl AsRef<Path>) -> Result<MapSource, FlagError> {
    let path = path.as_ref();
    json_source(&path.display().to_string(), &read(path, &ProcessEnv)?)
}

/// Load JSON from the file named by the string flag `flag`.
pub fn json_source_from_flag(flag: &str) -> SourceFactory {
    from_flag(flag, json_source)
}

// -- TOML ---------------------------------------------------------------------

fn toml_node(value: toml::Value) -> Node {
    use toml::Value;
    match value {
        Value::String(s) => Node::String(s),
        Value::Integer(i) => Node::Int(i),
        Value::Float(f) => Node::Float(f),
        Value::Boolean(b) => Node::Bool(b),
        Value::Datetime(dt) => Node::String(dt.to_string()),
        Value::Array(items) => Node::List(items.into_iter().map(toml_node).collect()),
        Value::Table(table) => Node::Map(toml_map(table)),
    }
}

fn toml_map(table: toml::Table) -> BTreeMap<String, Node> {
    table.into_iter().map(|(k, v)| (k, toml_node(v))).collect()
}

/// Decode a TOML document. `origin` names it in error messages.
pub fn toml_source(origin: &str, content: &str) -> Result<MapSource, FlagError> {
    let table: toml::Table = toml::from_str(content).map_err(|e| decode_error("TOML", origin, e))?;
    Ok(MapSource::new(origin, toml_map(table)))
}

pub fn toml_source_from_file(path: impl AsRef<Path>) -> Result<MapSource, FlagError> {
    let path = path.as_ref();
    toml_source(&path.display().to_string(), &read(path, &ProcessEnv)?)
}

/// Load TOML from the file named by the string flag `flag`.
pub fn toml_source_from_flag(flag: &str) -> SourceFactory {
    from_flag(flag, toml_source)
}

// -- YAML ---------------------------------------------------------------------

#[cfg(feature = "yaml")]
fn yaml_node(origin: &str, value: serde_yaml::Value) -> Result<Node, FlagError> {
    use serde_yaml::Value;
    Ok(match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Bool(b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Node::Int(i),
            (None, Some(f)) => Node::Float(f),
            (None, None) => Node::Null,
        },
        Value::String(s) => Node::String(s),
        Value::Sequence(items) => Node::List(
            items
                .into_iter()
                .map(|item| yaml_node(origin, item))
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(mapping) => {
            let mut map = BTreeMap::new();
            for (k, v) in mapping {
                let key = match k {
                    Value::String(s) => s,
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    other => {
                        return Err(decode_error(
                            "YAML",
                            origin,
                            format!("unsupported mapping key {other:?}"),
                        ));
                    }
                };
                map.insert(key, yaml_node(origin, v)?);
            }
            Node::Map(map)
        }
        Value::Tagged(tagged) => yaml_node(origin, tagged.value)?,
    })
}

/// Decode a YAML document. `origin` names it in error messages.
#[cfg(feature = "yaml")]
pub fn yaml_source(origin: &str, content: &str) -> Result<MapSource, FlagError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| decode_error("YAML", origin, e))?;
    into_source("YAML", origin, yaml_node(origin, value)?)
}

#[cfg(feature = "yaml")]
pub fn yaml_source_from_file(path: impl AsRef<Path>) -> Result<MapSource, FlagError> {
    let path = path.as_ref();
    yaml_source(&path.display().to_string(), &read(path, &ProcessEnv)?)
}

/// Load YAML from the file named by the string flag `flag`.
#[cfg(feature = "yaml")]
pub fn yaml_source_from_flag(flag: &str) -> SourceFactory {
    from_flag(flag, yaml_source)
}

// -- Flag-driven factories ----------------------------------------------------

fn from_flag(
    flag: &str,
    decode: fn(&str, &str) -> Result<MapSource, FlagError>,
) -> SourceFactory {
    let flag = flag.to_string();
    Box::new(move |ctx: &Context<'_>| -> Result<Box<dyn InputSource>, FlagError> {
        if !ctx.is_set(&flag) {
            return Ok(Box::new(MapSource::empty()));
        }
        let Some(path) = ctx.flags().string(&flag) else {
            return Ok(Box::new(MapSource::empty()));
        };
        let path = Path::new(&path);
        let content = read(path, ctx.env())?;
        Ok(Box::new(decode(&path.display().to_string(), &content)?))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn json_numbers_become_ints_or_floats() {
        let src = json_source("inline", r#"{"a": 15, "b": 1.5, "c": [1, 2], "d": null}"#).unwrap();
        assert_eq!(src.int("a").unwrap(), 15);
        assert_eq!(src.float64("b").unwrap(), 1.5);
        assert_eq!(src.int_slice("c").unwrap(), vec![1, 2]);
        assert!(src.int("d").unwrap_err().is_missing_key());
    }

    #[test]
    fn json_nested_key() {
        let src = json_source("inline", r#"{"top": {"test": 15}}"#).unwrap();
        assert_eq!(src.int("top.test").unwrap(), 15);
    }

    #[test]
    fn json_top_level_must_be_map() {
        match json_source("inline", "[1, 2]").unwrap_err() {
            FlagError::Decode { format, reason, .. } => {
                assert_eq!(format, "JSON");
                assert!(reason.contains("list"));
            }
            other => panic!("Expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn json_syntax_error() {
        assert!(matches!(
            json_source("bad.json", "{").unwrap_err(),
            FlagError::Decode { .. }
        ));
    }

    #[test]
    fn toml_tables_and_durations() {
        let src = toml_source(
            "inline",
            r#"
            timeout = "1m"
            [top]
            test = 15
            "#,
        )
        .unwrap();
        assert_eq!(src.int("top.test").unwrap(), 15);
        assert_eq!(src.duration("timeout").unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn toml_datetime_reads_as_string() {
        let src = toml_source("inline", "at = 2006-01-02T15:04:05Z").unwrap();
        assert_eq!(src.string("at").unwrap(), "2006-01-02T15:04:05Z");
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_mapping_and_sequence() {
        let src = yaml_source(
            "inline",
            "top:\n  test: 15\ntags:\n  - a\n  - b\n1: one\n",
        )
        .unwrap();
        assert_eq!(src.int("top.test").unwrap(), 15);
        assert_eq!(src.string_slice("tags").unwrap(), vec!["a", "b"]);
        assert_eq!(src.string("1").unwrap(), "one");
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_scalar_document_is_rejected() {
        assert!(matches!(
            yaml_source("inline", "just text").unwrap_err(),
            FlagError::Decode { .. }
        ));
    }

    #[test]
    fn from_file_reports_missing_path() {
        match json_source_from_file("/definitely/not/here.json").unwrap_err() {
            FlagError::IoError { path, .. } => {
                assert_eq!(path, Path::new("/definitely/not/here.json"))
            }
            other => panic!("Expected IoError, got {other:?}"),
        }
    }

    #[test]
    fn from_file_reads_real_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("conf.toml");
        std::fs::write(&path, "test = 15\n").unwrap();
        assert_eq!(toml_source_from_file(&path).unwrap().int("test").unwrap(), 15);
    }
}
