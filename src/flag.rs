//! Flag descriptors.
//!
//! [`Flag<V>`] is one flat struct for every flag kind: the value cell `V`
//! decides the type, the descriptor carries the name, aliases, usage text,
//! environment variables and fallback file. The object-safe [`AnyFlag`] trait
//! lets a [`FlagSet`](crate::FlagSet) hold flags of mixed types.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::env::{self, Environment};
use crate::error::FlagError;
use crate::source::InputSource;
use crate::value::{
    BoolValue, DurationValue, FlagValue, Float64Value, Int64Slice, Int64Value, IntSlice, IntValue,
    StringSlice, StringValue, Timestamp,
};

/// A named, typed flag.
///
/// ```ignore
/// let port = IntFlag::new("port", IntValue::new(8080))
///     .alias("p")
///     .env("APP_PORT")
///     .usage("Port to listen on");
/// ```
#[derive(Debug, Clone)]
pub struct Flag<V> {
    name: String,
    aliases: Vec<String>,
    usage: String,
    env_vars: Vec<String>,
    file_path: Option<PathBuf>,
    required: bool,
    hidden: bool,
    default_text: Option<String>,
    value: V,
    declared: V,
    has_been_set: bool,
}

pub type IntFlag = Flag<IntValue>;
pub type Int64Flag = Flag<Int64Value>;
pub type Float64Flag = Flag<Float64Value>;
pub type StringFlag = Flag<StringValue>;
pub type BoolFlag = Flag<BoolValue>;
pub type DurationFlag = Flag<DurationValue>;
pub type TimestampFlag = Flag<Timestamp>;
pub type IntSliceFlag = Flag<IntSlice>;
pub type Int64SliceFlag = Flag<Int64Slice>;
pub type StringSliceFlag = Flag<StringSlice>;
/// A flag over a user-defined [`FlagValue`].
pub type GenericFlag<V> = Flag<V>;

impl<V: FlagValue + Clone> Flag<V> {
    /// A flag whose declared default is `value`.
    pub fn new(name: impl Into<String>, value: V) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            usage: String::new(),
            env_vars: Vec::new(),
            file_path: None,
            required: false,
            hidden: false,
            default_text: None,
            declared: value.clone(),
            value,
            has_been_set: false,
        }
    }

    /// Add an equivalent name. Single-character aliases are short flags.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Add an environment variable. Earlier variables take priority.
    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env_vars.push(var.into());
        self
    }

    /// File read as the raw value when none of the env vars is set.
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Text shown instead of the rendered default in usage lines.
    pub fn default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = Some(text.into());
        self
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn file(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}

/// The capabilities every flag exposes to a flag set and to the merger.
pub trait AnyFlag: fmt::Display {
    fn name(&self) -> &str;

    /// The name followed by the aliases.
    fn names(&self) -> Vec<&str>;

    /// Whether the command line or an env var / file supplied the value.
    fn is_set(&self) -> bool;

    fn is_required(&self) -> bool;
    fn is_hidden(&self) -> bool;
    fn takes_value(&self) -> bool;
    fn usage_text(&self) -> &str;
    fn env_vars(&self) -> &[String];

    /// Current value as text; empty for flags that take no value.
    fn get_value(&self) -> String;

    /// Store the env var or file value, if any.
    fn apply(&mut self, env: &dyn Environment) -> Result<(), FlagError>;

    /// Store a value given on the command line.
    fn set_from_cli(&mut self, raw: &str) -> Result<(), FlagError>;

    /// Store the input source's value for this flag's name. Does not mark
    /// the flag as set. Returns [`FlagError::MissingKey`] when absent.
    fn load_from(&mut self, source: &dyn InputSource) -> Result<(), FlagError>;

    /// Restore the declared default and forget any set state.
    fn reset(&mut self);

    /// The value cell, for downcasting to its concrete type.
    fn value_any(&self) -> &dyn Any;
}

impl<V: FlagValue + Clone + 'static> AnyFlag for Flag<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn names(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .collect()
    }

    fn is_set(&self) -> bool {
        self.has_been_set
    }

    fn is_required(&self) -> bool {
        self.required
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn takes_value(&self) -> bool {
        self.value.takes_value()
    }

    fn usage_text(&self) -> &str {
        &self.usage
    }

    fn env_vars(&self) -> &[String] {
        &self.env_vars
    }

    fn get_value(&self) -> String {
        if self.takes_value() {
            self.value.to_string()
        } else {
            String::new()
        }
    }

    fn apply(&mut self, env: &dyn Environment) -> Result<(), FlagError> {
        let Some(raw) = env::resolve(&self.env_vars, self.file_path.as_deref(), env) else {
            return Ok(());
        };
        if raw.is_empty() {
            debug!(flag = %self.name, "empty env value, keeping default");
            return Ok(());
        }

        if self.value.splits_env_value() {
            for piece in raw.split(',') {
                self.value
                    .set(piece.trim())
                    .map_err(|e| e.for_flag(&self.name, &raw))?;
            }
        } else {
            self.value
                .set(&raw)
                .map_err(|e| e.for_flag(&self.name, &raw))?;
        }
        self.value.settle();
        self.has_been_set = true;
        debug!(flag = %self.name, value = %self.value, "flag set from env or file");
        Ok(())
    }

    fn set_from_cli(&mut self, raw: &str) -> Result<(), FlagError> {
        self.value
            .set(raw)
            .map_err(|e| e.for_flag(&self.name, raw))?;
        self.has_been_set = true;
        Ok(())
    }

    fn load_from(&mut self, source: &dyn InputSource) -> Result<(), FlagError> {
        self.value.load_from(&self.name, source)
    }

    fn reset(&mut self) {
        self.value = self.declared.clone();
        self.has_been_set = false;
    }

    fn value_any(&self) -> &dyn Any {
        &self.value
    }
}

fn prefixed(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{name}")
    } else {
        format!("--{name}")
    }
}

/// Usage line: `--port value, -p value\tPort to listen on (default: 8080) [$APP_PORT]`.
impl<V: FlagValue + Clone + 'static> fmt::Display for Flag<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let placeholder = if self.takes_value() { " value" } else { "" };
        let names: Vec<String> = self
            .names()
            .into_iter()
            .map(|n| format!("{}{placeholder}", prefixed(n)))
            .collect();
        write!(f, "{}\t{}", names.join(", "), self.usage)?;

        let default = match &self.default_text {
            Some(text) => text.clone(),
            None => self.declared.to_string(),
        };
        if self.takes_value() && !default.is_empty() {
            write!(f, " (default: {default})")?;
        }
        if !self.env_vars.is_empty() {
            let vars: Vec<String> = self.env_vars.iter().map(|v| format!("${v}")).collect();
            write!(f, " [{}]", vars.join(", "))?;
        }
        Ok(())
    }
}
