//! Typed value cells.
//!
//! A cell holds a flag's current value and knows how to parse one raw string
//! into it. Three shapes cover the built-in flag types:
//!
//! - [`Scalar<T>`] for single values (`i32`, `i64`, `f64`, `String`, `bool`,
//!   `Duration`). Every `set` overwrites.
//! - [`Slice<T>`] for repeated values (`i32`, `i64`, `String`). The first
//!   `set` discards the declared defaults, later calls append.
//! - [`Timestamp`] for date-times parsed with a chrono layout string.
//!
//! User-defined types implement [`FlagValue`] directly and are used through
//! [`GenericFlag`](crate::GenericFlag).
//!
//! # Slice serialization
//!
//! [`Slice::serialize`] produces `sl:::` followed by a JSON array. Passing
//! that string back to `set` replaces the whole sequence, so a previously
//! accumulated slice can be re-applied as a default through the string-only
//! `set` interface. In-process code should prefer [`Slice::replace`].

use std::fmt::{self, Write as _};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;

use crate::duration::{format_duration, parse_duration};
use crate::error::FlagError;
use crate::source::InputSource;

/// Reserved prefix marking a serialized slice payload.
pub const SERIALIZED_PREFIX: &str = "sl:::";

/// A value a flag can hold.
pub trait FlagValue: fmt::Display + fmt::Debug {
    /// Parse `raw` and store it.
    fn set(&mut self, raw: &str) -> Result<(), FlagError>;

    /// Whether the flag expects an argument on the command line.
    fn takes_value(&self) -> bool {
        true
    }

    /// Whether an environment or file value is a comma-separated list.
    fn splits_env_value(&self) -> bool {
        false
    }

    /// Called after an environment or file value was stored, so the next
    /// command-line `set` replaces it instead of accumulating onto it.
    fn settle(&mut self) {}

    /// Pull this value from an input source under `key`.
    ///
    /// Returns [`FlagError::MissingKey`] when the source has no such key.
    fn load_from(&mut self, key: &str, source: &dyn InputSource) -> Result<(), FlagError> {
        let raw = source.generic(key)?;
        self.set(&raw).map_err(|e| e.for_flag(key, &raw))
    }
}

/// An element type usable in [`Scalar`] and [`Slice`] cells.
pub trait Element: Clone + PartialEq + fmt::Debug + 'static {
    /// Type name used in parse errors.
    const KIND: &'static str;
    const TAKES_VALUE: bool = true;

    fn parse(raw: &str) -> Result<Self, String>;
    fn render(&self) -> String;
    fn lookup(source: &dyn InputSource, key: &str) -> Result<Self, FlagError>;
}

/// An element type that can also be repeated in a [`Slice`].
pub trait ListElement: Element + Into<serde_json::Value> + DeserializeOwned {
    fn lookup_list(source: &dyn InputSource, key: &str) -> Result<Vec<Self>, FlagError>;
}

fn parse_error<T: Element>(raw: &str, reason: impl fmt::Display) -> FlagError {
    FlagError::Parse {
        kind: T::KIND,
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}

impl Element for i32 {
    const KIND: &'static str = "int";

    fn parse(raw: &str) -> Result<Self, String> {
        raw.parse().map_err(|e: std::num::ParseIntError| e.to_string())
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn lookup(source: &dyn InputSource, key: &str) -> Result<Self, FlagError> {
        source.int(key)
    }
}

impl ListElement for i32 {
    fn lookup_list(source: &dyn InputSource, key: &str) -> Result<Vec<Self>, FlagError> {
        source.int_slice(key)
    }
}

impl Element for i64 {
    const KIND: &'static str = "int64";

    fn parse(raw: &str) -> Result<Self, String> {
        raw.parse().map_err(|e: std::num::ParseIntError| e.to_string())
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn lookup(source: &dyn InputSource, key: &str) -> Result<Self, FlagError> {
        source.int64(key)
    }
}

impl ListElement for i64 {
    fn lookup_list(source: &dyn InputSource, key: &str) -> Result<Vec<Self>, FlagError> {
        source.int64_slice(key)
    }
}

impl Element for f64 {
    const KIND: &'static str = "float64";

    fn parse(raw: &str) -> Result<Self, String> {
        raw.parse().map_err(|e: std::num::ParseFloatError| e.to_string())
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn lookup(source: &dyn InputSource, key: &str) -> Result<Self, FlagError> {
        source.float64(key)
    }
}

impl Element for String {
    const KIND: &'static str = "string";

    fn parse(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }

    fn render(&self) -> String {
        self.clone()
    }

    fn lookup(source: &dyn InputSource, key: &str) -> Result<Self, FlagError> {
        source.string(key)
    }
}

impl ListElement for String {
    fn lookup_list(source: &dyn InputSource, key: &str) -> Result<Vec<Self>, FlagError> {
        source.string_slice(key)
    }
}

impl Element for bool {
    const KIND: &'static str = "bool";
    const TAKES_VALUE: bool = false;

    /// An empty string means the flag was given without a value.
    fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "" | "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err("expected true or false".into()),
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn lookup(source: &dyn InputSource, key: &str) -> Result<Self, FlagError> {
        source.bool(key)
    }
}

impl Element for Duration {
    const KIND: &'static str = "duration";

    fn parse(raw: &str) -> Result<Self, String> {
        parse_duration(raw)
    }

    fn render(&self) -> String {
        format_duration(*self)
    }

    fn lookup(source: &dyn InputSource, key: &str) -> Result<Self, FlagError> {
        source.duration(key)
    }
}

/// A single-valued cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar<T> {
    value: T,
    has_been_set: bool,
}

pub type IntValue = Scalar<i32>;
pub type Int64Value = Scalar<i64>;
pub type Float64Value = Scalar<f64>;
pub type StringValue = Scalar<String>;
pub type BoolValue = Scalar<bool>;
pub type DurationValue = Scalar<Duration>;

impl<T: Element> Scalar<T> {
    pub fn new(value: impl Into<T>) -> Self {
        Self {
            value: value.into(),
            has_been_set: false,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn has_been_set(&self) -> bool {
        self.has_been_set
    }

    /// Store an already-typed value, bypassing string parsing.
    pub fn assign(&mut self, value: T) {
        self.value = value;
        self.has_been_set = true;
    }
}

impl<T: Element + Default> Default for Scalar<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            has_been_set: false,
        }
    }
}

impl<T: Element> fmt::Display for Scalar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value.render())
    }
}

impl<T: Element> FlagValue for Scalar<T> {
    fn set(&mut self, raw: &str) -> Result<(), FlagError> {
        let parsed = T::parse(raw).map_err(|reason| parse_error::<T>(raw, reason))?;
        self.assign(parsed);
        Ok(())
    }

    fn takes_value(&self) -> bool {
        T::TAKES_VALUE
    }

    fn load_from(&mut self, key: &str, source: &dyn InputSource) -> Result<(), FlagError> {
        let value = T::lookup(source, key)?;
        self.assign(value);
        Ok(())
    }
}

/// A repeatable cell accumulating one element per `set`.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice<T> {
    items: Vec<T>,
    has_been_set: bool,
}

pub type IntSlice = Slice<i32>;
pub type Int64Slice = Slice<i64>;
pub type StringSlice = Slice<String>;

impl<T: ListElement> Slice<T> {
    /// A slice holding `defaults` until the first `set`.
    pub fn new<I>(defaults: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<T>,
    {
        Self {
            items: defaults.into_iter().map(Into::into).collect(),
            has_been_set: false,
        }
    }

    pub fn value(&self) -> &[T] {
        &self.items
    }

    pub fn has_been_set(&self) -> bool {
        self.has_been_set
    }

    /// Replace the whole sequence.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.has_been_set = true;
    }

    /// Append one element; the first append drops the declared defaults.
    pub fn append(&mut self, item: T) {
        if !self.has_been_set {
            self.items.clear();
            self.has_been_set = true;
        }
        self.items.push(item);
    }

    /// Prefix plus JSON array; accepted back by `set` as a full replacement.
    pub fn serialize(&self) -> String {
        let items: Vec<serde_json::Value> = self.items.iter().cloned().map(Into::into).collect();
        format!("{SERIALIZED_PREFIX}{}", serde_json::Value::Array(items))
    }
}

impl<T: ListElement> Default for Slice<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            has_been_set: false,
        }
    }
}

impl<T: ListElement> fmt::Display for Slice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.items.iter().map(Element::render).collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

impl<T: ListElement> FlagValue for Slice<T> {
    fn set(&mut self, raw: &str) -> Result<(), FlagError> {
        if let Some(payload) = raw.strip_prefix(SERIALIZED_PREFIX) {
            let items: Vec<T> = serde_json::from_str(payload).map_err(|e| FlagError::Parse {
                kind: "serialized slice",
                raw: raw.to_string(),
                reason: e.to_string(),
            })?;
            self.replace(items);
            return Ok(());
        }
        let item = T::parse(raw).map_err(|reason| parse_error::<T>(raw, reason))?;
        self.append(item);
        Ok(())
    }

    fn splits_env_value(&self) -> bool {
        true
    }

    fn settle(&mut self) {
        self.has_been_set = false;
    }

    fn load_from(&mut self, key: &str, source: &dyn InputSource) -> Result<(), FlagError> {
        let items = T::lookup_list(source, key)?;
        self.replace(items);
        Ok(())
    }
}

/// A date-time cell parsed with a chrono layout (RFC 3339 when unset).
///
/// Layouts without a time component (`%Y-%m-%d`) resolve to midnight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timestamp {
    value: Option<NaiveDateTime>,
    layout: Option<String>,
    has_been_set: bool,
}

impl Timestamp {
    pub fn new(value: NaiveDateTime) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// Set the layout used by later `set` calls.
    pub fn set_layout(&mut self, layout: impl Into<String>) {
        self.layout = Some(layout.into());
    }

    /// Store `value` unless the cell was already set.
    pub fn set_timestamp(&mut self, value: NaiveDateTime) {
        if !self.has_been_set {
            self.value = Some(value);
            self.has_been_set = true;
        }
    }

    pub fn value(&self) -> Option<&NaiveDateTime> {
        self.value.as_ref()
    }

    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    fn parse(&self, raw: &str) -> Result<NaiveDateTime, String> {
        match &self.layout {
            None => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.naive_utc())
                .map_err(|e| e.to_string()),
            Some(layout) => DateTime::parse_from_str(raw, layout)
                .map(|dt| dt.naive_utc())
                .or_else(|_| NaiveDateTime::parse_from_str(raw, layout))
                .or_else(|full_err| {
                    NaiveDate::parse_from_str(raw, layout)
                        .ok()
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                        .ok_or_else(|| full_err.to_string())
                }),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, &self.layout) {
            (None, _) => Ok(()),
            (Some(ts), Some(layout)) => {
                // Layouts chrono cannot render fall back to RFC 3339.
                let mut out = String::new();
                match write!(out, "{}", ts.and_utc().format(layout)) {
                    Ok(()) => f.write_str(&out),
                    Err(_) => write!(f, "{}", ts.and_utc().to_rfc3339()),
                }
            }
            (Some(ts), None) => write!(f, "{}", ts.and_utc().to_rfc3339()),
        }
    }
}

impl FlagValue for Timestamp {
    fn set(&mut self, raw: &str) -> Result<(), FlagError> {
        let parsed = self.parse(raw).map_err(|reason| FlagError::Parse {
            kind: "timestamp",
            raw: raw.to_string(),
            reason,
        })?;
        self.value = Some(parsed);
        self.has_been_set = true;
        Ok(())
    }

    fn load_from(&mut self, key: &str, source: &dyn InputSource) -> Result<(), FlagError> {
        let raw = source.string(key)?;
        self.set(&raw).map_err(|e| e.for_flag(key, &raw))
    }
}
