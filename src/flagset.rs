//! An ordered collection of flags and the command-line tokenizer.
//!
//! A [`FlagSet`] owns its flags as `Box<dyn AnyFlag>` so flags of different
//! value types live side by side. Every name and alias maps to one flag.
//!
//! # Parsing rules
//!
//! - `--name value`, `-name value`, `--name=value` and `-name=value` are
//!   equivalent.
//! - Flags that take no value (bools) accept only the inline form for an
//!   explicit value; bare `--verbose` means `true`.
//! - `--` ends flag parsing, and so does the first argument that does not
//!   start with `-`. A lone `-` is positional.
//! - Everything left over is returned as positional arguments.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::env::Environment;
use crate::error::FlagError;
use crate::flag::AnyFlag;
use crate::value::{
    BoolValue, DurationValue, Float64Value, Int64Slice, Int64Value, IntSlice, IntValue,
    StringSlice, StringValue, Timestamp,
};

#[derive(Default)]
pub struct FlagSet {
    flags: Vec<Box<dyn AnyFlag>>,
    index: HashMap<String, usize>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a flag. Name clashes are reported by [`apply`](Self::apply).
    pub fn add(&mut self, flag: impl AnyFlag + 'static) {
        self.flags.push(Box::new(flag));
    }

    pub fn with(mut self, flag: impl AnyFlag + 'static) -> Self {
        self.add(flag);
        self
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn AnyFlag> {
        self.flags.iter().map(|f| f.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn AnyFlag + 'static)> {
        self.flags.iter_mut().map(|f| f.as_mut())
    }

    /// Apply env vars and files to every flag, then register its names.
    pub fn apply(&mut self, env: &dyn Environment) -> Result<(), FlagError> {
        self.index.clear();
        for (i, flag) in self.flags.iter_mut().enumerate() {
            flag.apply(env)?;
            for name in flag.names() {
                if self.index.insert(name.to_string(), i).is_some() {
                    return Err(FlagError::DuplicateFlag(name.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Restore every flag's declared default.
    pub fn reset(&mut self) {
        for flag in &mut self.flags {
            flag.reset();
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index
            .get(name)
            .copied()
            .or_else(|| self.flags.iter().position(|f| f.names().contains(&name)))
    }

    /// The flag registered under `name` or one of its aliases.
    pub fn lookup(&self, name: &str) -> Option<&dyn AnyFlag> {
        self.position(name).map(|i| self.flags[i].as_ref())
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut (dyn AnyFlag + 'static)> {
        let i = self.position(name)?;
        Some(self.flags[i].as_mut())
    }

    /// True when the named flag was set on the command line, an env var or
    /// a file. Input sources never count.
    pub fn is_set(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|f| f.is_set())
    }

    /// Fail with every required flag that was not set.
    pub fn check_required(&self) -> Result<(), FlagError> {
        let missing: Vec<String> = self
            .flags
            .iter()
            .filter(|f| f.is_required() && !f.is_set())
            .map(|f| f.name().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FlagError::RequiredFlags(missing))
        }
    }

    /// Consume flag tokens from `args` and return the positional remainder.
    pub fn parse<I, S>(&mut self, args: I) -> Result<Vec<String>, FlagError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rargs: Vec<String> = args.into_iter().map(Into::into).collect();
        rargs.reverse();

        while let Some(arg) = rargs.pop() {
            if arg == "--" {
                break;
            }
            if arg.len() < 2 || !arg.starts_with('-') {
                rargs.push(arg);
                break;
            }

            let body = arg.strip_prefix("--").unwrap_or(&arg[1..]);
            if body.is_empty() || body.starts_with('-') || body.starts_with('=') {
                return Err(FlagError::BadFlagSyntax(arg));
            }
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (body, None),
            };

            let flag = self
                .lookup_mut(name)
                .ok_or_else(|| FlagError::UnknownFlag(name.to_string()))?;
            let raw = match inline {
                Some(value) => value,
                None if !flag.takes_value() => "true".to_string(),
                None => rargs
                    .pop()
                    .ok_or_else(|| FlagError::MissingValue(name.to_string()))?,
            };
            debug!(flag = name, value = %raw, "flag set from command line");
            flag.set_from_cli(&raw)?;
        }

        rargs.reverse();
        Ok(rargs)
    }

    /// The value cell of the named flag, if it exists and holds a `V`.
    pub fn value<V: 'static>(&self, name: &str) -> Option<&V> {
        self.lookup(name)?.value_any().downcast_ref::<V>()
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        self.value::<IntValue>(name).map(|v| *v.value())
    }

    pub fn int64(&self, name: &str) -> Option<i64> {
        self.value::<Int64Value>(name).map(|v| *v.value())
    }

    pub fn float64(&self, name: &str) -> Option<f64> {
        self.value::<Float64Value>(name).map(|v| *v.value())
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.value::<StringValue>(name).map(|v| v.value().clone())
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.value::<BoolValue>(name).map(|v| *v.value())
    }

    pub fn duration(&self, name: &str) -> Option<Duration> {
        self.value::<DurationValue>(name).map(|v| *v.value())
    }

    pub fn timestamp(&self, name: &str) -> Option<NaiveDateTime> {
        self.value::<Timestamp>(name)?.value().copied()
    }

    pub fn int_slice(&self, name: &str) -> Option<Vec<i32>> {
        self.value::<IntSlice>(name).map(|v| v.value().to_vec())
    }

    pub fn int64_slice(&self, name: &str) -> Option<Vec<i64>> {
        self.value::<Int64Slice>(name).map(|v| v.value().to_vec())
    }

    pub fn string_slice(&self, name: &str) -> Option<Vec<String>> {
        self.value::<StringSlice>(name).map(|v| v.value().to_vec())
    }
}

impl std::fmt::Debug for FlagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.flags.iter().map(|flag| flag.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::flag::{BoolFlag, DurationFlag, IntFlag, IntSliceFlag, StringFlag};

    fn sample() -> FlagSet {
        FlagSet::new()
            .with(IntFlag::new("test", IntValue::new(7)).alias("t").env("THE_TEST"))
            .with(BoolFlag::new("verbose", BoolValue::default()).alias("v"))
            .with(StringFlag::new("name", StringValue::new("anon")))
            .with(IntSliceFlag::new("id", IntSlice::default()))
    }

    #[test]
    fn parses_all_value_forms() {
        let mut flags = sample();
        flags.apply(&MapEnv::new()).unwrap();
        let rest = flags
            .parse(["--test", "9", "-name=bob", "-v", "--id=1", "--id", "2"])
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(flags.int("test"), Some(9));
        assert_eq!(flags.string("name").as_deref(), Some("bob"));
        assert_eq!(flags.bool("verbose"), Some(true));
        assert_eq!(flags.int_slice("id"), Some(vec![1, 2]));
    }

    #[test]
    fn alias_reaches_same_flag() {
        let mut flags = sample();
        flags.apply(&MapEnv::new()).unwrap();
        flags.parse(["-t", "3"]).unwrap();
        assert_eq!(flags.int("test"), Some(3));
        assert!(flags.is_set("t"));
        assert!(flags.is_set("test"));
    }

    #[test]
    fn bool_accepts_inline_false() {
        let mut flags = sample();
        flags.parse(["--verbose=false"]).unwrap();
        assert_eq!(flags.bool("verbose"), Some(false));
        assert!(flags.is_set("verbose"));
    }

    #[test]
    fn stops_at_first_positional() {
        let mut flags = sample();
        let rest = flags.parse(["--test", "1", "file", "--name", "x"]).unwrap();
        assert_eq!(rest, vec!["file", "--name", "x"]);
        assert_eq!(flags.string("name").as_deref(), Some("anon"));
    }

    #[test]
    fn double_dash_ends_flags() {
        let mut flags = sample();
        let rest = flags.parse(["--", "--test", "1"]).unwrap();
        assert_eq!(rest, vec!["--test", "1"]);
        assert!(!flags.is_set("test"));
    }

    #[test]
    fn lone_dash_is_positional() {
        let mut flags = sample();
        assert_eq!(flags.parse(["-"]).unwrap(), vec!["-"]);
    }

    #[test]
    fn parse_errors() {
        let mut flags = sample();
        match flags.parse(["--nope"]).unwrap_err() {
            FlagError::UnknownFlag(name) => assert_eq!(name, "nope"),
            other => panic!("Expected UnknownFlag, got {other:?}"),
        }
        match flags.parse(["--test"]).unwrap_err() {
            FlagError::MissingValue(name) => assert_eq!(name, "test"),
            other => panic!("Expected MissingValue, got {other:?}"),
        }
        assert!(matches!(
            flags.parse(["---test"]).unwrap_err(),
            FlagError::BadFlagSyntax(_)
        ));
        assert!(matches!(
            flags.parse(["-=1"]).unwrap_err(),
            FlagError::BadFlagSyntax(_)
        ));
        match flags.parse(["--test", "x"]).unwrap_err() {
            FlagError::InvalidValue { flag, .. } => assert_eq!(flag, "test"),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn apply_uses_env_and_detects_duplicates() {
        let mut flags = sample();
        flags.apply(&MapEnv::new().with_var("THE_TEST", "10")).unwrap();
        assert_eq!(flags.int("test"), Some(10));
        assert!(flags.is_set("test"));

        let mut dup = sample().with(DurationFlag::new("t", DurationValue::default()));
        match dup.apply(&MapEnv::new()).unwrap_err() {
            FlagError::DuplicateFlag(name) => assert_eq!(name, "t"),
            other => panic!("Expected DuplicateFlag, got {other:?}"),
        }
    }

    #[test]
    fn required_flags_are_reported_together() {
        let mut flags = FlagSet::new()
            .with(StringFlag::new("a", StringValue::default()).required())
            .with(StringFlag::new("b", StringValue::default()).required())
            .with(StringFlag::new("c", StringValue::default()).required());
        flags.parse(["--b", "x"]).unwrap();
        match flags.check_required().unwrap_err() {
            FlagError::RequiredFlags(names) => assert_eq!(names, vec!["a", "c"]),
            other => panic!("Expected RequiredFlags, got {other:?}"),
        }
    }

    #[test]
    fn typed_getter_wrong_type_is_none() {
        let flags = sample();
        assert_eq!(flags.int64("test"), None);
        assert_eq!(flags.int("missing"), None);
    }

    #[test]
    fn reset_clears_values() {
        let mut flags = sample();
        flags.parse(["--test", "1"]).unwrap();
        flags.reset();
        assert_eq!(flags.int("test"), Some(7));
        assert!(!flags.is_set("test"));
    }
}
