//! Precedence merging of an input source into a flag set.
//!
//! Layers, lowest to highest:
//!
//! ```text
//! declared default < input source < env var / file < command line
//! ```
//!
//! Env vars, files and the command line are already applied by the time the
//! merger runs and they all mark a flag as set. The merger therefore only
//! touches flags that are still unset, and it never marks them set itself:
//! a value from a config document is a better default, not a user choice.

use tracing::debug;

use crate::command::Context;
use crate::error::FlagError;
use crate::flagset::FlagSet;
use crate::source::InputSource;

/// Fill every unset flag from `source`.
///
/// A key missing from the source leaves the flag alone. Any other error
/// (a type mismatch, an unparsable value) aborts the merge.
pub fn apply_input_source(flags: &mut FlagSet, source: &dyn InputSource) -> Result<(), FlagError> {
    for flag in flags.iter_mut() {
        if flag.is_set() {
            continue;
        }
        match flag.load_from(source) {
            Ok(()) => debug!(
                flag = flag.name(),
                source = source.source(),
                "flag filled from input source"
            ),
            Err(e) if e.is_missing_key() => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Build a before hook that creates an input source with `factory` and
/// merges it into the context's flags.
///
/// ```ignore
/// let cmd = Command::new("serve")
///     .flag(StringFlag::new("load", StringValue::default()))
///     .flag(IntFlag::new("port", IntValue::new(8080)))
///     .before(init_input_source(json_source_from_flag("load")));
/// ```
pub fn init_input_source<F>(factory: F) -> impl FnMut(&mut Context<'_>) -> Result<(), FlagError>
where
    F: Fn(&Context<'_>) -> Result<Box<dyn InputSource>, FlagError>,
{
    move |ctx| {
        let source = factory(&*ctx).map_err(|e| FlagError::InputSource(Box::new(e)))?;
        apply_input_source(ctx.flags_mut(), source.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::fixtures::test::test_flags;
    use crate::formats::toml_source;
    use crate::source::MapSource;
    use chrono::NaiveDate;
    use std::time::Duration;

    #[test]
    fn unset_flag_takes_source_value() {
        let mut flags = test_flags();
        let source = MapSource::empty().with("test", 15);
        apply_input_source(&mut flags, &source).unwrap();
        assert_eq!(flags.int("test"), Some(15));
        assert!(!flags.is_set("test"));
    }

    #[test]
    fn set_flag_keeps_its_value() {
        let mut flags = test_flags();
        flags.parse(["--test", "7"]).unwrap();
        apply_input_source(&mut flags, &MapSource::empty().with("test", 15)).unwrap();
        assert_eq!(flags.int("test"), Some(7));
    }

    #[test]
    fn env_beats_source() {
        let mut flags = test_flags();
        flags.apply(&MapEnv::new().with_var("THE_TEST", "10")).unwrap();
        apply_input_source(&mut flags, &MapSource::empty().with("test", 15)).unwrap();
        assert_eq!(flags.int("test"), Some(10));
    }

    #[test]
    fn missing_key_keeps_default() {
        let mut flags = test_flags();
        apply_input_source(&mut flags, &MapSource::empty()).unwrap();
        assert_eq!(flags.int("test"), Some(7));
    }

    #[test]
    fn type_mismatch_aborts() {
        let mut flags = test_flags();
        let source = MapSource::empty().with("test", "fifteen");
        match apply_input_source(&mut flags, &source).unwrap_err() {
            FlagError::TypeMismatch { key, expected, .. } => {
                assert_eq!(key, "test");
                assert_eq!(expected, "integer");
            }
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn every_flag_kind_loads_from_toml() {
        let mut flags = test_flags();
        let source = toml_source(
            "config.toml",
            r#"
            timeout = "1m30s"
            tags = ["a", "b"]
            ids = [4, 5]
            verbose = true
            ratio = 2
            since = 2006-01-02T15:04:05Z
            "#,
        )
        .unwrap();
        apply_input_source(&mut flags, &source).unwrap();

        let since = NaiveDate::from_ymd_opt(2006, 1, 2)
            .unwrap()
            .and_hms_opt(15, 4, 5)
            .unwrap();
        assert_eq!(flags.duration("timeout"), Some(Duration::from_secs(90)));
        assert_eq!(
            flags.string_slice("tags"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(flags.int_slice("ids"), Some(vec![4, 5]));
        assert_eq!(flags.bool("verbose"), Some(true));
        assert_eq!(flags.float64("ratio"), Some(2.0));
        assert_eq!(flags.timestamp("since"), Some(since));
        for name in ["timeout", "tags", "ids", "verbose", "ratio", "since"] {
            assert!(!flags.is_set(name), "{name} should not be marked set");
        }
    }

    #[test]
    fn slice_of_wrong_element_type_aborts() {
        let mut flags = test_flags();
        let source = MapSource::empty().with("ids", vec!["x", "y"]);
        match apply_input_source(&mut flags, &source).unwrap_err() {
            FlagError::TypeMismatch { key, .. } => assert_eq!(key, "ids"),
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
        assert_eq!(flags.int_slice("ids"), Some(vec![1]));
    }

    #[test]
    fn bool_from_string_is_a_mismatch() {
        let mut flags = test_flags();
        let source = MapSource::empty().with("verbose", "yes");
        assert!(matches!(
            apply_input_source(&mut flags, &source).unwrap_err(),
            FlagError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn unparsable_timestamp_names_the_flag() {
        let mut flags = test_flags();
        let source = MapSource::empty().with("since", "not a date");
        match apply_input_source(&mut flags, &source).unwrap_err() {
            FlagError::InvalidValue { flag, raw, .. } => {
                assert_eq!(flag, "since");
                assert_eq!(raw, "not a date");
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn cli_slice_beats_source_slice() {
        let mut flags = test_flags();
        flags.parse(["--tags", "cli"]).unwrap();
        apply_input_source(&mut flags, &MapSource::empty().with("tags", vec!["file"])).unwrap();
        assert_eq!(flags.string_slice("tags"), Some(vec!["cli".to_string()]));
    }

    #[test]
    fn factory_error_is_wrapped() {
        let mut flags = test_flags();
        let mut hook = init_input_source(|_| Err(FlagError::MissingValue("load".into())));
        let env = MapEnv::new();
        let mut ctx = Context::new(&mut flags, Vec::new(), &env);
        match hook(&mut ctx).unwrap_err() {
            FlagError::InputSource(inner) => {
                assert!(matches!(*inner, FlagError::MissingValue(_)))
            }
            other => panic!("Expected InputSource, got {other:?}"),
        }
    }

    #[test]
    fn hook_merges_factory_source() {
        let mut flags = test_flags();
        let mut hook =
            init_input_source(|_| Ok(Box::new(MapSource::empty().with("top.test", 15))));
        let env = MapEnv::new();
        let mut ctx = Context::new(&mut flags, Vec::new(), &env);
        hook(&mut ctx).unwrap();
        assert_eq!(ctx.flags().int("top.test"), Some(15));
    }
}
