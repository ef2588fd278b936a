//! Clap adapter for flagfig.
//!
//! This module is the **optional integration layer** between flagfig's own
//! tokenizer and the [clap](https://docs.rs/clap) CLI parser. It is compiled
//! only when the `clap` Cargo feature is enabled (on by default).
//!
//! Apps that already parse with clap can keep doing so and still get the
//! env var, file and input-source layers:
//!
//! ```ignore
//! let mut flags = FlagSet::new().with(IntFlag::new("port", IntValue::new(80)));
//! flags.apply(&ProcessEnv)?;
//! let matches = clap::Command::new("app")
//!     .args(to_clap_args(&flags))
//!     .get_matches();
//! apply_matches(&mut flags, &matches)?;
//! apply_input_source(&mut flags, &toml_source_from_file("app.toml")?)?;
//! ```
//!
//! Only values clap saw on the command line are copied back, so declared
//! defaults and env values are not overwritten by clap's own defaults.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches};

use crate::error::FlagError;
use crate::flag::AnyFlag;
use crate::flagset::FlagSet;

/// One clap [`Arg`] per flag, keyed by the flag's name.
///
/// Single-character aliases become short flags, longer ones visible aliases.
pub fn to_clap_args(flags: &FlagSet) -> Vec<Arg> {
    flags.iter().map(to_clap_arg).collect()
}

fn to_clap_arg(flag: &dyn AnyFlag) -> Arg {
    let mut arg = Arg::new(flag.name().to_string())
        .long(flag.name().to_string())
        .help(flag.usage_text().to_string())
        .hide(flag.is_hidden());

    for alias in flag.names().into_iter().skip(1) {
        let mut chars = alias.chars();
        arg = match (chars.next(), chars.next()) {
            (Some(short), None) => arg.short(short),
            _ => arg.visible_alias(alias.to_string()),
        };
    }

    if flag.takes_value() {
        arg.action(ArgAction::Append).num_args(1)
    } else {
        arg.action(ArgAction::SetTrue)
    }
}

/// Copy every value clap parsed from the command line into `flags`.
pub fn apply_matches(flags: &mut FlagSet, matches: &ArgMatches) -> Result<(), FlagError> {
    for flag in flags.iter_mut() {
        let id = flag.name().to_string();
        if matches.value_source(&id) != Some(ValueSource::CommandLine) {
            continue;
        }
        if !flag.takes_value() {
            flag.set_from_cli("true")?;
            continue;
        }
        let raw = matches
            .try_get_raw(&id)
            .map_err(|_| FlagError::UnknownFlag(id.clone()))?;
        for value in raw.into_iter().flatten() {
            flag.set_from_cli(&value.to_string_lossy())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::flag::{BoolFlag, IntFlag, StringSliceFlag};
    use crate::value::{BoolValue, IntValue, StringSlice};

    fn flags() -> FlagSet {
        FlagSet::new()
            .with(IntFlag::new("port", IntValue::new(80)).alias("p").env("PORT"))
            .with(BoolFlag::new("verbose", BoolValue::default()).alias("loud"))
            .with(StringSliceFlag::new("tag", StringSlice::new(["default"])))
    }

    fn parse(flags: &mut FlagSet, argv: &[&str]) {
        let matches = clap::Command::new("app")
            .args(to_clap_args(flags))
            .try_get_matches_from(argv.iter().copied())
            .unwrap();
        apply_matches(flags, &matches).unwrap();
    }

    #[test]
    fn short_alias_and_long_alias() {
        let mut flags = flags();
        parse(&mut flags, &["app", "-p", "81", "--loud"]);
        assert_eq!(flags.int("port"), Some(81));
        assert_eq!(flags.bool("verbose"), Some(true));
    }

    #[test]
    fn repeated_values_accumulate() {
        let mut flags = flags();
        parse(&mut flags, &["app", "--tag", "a", "--tag", "b"]);
        assert_eq!(
            flags.string_slice("tag"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn absent_flags_keep_env_values() {
        let mut flags = flags();
        flags.apply(&MapEnv::new().with_var("PORT", "90")).unwrap();
        parse(&mut flags, &["app"]);
        assert_eq!(flags.int("port"), Some(90));
        assert_eq!(flags.bool("verbose"), Some(false));
        assert!(!flags.is_set("verbose"));
    }

    #[test]
    fn bad_value_names_flag() {
        let mut flags = flags();
        let matches = clap::Command::new("app")
            .args(to_clap_args(&flags))
            .try_get_matches_from(["app", "--port", "http"])
            .unwrap();
        match apply_matches(&mut flags, &matches).unwrap_err() {
            FlagError::InvalidValue { flag, raw, .. } => {
                assert_eq!(flag, "port");
                assert_eq!(raw, "http");
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn hidden_flags_are_hidden() {
        let flags = FlagSet::new().with(IntFlag::new("secret", IntValue::new(0)).hidden());
        let args = to_clap_args(&flags);
        assert!(args[0].is_hide_set());
    }
}
