//! Typed command-line flags whose values come from several layers: declared
//! defaults, config documents, environment variables, files and the command
//! line itself.
//!
//! ```ignore
//! let mut cmd = Command::new("serve")
//!     .flag(StringFlag::new("load", StringValue::default()).usage("Config file"))
//!     .flag(IntFlag::new("port", IntValue::new(8080)).alias("p").env("APP_PORT"))
//!     .before(init_input_source(json_source_from_flag("load")))
//!     .action(|ctx| {
//!         println!("listening on {}", ctx.flags().int("port").unwrap_or_default());
//!         Ok(())
//!     });
//! cmd.run(std::env::args().skip(1))?;
//! ```
//!
//! With `{"port": 9000}` in `app.json`, `serve --load app.json` listens on
//! 9000, `APP_PORT=9100 serve --load app.json` on 9100 and
//! `serve --load app.json -p 9200` on 9200.
//!
//! # Layer precedence
//!
//! ```text
//! Declared default      IntFlag::new("port", IntValue::new(8080))
//!        ↑ overridden by
//! Input source          JSON / TOML / YAML document, or any InputSource
//!        ↑ overridden by
//! Env var or file       .env("APP_PORT"), .file_path("/run/secrets/port")
//!        ↑ overridden by
//! Command line          --port 9200
//! ```
//!
//! Env vars, files and the command line mark a flag as *set*. The input
//! source merger only fills flags that are still unset and never marks them
//! set, so [`FlagSet::is_set`] keeps meaning "the user chose this value".
//!
//! # Flags and values
//!
//! A flag is a [`Flag<V>`] descriptor around a value cell `V`. The built-in
//! cells live in [`value`]: integers (`i32` and `i64`), `f64`, strings,
//! bools, durations, timestamps and integer / string slices. Anything that
//! implements [`FlagValue`] works through [`GenericFlag`].
//!
//! Durations use the grammar `300ms`, `1.5h`, `2h45m` ([`parse_duration`]).
//! Timestamps take a chrono layout and default to RFC 3339.
//!
//! Slices accumulate one element per occurrence; the first occurrence drops
//! the declared defaults. From an env var or file, a slice value is split on
//! commas, and a later command-line occurrence replaces it instead of adding
//! to it.
//!
//! # Env vars and files
//!
//! Each flag lists its env vars in priority order. The first one present
//! wins, even when empty; an empty value leaves the default in place. When
//! none is present the whole content of the flag's file is used, untrimmed.
//! A missing file is silently skipped.
//!
//! # Input sources
//!
//! An [`InputSource`] answers typed lookups by key. Keys are tried verbatim
//! first, then as dotted paths into nested maps: the flag `top.test` finds
//! `{"top": {"test": 15}}`. Absent keys leave a flag alone; a value of the
//! wrong type is an error.
//!
//! [`init_input_source`] turns a factory into a before hook. The factories
//! in this crate ([`json_source_from_flag`], [`toml_source_from_flag`] and,
//! with the `yaml` feature, `yaml_source_from_flag`) read the document path
//! from a string flag and yield an empty source when that flag is unset.
//!
//! # Clap adapter
//!
//! With the `clap` feature (on by default), `to_clap_args` and
//! `apply_matches` let an app keep clap as its parser and still use the env,
//! file and input-source layers.
//!
//! # Logging
//!
//! The crate emits [`tracing`] events at `debug` level for every layer that
//! sets a value, and at `warn` level for unreadable flag files. Install any
//! subscriber to see them.
//!
//! # Error handling
//!
//! All fallible operations return [`FlagError`]. Errors name the flag, key
//! or file involved. See the [`error`] module for the full set.

pub mod error;
pub mod source;
pub mod value;

#[cfg(feature = "clap")]
mod cli;
mod command;
mod duration;
mod env;
mod flag;
mod flagset;
mod formats;
mod merge;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::{apply_matches, to_clap_args};
pub use command::{ActionFn, BeforeFn, Command, Context};
pub use duration::{format_duration, parse_duration};
pub use env::{Environment, MapEnv, ProcessEnv};
pub use error::{BoxError, FlagError};
pub use flag::{
    AnyFlag, BoolFlag, DurationFlag, Flag, Float64Flag, GenericFlag, Int64Flag, Int64SliceFlag,
    IntFlag, IntSliceFlag, StringFlag, StringSliceFlag, TimestampFlag,
};
pub use flagset::FlagSet;
#[cfg(feature = "yaml")]
pub use formats::{yaml_source, yaml_source_from_file, yaml_source_from_flag};
pub use formats::{
    SourceFactory, json_source, json_source_from_file, json_source_from_flag, toml_source,
    toml_source_from_file, toml_source_from_flag,
};
pub use merge::{apply_input_source, init_input_source};
pub use source::{InputSource, MapSource, Node};
pub use value::{
    BoolValue, DurationValue, FlagValue, Float64Value, Int64Slice, Int64Value, IntSlice, IntValue,
    StringSlice, StringValue, Timestamp,
};
