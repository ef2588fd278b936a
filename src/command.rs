//! Commands: a flag set plus a before hook and an action.
//!
//! [`Command::run`] drives one invocation through the full pipeline:
//!
//! 1. every flag is reset to its declared default,
//! 2. env vars and files are applied,
//! 3. the arguments are parsed,
//! 4. required flags are checked,
//! 5. the before hook runs (typically [`init_input_source`](crate::init_input_source)),
//! 6. the action runs.
//!
//! Resetting first means a command can be run many times without values
//! leaking from one invocation into the next.

use tracing::debug;

use crate::env::{Environment, ProcessEnv};
use crate::error::{BoxError, FlagError};
use crate::flag::AnyFlag;
use crate::flagset::FlagSet;

/// Hook run after parsing and before the action.
pub type BeforeFn = Box<dyn FnMut(&mut Context<'_>) -> Result<(), FlagError>>;

/// The command body. Flags are read-only once the before hook has run.
pub type ActionFn = Box<dyn FnMut(&Context<'_>) -> Result<(), BoxError>>;

/// What hooks and actions see during a run.
pub struct Context<'a> {
    flags: &'a mut FlagSet,
    args: Vec<String>,
    env: &'a dyn Environment,
}

impl<'a> Context<'a> {
    pub fn new(flags: &'a mut FlagSet, args: Vec<String>, env: &'a dyn Environment) -> Self {
        Self { flags, args, env }
    }

    pub fn flags(&self) -> &FlagSet {
        &*self.flags
    }

    /// Only reachable from before hooks; actions get a shared `Context`.
    pub fn flags_mut(&mut self) -> &mut FlagSet {
        &mut *self.flags
    }

    /// Positional arguments left after flag parsing.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &dyn Environment {
        self.env
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.flags.is_set(name)
    }
}

pub struct Command {
    name: String,
    aliases: Vec<String>,
    usage: String,
    flags: FlagSet,
    before: Option<BeforeFn>,
    action: Option<ActionFn>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            usage: String::new(),
            flags: FlagSet::new(),
            before: None,
            action: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn flag(mut self, flag: impl AnyFlag + 'static) -> Self {
        self.flags.add(flag);
        self
    }

    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Context<'_>) -> Result<(), FlagError> + 'static,
    {
        self.before = Some(Box::new(hook));
        self
    }

    /// Set the command body.
    ///
    /// The action sees the resolved flags but cannot change them:
    ///
    /// ```compile_fail
    /// flagfig::Command::new("x").action(|ctx| {
    ///     ctx.flags_mut().reset();
    ///     Ok(())
    /// });
    /// ```
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: FnMut(&Context<'_>) -> Result<(), BoxError> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for the command name or one of its aliases.
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Run against the process environment. `args` excludes the command name.
    pub fn run<I, S>(&mut self, args: I) -> Result<(), FlagError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_with_env(args, &ProcessEnv)
    }

    pub fn run_with_env<I, S>(&mut self, args: I, env: &dyn Environment) -> Result<(), FlagError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        debug!(command = %self.name, "running command");
        self.flags.reset();
        self.flags.apply(env)?;
        let args = self.flags.parse(args)?;
        self.flags.check_required()?;

        let mut ctx = Context::new(&mut self.flags, args, env);
        if let Some(before) = self.before.as_mut() {
            before(&mut ctx)?;
        }
        if let Some(action) = self.action.as_mut() {
            action(&ctx).map_err(FlagError::Action)?;
        }
        Ok(())
    }
}

/// Usage block: the command line followed by one line per visible flag.
impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.usage.is_empty() {
            write!(f, " - {}", self.usage)?;
        }
        for flag in self.flags.iter().filter(|fl| !fl.is_hidden()) {
            write!(f, "\n   {flag}")?;
        }
        Ok(())
    }
}
