//! Environment variable and fallback-file resolution for a single flag.
//!
//! Access to the process environment and the filesystem goes through the
//! [`Environment`] trait so tests can pass synthetic data instead of mutating
//! real process state.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Where environment variables and fallback files are read from.
pub trait Environment {
    /// The value of `name`, or `None` when it is not set.
    fn var(&self, name: &str) -> Option<String>;

    /// The full contents of the file at `path`.
    fn read_file(&self, path: &Path) -> io::Result<String>;
}

/// The real process environment and filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// An in-memory environment with a fixed set of variables and files.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
    files: HashMap<PathBuf, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }
}

/// Find the value for a flag from its environment variables, then its file.
///
/// Variables are checked in declaration order and the first one that is set
/// wins, even if its value is empty: `Some("")` tells the caller a variable
/// was present but must not override anything. When no variable is set the
/// whole content of `file_path` is returned. An unreadable file counts as
/// not found.
pub fn resolve(
    env_vars: &[String],
    file_path: Option<&Path>,
    env: &dyn Environment,
) -> Option<String> {
    for name in env_vars {
        let name = name.trim();
        if let Some(value) = env.var(name) {
            debug!(var = name, "flag value found in environment");
            return Some(value);
        }
    }

    let path = file_path?;
    match env.read_file(path) {
        Ok(content) => {
            debug!(path = %path.display(), "flag value read from file");
            Some(content)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read flag value file");
            None
        }
    }
}
