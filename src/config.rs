//! Configuration Resolution
//!
//! Settings come from explicit layers resolved in a fixed order: command line
//! flag, environment, then an interactive prompt that offers a default. The
//! API key may additionally be cached in a small JSON file in the home
//! directory.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::errors::{RevisionsError, Result};
use crate::types::CREDENTIAL_CACHE_FILE;

/// Returns the current user's home directory from `$HOME`
pub fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| RevisionsError::Config("HOME is not set".to_string()))
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedCredential {
    api_key: String,
}

/// JSON file holding a previously used API key
#[derive(Debug, Clone)]
pub struct CredentialCache {
    path: PathBuf,
}

impl CredentialCache {
    /// Uses the cache file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses the default cache file inside `home`
    pub fn in_home(home: &Path) -> Self {
        Self::new(home.join(CREDENTIAL_CACHE_FILE))
    }

    /// Path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached API key
    ///
    /// A missing, unreadable or malformed file counts as no cached key.
    pub fn load(&self) -> Option<String> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no cached API key");
                return None;
            }
        };

        match serde_json::from_slice::<CachedCredential>(&data) {
            Ok(cached) => Some(cached.api_key),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring malformed credential cache");
                None
            }
        }
    }

    /// Writes `api_key` to the cache file, replacing its content
    pub fn save(&self, api_key: &str) -> Result<()> {
        let data = serde_json::to_vec(&CachedCredential {
            api_key: api_key.to_string(),
        })?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Source of interactive answers
pub trait Prompter {
    /// Shows `prompt` and reads one line; `None` at end of input
    fn ask(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Reports a rejected answer
    fn reject(&mut self, message: &str);
}

/// Prompter reading from stdin and writing to stderr
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stderr = io::stderr();
        stderr.write_all(prompt.as_bytes())?;
        stderr.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn reject(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Candidate values of one setting, highest precedence first
#[derive(Debug, Clone)]
pub struct SettingLayers<T> {
    /// Value given on the command line
    pub flag: Option<T>,
    /// Value taken from the environment
    pub environment: Option<T>,
    /// Value offered when prompting
    pub default: Option<T>,
}

impl<T> Default for SettingLayers<T> {
    fn default() -> Self {
        Self {
            flag: None,
            environment: None,
            default: None,
        }
    }
}

impl<T> SettingLayers<T>
where
    T: FromStr + Display,
{
    /// Sets the command line layer
    pub fn with_flag(mut self, value: Option<T>) -> Self {
        self.flag = value;
        self
    }

    /// Sets the environment layer
    pub fn with_environment(mut self, value: Option<T>) -> Self {
        self.environment = value;
        self
    }

    /// Sets the value offered at the prompt
    pub fn with_default(mut self, value: Option<T>) -> Self {
        self.default = value;
        self
    }

    /// Resolves the setting
    ///
    /// The flag wins over the environment. Without either, the user is asked;
    /// an empty answer accepts the default, or asks again when there is none.
    /// Unparsable answers are rejected and asked again.
    pub fn resolve(mut self, label: &str, prompter: &mut dyn Prompter) -> Result<T> {
        if let Some(value) = self.flag.take().or_else(|| self.environment.take()) {
            return Ok(value);
        }

        let prompt = match &self.default {
            Some(default) => format!("{} [{}]: ", label, default),
            None => format!("{}: ", label),
        };

        loop {
            let answer = prompter
                .ask(&prompt)?
                .ok_or_else(|| RevisionsError::Config(format!("no value given for {}", label)))?;
            let answer = answer.trim();

            if answer.is_empty() {
                match self.default.take() {
                    Some(default) => return Ok(default),
                    None => continue,
                }
            }

            match answer.parse() {
                Ok(value) => return Ok(value),
                Err(_) => prompter.reject(&format!("Error: {:?} is not a valid value", answer)),
            }
        }
    }
}
