//! Session configuration: where the declarative document comes from.
//!
//! # Loading order
//! 1. Environment variables (`STACKFIXTURE_FILE`, `STACKFIXTURE_RENDER_COMMAND`)
//! 2. TOML configuration file
//! 3. Defaults (`serverless.yml` in the working directory)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{
    DEFAULT_DOCUMENT_FILE, DEFAULT_RENDER_ARGS, DEFAULT_RENDER_PROGRAM, ENV_DOCUMENT_FILE,
    ENV_RENDER_COMMAND,
};
use crate::error::{FixtureError, Result};

/// Root configuration for a fixture session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Where the declarative document text is obtained.
    pub source: DocumentSource,
    /// Whether provider environment bindings are exported before setup.
    pub apply_environment: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            source: DocumentSource::default(),
            apply_environment: true,
        }
    }
}

/// Origin of the declarative document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// Read a document from disk.
    File(PathBuf),
    /// Run an external renderer and read its standard output.
    Renderer(RendererCommand),
}

impl Default for DocumentSource {
    fn default() -> Self {
        Self::File(PathBuf::from(DEFAULT_DOCUMENT_FILE))
    }
}

/// External command that prints the effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererCommand {
    /// Program name or path, looked up on `PATH`.
    pub program: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory for the renderer; inherits the current one if unset.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for RendererCommand {
    fn default() -> Self {
        Self {
            program: DEFAULT_RENDER_PROGRAM.to_owned(),
            args: DEFAULT_RENDER_ARGS.iter().map(|a| (*a).to_owned()).collect(),
            working_dir: None,
        }
    }
}

impl RendererCommand {
    /// Parses a whitespace-separated command line. Returns `None` when empty.
    #[must_use]
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_owned);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            working_dir: None,
        })
    }
}

impl FixtureConfig {
    /// Configuration reading the given document file.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: DocumentSource::File(path.into()),
            ..Self::default()
        }
    }

    /// Loads a TOML file, applies environment overrides, and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FixtureError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::parse(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid configuration TOML.
    pub fn parse(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| FixtureError::Config {
            message: e.to_string(),
        })
    }

    /// Overrides the document source from the environment.
    ///
    /// `STACKFIXTURE_RENDER_COMMAND` wins over `STACKFIXTURE_FILE` when both
    /// are set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(ENV_DOCUMENT_FILE) {
            if path.trim().is_empty() {
                warn!(env_key = ENV_DOCUMENT_FILE, "empty document path in env var, ignoring");
            } else {
                self.source = DocumentSource::File(PathBuf::from(path));
            }
        }
        if let Ok(line) = std::env::var(ENV_RENDER_COMMAND) {
            match RendererCommand::from_command_line(&line) {
                Some(command) => self.source = DocumentSource::Renderer(command),
                None => warn!(env_key = ENV_RENDER_COMMAND, "empty renderer command in env var, ignoring"),
            }
        }
    }

    /// Checks the configuration for unusable values.
    ///
    /// # Errors
    ///
    /// Returns an error if the document path or renderer program is empty.
    pub fn validate(&self) -> Result<()> {
        match &self.source {
            DocumentSource::File(path) if path.as_os_str().is_empty() => Err(FixtureError::Config {
                message: "source.file must not be empty".into(),
            }),
            DocumentSource::Renderer(command) if command.program.trim().is_empty() => {
                Err(FixtureError::Config {
                    message: "source.renderer.program must not be empty".into(),
                })
            }
            _ => Ok(()),
        }
    }
}
