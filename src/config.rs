//! `folio.yaml` configuration.
//!
//! ```yaml
//! render:
//!   copy_button: true
//!   links_in_new_tab: true
//!   code_id_prefix: "code-"
//!   wrapper_class: "markdown-content"
//! clipboard:
//!   program: xclip
//!   args: ["-selection", "clipboard"]
//!   revert_after_ms: 2000
//! ```
//!
//! Every field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::render::RenderOptions;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "folio.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderOptions,
    pub clipboard: ClipboardConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Program that reads the copied text on stdin.
    pub program: String,
    pub args: Vec<String>,
    pub revert_after_ms: u64,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        let (program, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
            ("pbcopy", &[])
        } else if cfg!(windows) {
            ("clip", &[])
        } else {
            ("wl-copy", &[])
        };
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            revert_after_ms: 2000,
        }
    }
}

impl ClipboardConfig {
    pub fn revert_after(&self) -> Duration {
        Duration::from_millis(self.revert_after_ms)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // an empty file deserializes to unit, not a mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Loads `explicit` if given, else `folio.yaml` in the working directory
    /// if it exists, else the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading config");
            return Self::load(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            debug!(path = %fallback.display(), "loading config");
            return Self::load(fallback);
        }
        Ok(Self::default())
    }
}
