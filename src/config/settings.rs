use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::utils::paths;

pub const DEFAULT_REPOSITORY: &str = "localai/localai";
pub const DEFAULT_RUNTIME: &str = "docker";

/// Launcher settings stored in ~/.localai/launcher.yaml
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Image repository every variant tag is appended to
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Container CLI used for the launch command (docker, podman, ...)
    #[serde(default = "default_runtime")]
    pub runtime: String,
}

fn default_repository() -> String {
    DEFAULT_REPOSITORY.to_string()
}

fn default_runtime() -> String {
    DEFAULT_RUNTIME.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            runtime: default_runtime(),
        }
    }
}

impl Settings {
    /// Load settings from an explicit path, or from the default location.
    /// A missing file yields the defaults; nothing is ever written back.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings_path: PathBuf = match path {
            Some(p) => p.to_path_buf(),
            None => match paths::get_settings_file() {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!("No settings location available: {}", e);
                    return Ok(Self::default());
                }
            },
        };

        if !settings_path.exists() {
            tracing::debug!("No settings file at {}, using defaults", settings_path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&settings_path)
            .with_context(|| format!("Failed to read settings: {}", settings_path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse settings file: {}", settings_path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        // An empty file deserializes to null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Full image reference for a variant tag
    pub fn image_ref(&self, tag: &str) -> String {
        format!("{}:{}", self.repository, tag)
    }
}
