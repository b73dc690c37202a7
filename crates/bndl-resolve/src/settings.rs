//! `settings.toml` parsing.
//!
//! Settings are optional: a missing file means "use the built-in chains and
//! defaults". The file lives at `~/.bndl/settings.toml` unless the caller
//! points elsewhere.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ResolutionError, Result};

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Custom resolver chain, by registered name. Overrides the built-in
    /// chains, including offline mode, when non-empty.
    #[serde(default)]
    pub resolvers: Option<Vec<String>>,
    /// Bundle cache directory (default: `~/.bndl/cache`).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Bundle repository used by the `registry` resolver.
    #[serde(default)]
    pub repository: RepositorySettings,
    /// Container tooling used by the container resolvers.
    #[serde(default)]
    pub container: ContainerSettings,
    /// HTTP behaviour of the `uri` resolver.
    #[serde(default)]
    pub http: HttpSettings,
}

/// `[repository]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositorySettings {
    /// Repository root (default: `~/.bndl/repository`).
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Organization reported for bundles resolved from the repository.
    #[serde(default)]
    pub org: Option<String>,
}

/// `[container]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerSettings {
    /// Container CLI to invoke.
    #[serde(default = "default_container_program")]
    pub program: String,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        ContainerSettings {
            program: default_container_program(),
        }
    }
}

fn default_container_program() -> String {
    "docker".to_string()
}

/// `[http]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// Parse settings from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load settings from a file. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Settings =
            toml::from_str(&content).map_err(|e| ResolutionError::Settings {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        Ok(Some(settings))
    }

    /// The custom resolver chain, if one is configured.
    pub fn resolvers(&self) -> Option<&[String]> {
        self.resolvers.as_deref()
    }

    /// Repository root, falling back to `~/.bndl/repository`.
    pub fn repository_path(&self) -> PathBuf {
        self.repository
            .path
            .clone()
            .unwrap_or_else(|| bndl_home().join("repository"))
    }

    /// Cache directory, falling back to `~/.bndl/cache`.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| bndl_home().join("cache"))
    }
}

/// `~/.bndl`, or `.bndl` in the working directory when `HOME` is unset.
pub fn bndl_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".bndl")
}

/// Default settings file location.
pub fn default_settings_path() -> PathBuf {
    bndl_home().join("settings.toml")
}
