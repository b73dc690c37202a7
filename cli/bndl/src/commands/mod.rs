//! CLI command implementations.

pub mod chain;
pub mod resolve;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use bndl_resolve::settings::default_settings_path;
use bndl_resolve::{ResolutionEngine, ResolutionError, Settings};

/// Settings, cache directory and engine shared by every command.
pub struct Context {
    pub settings: Settings,
    pub cache_dir: PathBuf,
    pub offline: bool,
    pub engine: ResolutionEngine,
}

impl Context {
    /// Load settings from `settings_path`, or from the default location if
    /// it exists. An explicit `cache_dir` overrides the configured one.
    pub fn load(settings_path: Option<&Path>, cache_dir: Option<PathBuf>, offline: bool) -> Result<Self> {
        let mut settings = match settings_path {
            Some(path) => match Settings::load(path)? {
                Some(settings) => settings,
                None => bail!("settings file not found: {}", path.display()),
            },
            None => Settings::load(&default_settings_path())?.unwrap_or_default(),
        };

        // Resolvers built from settings must agree with the engine's cache.
        if let Some(dir) = cache_dir {
            settings.cache_dir = Some(dir);
        }

        Ok(Context {
            cache_dir: settings.cache_dir(),
            settings,
            offline,
            engine: ResolutionEngine::default(),
        })
    }
}

/// Render an error for the terminal, listing every recorded resolver
/// failure under its phase.
pub fn report(err: &anyhow::Error) -> String {
    let mut out = format!("error: {err:#}\n");
    if let Some(resolution) = err.downcast_ref::<ResolutionError>() {
        for (phase, failure) in resolution.failures() {
            out.push_str(&format!("  [{}] {failure}\n", phase.label()));
        }
    }
    out
}
