//! Configuration source wrangling
// (c) 2026 Ferry contributors

use super::{Configuration, SystemDefault};

use anyhow::{Context as _, Result};
use figment::{
    providers::{Env, Format as _, Toml},
    Figment, Provider,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Prefix for environment variables which set configuration fields
pub(crate) const ENV_PREFIX: &str = "FERRY_";

/// Processes and merges all possible configuration sources.
///
/// Run `ferry --config-files` to see which files apply on the current platform.
#[derive(Debug)]
pub struct Manager {
    /// Configuration data
    pub(super) data: Figment,
}

impl Manager {
    fn new(extra_file: Option<&Path>, apply_env: bool, apply_config_files: bool) -> Self {
        let mut new1 = Self {
            data: Figment::new(),
        };
        if apply_config_files {
            for path in Self::config_files() {
                if path.exists() {
                    new1.merge_provider(Toml::file_exact(&path));
                } else {
                    debug!("configuration file {} not present", path.display());
                }
            }
        }
        if let Some(path) = extra_file {
            // N.B. This leaves the data in a fused-error state if the file is absent or unparseable
            new1.merge_provider(Toml::file_exact(path));
        }
        if apply_env {
            new1.merge_provider(Env::prefixed(ENV_PREFIX));
        }
        new1
    }

    /// General constructor for production use
    ///
    /// Reads the system and user configuration files, then the `extra_file` if one was given,
    /// then the environment.
    #[must_use]
    pub fn standard(extra_file: Option<&Path>) -> Self {
        Self::new(extra_file, true, true)
    }

    /// Testing/internal constructor, does not read files from system or apply environment; DOES apply system default.
    #[must_use]
    #[cfg(test)]
    pub(crate) fn without_files() -> Self {
        let mut new1 = Self::new(None, false, false);
        new1.apply_system_default();
        new1
    }

    /// Returns the configuration files we consult, lowest priority first.
    ///
    /// This is a function of platform and the current user.
    #[must_use]
    pub fn config_files() -> Vec<PathBuf> {
        let mut inputs = Vec::new();
        if cfg!(unix) {
            inputs.push(PathBuf::from("/etc/ferry.toml"));
        }
        if let Some(dir) = dirs::config_dir() {
            inputs.push(dir.join("ferry").join("ferry.toml"));
        }
        inputs
    }

    /// Merges in a data set, which is some sort of [figment::Provider](https://docs.rs/figment/latest/figment/trait.Provider.html).
    /// This uses figment's `merge` operation, which prefers to _replace_ existing items.
    ///
    /// The command line is merged in via `Configuration_Optional`, which implements Provider.
    pub fn merge_provider<T>(&mut self, provider: T)
    where
        T: Provider,
    {
        let f = std::mem::take(&mut self.data);
        self.data = f.merge(provider);
    }

    /// Applies the system default settings, at a lower priority than everything else
    pub fn apply_system_default(&mut self) {
        let f = std::mem::take(&mut self.data);
        self.data = f.join(SystemDefault {});
    }

    /// Attempts to extract a particular struct from the data.
    pub fn get<'de, T>(&self) -> Result<T, figment::Error>
    where
        T: Deserialize<'de>,
    {
        self.data.extract_lossy::<T>()
    }

    /// Extracts the full [`Configuration`] and checks it for consistency
    pub fn validated(&self) -> Result<Configuration> {
        self.get::<Configuration>()
            .context("failed to read configuration")?
            .validate()
    }
}
