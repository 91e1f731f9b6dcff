//! Release configuration resolved from defaults, `bumpkit.toml` and flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "bumpkit.toml";

/// One layer of release options. Unset fields defer to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionOptions {
    /// Stage every change and create a release commit.
    pub commit: Option<bool>,
    /// Append `[skip ci]` to the release commit message.
    pub skip_ci: Option<bool>,
    /// Skip changelog generation.
    pub no_changelog: Option<bool>,
}

impl VersionOptions {
    /// Overlays `other` on top of `self`.
    pub fn merge(self, other: VersionOptions) -> VersionOptions {
        VersionOptions {
            commit: other.commit.or(self.commit),
            skip_ci: other.skip_ci.or(self.skip_ci),
            no_changelog: other.no_changelog.or(self.no_changelog),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    version: VersionOptions,
}

/// Fully resolved options for one release run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    pub commit: bool,
    pub skip_ci: bool,
    pub no_changelog: bool,
    /// Workspace root; every relative path is resolved against it.
    pub cwd: PathBuf,
}

impl ReleaseConfig {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            commit: true,
            skip_ci: true,
            no_changelog: false,
            cwd: cwd.into(),
        }
    }

    /// Resolves the configuration for `cwd`: built-in defaults, then the
    /// `[version]` table of `bumpkit.toml` if present, then `overrides`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `cwd` is not a directory or the
    /// config file cannot be parsed.
    pub fn resolve(cwd: impl AsRef<Path>, overrides: VersionOptions) -> Result<Self> {
        let cwd = cwd.as_ref();
        if !cwd.is_dir() {
            return Err(Error::Configuration(format!(
                "Working directory {} does not exist",
                cwd.display()
            )));
        }

        let from_file = Self::load_file(&cwd.join(CONFIG_FILE))?;
        let options = from_file.merge(overrides);
        let defaults = Self::new(cwd);

        let config = Self {
            commit: options.commit.unwrap_or(defaults.commit),
            skip_ci: options.skip_ci.unwrap_or(defaults.skip_ci),
            no_changelog: options.no_changelog.unwrap_or(defaults.no_changelog),
            cwd: defaults.cwd,
        };
        debug!(?config, "resolved release configuration");
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<VersionOptions> {
        if !path.is_file() {
            return Ok(VersionOptions::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        let file: ConfigFile = toml::from_str(&content).map_err(|e| {
            Error::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(file.version)
    }
}
