//! Settings describing how to build an aggregator.
//!
//! Settings are resolved in tiers, later tiers taking precedence:
//! 1. **Defaults** - no targets, abort on failure, built-in handlers
//! 2. **File** - `--settings <path>`, `CONFAGG_SETTINGS`, or
//!    `<config dir>/confagg/settings.yaml` when it exists
//! 3. **Environment** - `CONFAGG_TARGETS` (appended), `CONFAGG_FAILURE_POLICY`
//!
//! Command-line flags are applied on top by the binary.

use crate::aggregator::FailurePolicy;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit settings file.
pub const SETTINGS_PATH_ENV: &str = "CONFAGG_SETTINGS";
/// Environment variable with extra targets, separated like `PATH`.
pub const TARGETS_ENV: &str = "CONFAGG_TARGETS";
/// Environment variable overriding the failure policy.
pub const FAILURE_POLICY_ENV: &str = "CONFAGG_FAILURE_POLICY";

/// Aggregator settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directories and files to scan, in precedence order.
    #[serde(default)]
    pub targets: Vec<PathBuf>,

    /// What a refresh does with sources that fail to parse.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Built-in extensions to unregister.
    #[serde(default)]
    pub disabled_extensions: Vec<String>,

    /// Extra extensions that reuse an existing handler, e.g. `conf: ini`.
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| Error::Settings {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let settings: Settings =
            serde_yaml::from_str(&content).map_err(|err| Error::Settings {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        debug!(path = %path.display(), targets = settings.targets.len(), "Loaded settings file");
        Ok(settings)
    }

    /// Resolve settings from the file tier and the environment.
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(SETTINGS_PATH_ENV).map(PathBuf::from);
        let mut settings = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load(path)?,
            None => match default_settings_path() {
                Some(path) if path.is_file() => Self::load(path)?,
                _ => Self::default(),
            },
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Some(targets) = std::env::var_os(TARGETS_ENV) {
            self.targets.extend(std::env::split_paths(&targets));
        }

        if let Ok(policy) = std::env::var(FAILURE_POLICY_ENV) {
            match policy.parse() {
                Ok(policy) => self.failure_policy = policy,
                Err(err) => warn!(error = %err, "Ignoring {}", FAILURE_POLICY_ENV),
            }
        }
    }
}

/// `<config dir>/confagg/settings.yaml`, if the platform has a config dir.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("confagg").join("settings.yaml"))
}
