//! Tool settings with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/lambdeploy/config.toml`
//! 3. Environment variables: `LAMBDEPLOY_*` prefix
//!
//! These are settings of the tool itself (which executables to call).
//! The per-project deployment configuration lives in `lambdeploy.toml`
//! and is handled by `ProjectService`.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;

/// Raw settings for intermediate parsing (`None` → not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub aws_cli: Option<String>,
    pub pip: Option<String>,
    pub profile: Option<String>,
}

/// Unified settings for lambdeploy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Provider CLI executable (default: "aws")
    pub aws_cli: String,
    /// Dependency installer executable (default: "pip")
    pub pip: String,
    /// Named provider profile passed as `--profile`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aws_cli: "aws".into(),
            pip: "pip".into(),
            profile: None,
        }
    }
}

/// Get the XDG config directory for lambdeploy.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "lambdeploy").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in executable paths.
    fn expand_paths(&mut self) {
        self.aws_cli = expand_env_vars(&self.aws_cli);
        self.pip = expand_env_vars(&self.pip);
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            aws_cli: overlay
                .aws_cli
                .clone()
                .unwrap_or_else(|| self.aws_cli.clone()),
            pip: overlay.pip.clone().unwrap_or_else(|| self.pip.clone()),
            profile: overlay.profile.clone().or_else(|| self.profile.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Explicit config file replacing the global one (tests, `--config`)
    ///
    /// A missing global file means compiled defaults; a missing explicit
    /// file is an error.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        let file = match config_file {
            Some(path) if !path.is_file() => {
                return Err(ApplicationError::Config {
                    message: format!("settings file not found: {}", path.display()),
                });
            }
            Some(path) => Some(path.to_path_buf()),
            None => global_config_path().filter(|path| path.exists()),
        };
        if let Some(path) = file {
            let raw = load_raw_settings(&path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply LAMBDEPLOY_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // config crate only parses the env vars here
        let config = Config::builder()
            .add_source(Environment::with_prefix("LAMBDEPLOY").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("aws_cli") {
            settings.aws_cli = val;
        }
        if let Ok(val) = config.get_string("pip") {
            settings.pip = val;
        }
        if let Ok(val) = config.get_string("profile") {
            settings.profile = Some(val);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# lambdeploy settings
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/lambdeploy/config.toml
#   Env:    LAMBDEPLOY_* environment variables (explicit overrides)

# Provider CLI used for package/deploy/describe/delete
# aws_cli = "aws"

# Dependency installer used by build
# pip = "pip"

# Named provider profile
# profile = "default"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
