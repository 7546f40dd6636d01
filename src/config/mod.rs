use crate::admission::client::{DEFAULT_GIT_USER_AGENT_PREFIX, NOT_ENOUGH_PRIVILEGES};
use crate::admission::{DEFAULT_REPO_BASE_PATH, RuleSet};
use crate::error::GitHookError;
use serde::{Deserialize, Serialize};
use std::env::var;
use std::path::Path;
use tracing::warn;

lazy_static::lazy_static! {
    pub static ref CFG: AppConfig = AppConfig::load().unwrap_or_else(|err| {
        warn!("falling back to default configuration: {}", err);
        AppConfig::default()
    });
}

pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub admission: AdmissionConfig,
    pub log: LogConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Mount point of the git servlet below the context path.
    pub repo_base_path: String,
    /// User-Agent prefix that identifies a native git client.
    pub git_user_agent_prefix: String,
    pub denied_message: String,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            repo_base_path: DEFAULT_REPO_BASE_PATH.to_string(),
            git_user_agent_prefix: DEFAULT_GIT_USER_AGENT_PREFIX.to_string(),
            denied_message: NOT_ENOUGH_PRIVILEGES.to_string(),
        }
    }
}

impl AdmissionConfig {
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::git(&self.repo_base_path)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}

impl AppConfig {
    /// Loads the file named by `CONFIG_FILE` (after reading `.env`), or `config.toml`.
    ///
    /// A missing file yields the defaults, a file that does not parse is an error.
    pub fn load() -> Result<Self, GitHookError> {
        dotenv::dotenv().ok();
        let config_file_path = var(CONFIG_FILE_ENV).unwrap_or(DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(config_file_path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, GitHookError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(content) => Self::from_toml_str(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, GitHookError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GitHookError> {
        let toml_str = toml::to_string_pretty(self).map_err(|err| GitHookError::Config(err.to_string()))?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), GitHookError> {
        let base = &self.admission.repo_base_path;
        if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
            return Err(GitHookError::Config(format!(
                "repo_base_path must start with '/' and must not end with '/': {:?}",
                base
            )));
        }
        if self.admission.git_user_agent_prefix.is_empty() {
            return Err(GitHookError::Config("git_user_agent_prefix must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn cfg() -> &'static Self {
        &CFG
    }

    pub fn admission() -> &'static AdmissionConfig {
        &CFG.admission
    }
}
