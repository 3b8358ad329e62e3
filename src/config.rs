//! # Service Configuration
//!
//! Layered with `figment`, later layers win:
//!
//! 1. built-in defaults ([`ServiceConfig::default`])
//! 2. an optional TOML file (`resource-service.toml` unless a path is given)
//! 3. `RESOURCE_SERVICE_*` environment variables, `__` separating sections
//!
//! ```text
//! RESOURCE_SERVICE_APP__URL=https://example.org/
//! RESOURCE_SERVICE_PIPELINE__CACHE_ENABLED=false
//! RESOURCE_SERVICE_PIPELINE__MAX_LIST_LIMIT=100
//! ```

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use resource_framework::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "resource-service.toml";
pub const ENV_PREFIX: &str = "RESOURCE_SERVICE_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Load(Box::new(e))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub pipeline: PipelineConfig,
    pub app: AppConfig,
    pub mail: MailConfig,
}

/// Public identity of the application, used in outgoing mail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    /// Base URL, with trailing slash. Reset links are `{url}reset/{token}`.
    pub url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Resource Service".into(),
            url: "http://localhost:3000/".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub reset_subject: String,
    /// Template name handed to the renderer.
    pub reset_template: String,
    /// Budget for each render and each send.
    pub timeout_ms: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            reset_subject: "mailSubjectResetPassword".into(),
            reset_template: "passwordReset".into(),
            timeout_ms: 5_000,
        }
    }
}

impl MailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ServiceConfig {
    /// Loads from `resource-service.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Loads from `path` (if present) and the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config: ServiceConfig = Figment::new()
            .merge(Serialized::defaults(ServiceConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.channel_capacity must be greater than 0".into(),
            ));
        }
        if self.pipeline.accessor_timeout_ms == 0 || self.pipeline.side_effect_timeout_ms == 0 {
            return Err(ConfigError::Invalid("pipeline timeouts must be greater than 0".into()));
        }
        if !self.app.url.ends_with('/') {
            return Err(ConfigError::Invalid(format!(
                "app.url must end with '/', got {:?}",
                self.app.url
            )));
        }
        if self.mail.reset_template.trim().is_empty() {
            return Err(ConfigError::Invalid("mail.reset_template cannot be empty".into()));
        }
        Ok(())
    }
}
