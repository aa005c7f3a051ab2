//! Configuration types for the chat widget.
//!
//! The configuration is a JSON file; every field has a default so a missing
//! or partial file still yields a usable widget.

use crate::bridge::OriginPolicy;
use crate::message::DEFAULT_GREETING;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for the widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// URL the chat request is POSTed to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Host origins allowed to supply a credential. `"*"` trusts everyone.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Assistant greeting seeded when the panel opens.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Whether the panel starts open.
    #[serde(default = "default_open_on_mount")]
    pub open_on_mount: bool,

    /// Request timeout in seconds (0 = none).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Panel title.
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_endpoint() -> String {
    "http://localhost:3000/widget/chat".into()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["local".into()]
}

fn default_greeting() -> String {
    DEFAULT_GREETING.into()
}

fn default_open_on_mount() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_title() -> String {
    "AI Assistant".into()
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            allowed_origins: default_allowed_origins(),
            greeting: default_greeting(),
            open_on_mount: default_open_on_mount(),
            request_timeout_secs: default_request_timeout_secs(),
            title: default_title(),
        }
    }
}

impl WidgetConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config: Self = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidEndpoint(self.endpoint.clone()))
        }
    }

    /// Request timeout, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Origin policy for the host bridge.
    pub fn origin_policy(&self) -> OriginPolicy {
        OriginPolicy::new(self.allowed_origins.iter().cloned())
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Endpoint is not an http(s) URL.
    #[error("Invalid endpoint (expected http:// or https://): {0}")]
    InvalidEndpoint(String),
}
