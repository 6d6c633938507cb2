//! Provider settings
//!
//! Settings can be loaded from environment variables (the same way the
//! authorization server reads its configuration) or from a JSON document.
//!
//! Environment variables:
//! - `CASBIN_MODEL_PATH` - Path to the model definition (`.conf`)
//! - `CASBIN_MODEL_TEXT` - Inline model definition, takes precedence over the path
//! - `CASBIN_POLICY_PATH` - Default policy file (`.csv`)
//! - `CASBIN_AUTO_SAVE` - Persist policy changes through the adapter (default: true)

use crate::error::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the model file path
pub const ENV_MODEL_PATH: &str = "CASBIN_MODEL_PATH";
/// Environment variable holding an inline model definition
pub const ENV_MODEL_TEXT: &str = "CASBIN_MODEL_TEXT";
/// Environment variable holding the default policy file path
pub const ENV_POLICY_PATH: &str = "CASBIN_POLICY_PATH";
/// Environment variable toggling adapter auto-save
pub const ENV_AUTO_SAVE: &str = "CASBIN_AUTO_SAVE";

fn default_auto_save() -> bool {
    true
}

/// Enforcer provider settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Path to the model definition file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model_path: Option<PathBuf>,

    /// Inline model definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model_text: Option<String>,

    /// Policy file used when no adapter is registered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_policy_path: Option<String>,

    /// Persist policy changes through the adapter
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            default_model_path: None,
            default_model_text: None,
            default_policy_path: None,
            auto_save: default_auto_save(),
        }
    }
}

impl ProviderSettings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| ProviderError::InvalidSettings(format!("Malformed settings JSON: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auto_save = match lookup(ENV_AUTO_SAVE) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ProviderError::InvalidSettings(format!("{} must be a boolean, got '{}'", ENV_AUTO_SAVE, raw))
            })?,
            None => default_auto_save(),
        };

        let settings = Self {
            default_model_path: lookup(ENV_MODEL_PATH).map(PathBuf::from),
            default_model_text: lookup(ENV_MODEL_TEXT),
            default_policy_path: lookup(ENV_POLICY_PATH),
            auto_save,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that can never resolve
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.default_model_path {
            if path.as_os_str().is_empty() {
                return Err(ProviderError::InvalidSettings("default_model_path is empty".to_string()));
            }
        }

        if let Some(text) = &self.default_model_text {
            if text.trim().is_empty() {
                return Err(ProviderError::InvalidSettings("default_model_text is empty".to_string()));
            }
        }

        if let Some(path) = &self.default_policy_path {
            if path.trim().is_empty() {
                return Err(ProviderError::InvalidSettings("default_policy_path is empty".to_string()));
            }
        }

        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
