//! Error types for enforcer resolution

use std::path::PathBuf;
use thiserror::Error;

/// Enforcer provider errors
///
/// Every variant aborts the current resolution attempt. Nothing is cached on
/// failure, so the next call runs the whole pipeline again.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The model provider returned no model while no custom factory is configured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The configured default policy file does not exist
    #[error("Policy file not found: {}", path.display())]
    PolicyFileNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// Error raised by the policy engine while building a model, adapter or enforcer
    #[error("Policy engine error: {0}")]
    Collaborator(#[from] casbin::Error),

    /// Error raised by a custom enforcer factory
    #[error("Enforcer factory failed: {0}")]
    Factory(String),

    /// Invalid provider settings
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Whether this error comes from the host configuration rather than a collaborator
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ProviderError::Configuration(_)
                | ProviderError::PolicyFileNotFound { .. }
                | ProviderError::InvalidSettings(_)
        )
    }
}

/// Result type for enforcer provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;
