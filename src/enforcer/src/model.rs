//! Authorization model providers

use crate::config::ProviderSettings;
use crate::error::Result;
use async_trait::async_trait;
use casbin::DefaultModel;
use std::path::PathBuf;
use tracing::debug;

/// Supplies the authorization model definition
///
/// Implementations must be idempotent: the provider may ask for the model
/// more than once during a single resolution attempt and takes ownership of
/// each returned value.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Get the model, or `None` when no model is configured
    async fn get_model(&self) -> Result<Option<DefaultModel>>;
}

/// Where the default model comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Inline model definition
    Text(String),
    /// Model definition file
    File(PathBuf),
    /// No model configured
    Empty,
}

/// Model provider backed by inline text or a model file
///
/// A fresh [`DefaultModel`] is parsed on every call, so repeated calls never
/// share mutable state.
#[derive(Debug, Clone)]
pub struct DefaultModelProvider {
    source: ModelSource,
}

impl DefaultModelProvider {
    /// Create a provider for the given source
    pub fn new(source: ModelSource) -> Self {
        Self { source }
    }

    /// Provider for an inline model definition
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(ModelSource::Text(text.into()))
    }

    /// Provider for a model file
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(ModelSource::File(path.into()))
    }

    /// Provider that never yields a model
    pub fn empty() -> Self {
        Self::new(ModelSource::Empty)
    }

    /// Pick the source from settings: inline text first, then the model path
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        if let Some(text) = &settings.default_model_text {
            Self::from_text(text.clone())
        } else if let Some(path) = &settings.default_model_path {
            Self::from_file(path.clone())
        } else {
            Self::empty()
        }
    }

    /// Configured source
    pub fn source(&self) -> &ModelSource {
        &self.source
    }
}

#[async_trait]
impl ModelProvider for DefaultModelProvider {
    async fn get_model(&self) -> Result<Option<DefaultModel>> {
        match &self.source {
            ModelSource::Text(text) => {
                debug!("Parsing inline model definition ({} bytes)", text.len());
                Ok(Some(DefaultModel::from_str(text).await?))
            }
            ModelSource::File(path) => {
                debug!("Loading model definition from {}", path.display());
                Ok(Some(DefaultModel::from_file(path).await?))
            }
            ModelSource::Empty => Ok(None),
        }
    }
}
