//! Resolution options
//!
//! A [`ResolutionOptions`] value is the snapshot the provider reads once per
//! resolution attempt. Hosts that reconfigure at runtime expose it through
//! [`SharedOptions`]; the change is picked up by the next attempt only.

use crate::config::ProviderSettings;
use crate::error::Result;
use casbin::{DefaultModel, Enforcer};
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Custom enforcer factory
///
/// Receives the resolution scope and the current model, which may be `None`.
/// The scope is released once the returned future completes.
pub type EnforcerFactory<S> =
    Arc<dyn Fn(&S, Option<DefaultModel>) -> BoxFuture<'static, Result<Enforcer>> + Send + Sync>;

/// Options snapshot for one resolution attempt
pub struct ResolutionOptions<S> {
    /// Custom factory, takes precedence over every other strategy
    pub factory: Option<EnforcerFactory<S>>,

    /// Policy file used when no adapter is registered
    pub default_policy_path: Option<String>,

    /// Persist policy changes through the adapter
    pub auto_save: bool,
}

impl<S> ResolutionOptions<S> {
    /// Options with no factory and no policy path
    pub fn new() -> Self {
        Self {
            factory: None,
            default_policy_path: None,
            auto_save: true,
        }
    }

    /// Options derived from provider settings
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self {
            factory: None,
            default_policy_path: settings.default_policy_path.clone(),
            auto_save: settings.auto_save,
        }
    }

    /// Set the custom factory
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&S, Option<DefaultModel>) -> BoxFuture<'static, Result<Enforcer>> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Set the default policy path
    pub fn with_default_policy_path(mut self, path: impl Into<String>) -> Self {
        self.default_policy_path = Some(path.into());
        self
    }

    /// Enable or disable adapter auto-save
    pub fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    /// Whether a custom factory is configured
    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }
}

impl<S> Default for ResolutionOptions<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for ResolutionOptions<S> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            default_policy_path: self.default_policy_path.clone(),
            auto_save: self.auto_save,
        }
    }
}

impl<S> fmt::Debug for ResolutionOptions<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionOptions")
            .field("factory", &self.factory.is_some())
            .field("default_policy_path", &self.default_policy_path)
            .field("auto_save", &self.auto_save)
            .finish()
    }
}

/// Source of resolution options
pub trait OptionsSource<S>: Send + Sync {
    /// Take a snapshot for one resolution attempt
    fn snapshot(&self) -> ResolutionOptions<S>;
}

impl<S> OptionsSource<S> for ResolutionOptions<S> {
    fn snapshot(&self) -> ResolutionOptions<S> {
        self.clone()
    }
}

/// Runtime-updatable options
pub struct SharedOptions<S> {
    inner: RwLock<ResolutionOptions<S>>,
}

impl<S> SharedOptions<S> {
    /// Wrap initial options
    pub fn new(options: ResolutionOptions<S>) -> Self {
        Self {
            inner: RwLock::new(options),
        }
    }

    /// Replace the options
    pub fn replace(&self, options: ResolutionOptions<S>) {
        *self.inner.write() = options;
    }

    /// Modify the options in place
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut ResolutionOptions<S>),
    {
        f(&mut self.inner.write());
    }
}

impl<S> OptionsSource<S> for SharedOptions<S> {
    fn snapshot(&self) -> ResolutionOptions<S> {
        self.inner.read().clone()
    }
}
