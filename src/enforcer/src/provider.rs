//! Lazy enforcer provider
//!
//! Resolves a single [`SyncedEnforcer`] on first use and hands the same
//! instance to every later caller.
//!
//! # Pipeline
//!
//! Evaluated once per resolution attempt, against a single options snapshot:
//!
//! 1. Custom factory configured → open a scope, call the factory with the
//!    model (possibly `None`), release the scope
//! 2. Fetch the model; `None` is a configuration error
//! 3. Registered adapter available → enforcer from model + adapter
//! 4. Default policy path configured → the file must exist; enforcer from
//!    model + file adapter
//! 5. Otherwise → enforcer from the model alone
//!
//! Adapter-backed enforcers load their policy on construction.
//!
//! # Concurrency
//!
//! Construction runs inside [`OnceCell::get_or_try_init`]: concurrent first
//! callers wait for one construction instead of racing to build their own.
//! A failed attempt leaves the cell empty and the next caller re-runs the
//! whole pipeline. Once resolved, callers read the cell without locking and
//! only bump an atomic cache-hit counter.

use crate::config::ProviderSettings;
use crate::enforcer::{ResolutionStrategy, SyncedEnforcer};
use crate::error::{ProviderError, Result};
use crate::metrics::{ProviderMetrics, ResolutionMetrics};
use crate::model::{DefaultModelProvider, ModelProvider};
use crate::options::{EnforcerFactory, OptionsSource, ResolutionOptions};
use crate::services::ServiceResolver;

use casbin::{Adapter, CoreApi, DefaultModel, Enforcer, FileAdapter, MemoryAdapter};
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Resolution state of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// No enforcer has been produced yet
    Unresolved,
    /// An enforcer was produced by the given strategy; terminal
    Resolved(ResolutionStrategy),
}

impl ResolutionState {
    /// Whether an enforcer is cached
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionState::Resolved(_))
    }
}

/// Resolves and caches one enforcer for the lifetime of the provider
pub struct EnforcerProvider<R: ServiceResolver> {
    /// Adapter lookups and resolution scopes
    services: Arc<R>,

    /// Factory, policy path and adapter flags
    options: Arc<dyn OptionsSource<R::Scope>>,

    /// Authorization model source
    model_provider: Arc<dyn ModelProvider>,

    /// Resolved enforcer
    enforcer: OnceCell<Arc<SyncedEnforcer>>,

    /// Resolution metrics
    metrics: ProviderMetrics,
}

impl<R: ServiceResolver> EnforcerProvider<R> {
    /// Create a provider; nothing is resolved until [`get_enforcer`](Self::get_enforcer)
    pub fn new(
        services: Arc<R>,
        options: Arc<dyn OptionsSource<R::Scope>>,
        model_provider: Arc<dyn ModelProvider>,
    ) -> Self {
        Self {
            services,
            options,
            model_provider,
            enforcer: OnceCell::new(),
            metrics: ProviderMetrics::new(),
        }
    }

    /// Create a provider from settings, using the default model provider
    pub fn from_settings(services: Arc<R>, settings: &ProviderSettings) -> Result<Self> {
        settings.validate()?;

        let options: ResolutionOptions<R::Scope> = ResolutionOptions::from_settings(settings);
        let model_provider = DefaultModelProvider::from_settings(settings);

        Ok(Self::new(services, Arc::new(options), Arc::new(model_provider)))
    }

    /// Get the enforcer, constructing it on first use
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Configuration`] if no factory is configured and the
    ///   model provider yields no model
    /// - [`ProviderError::PolicyFileNotFound`] if the default policy path does
    ///   not reference an existing file
    /// - any error from the factory, model provider or policy engine
    ///
    /// Errors are never cached.
    pub async fn get_enforcer(&self) -> Result<Arc<SyncedEnforcer>> {
        if let Some(enforcer) = self.enforcer.get() {
            self.metrics.record_cache_hit();
            return Ok(Arc::clone(enforcer));
        }

        let enforcer = self.enforcer.get_or_try_init(|| self.resolve()).await?;
        Ok(Arc::clone(enforcer))
    }

    /// Resolved enforcer, without triggering construction
    pub fn resolved(&self) -> Option<Arc<SyncedEnforcer>> {
        self.enforcer.get().cloned()
    }

    /// Current resolution state
    pub fn state(&self) -> ResolutionState {
        match self.enforcer.get() {
            Some(enforcer) => ResolutionState::Resolved(enforcer.strategy()),
            None => ResolutionState::Unresolved,
        }
    }

    /// Strategy that produced the cached enforcer
    pub fn strategy(&self) -> Option<ResolutionStrategy> {
        self.enforcer.get().map(|enforcer| enforcer.strategy())
    }

    /// Get resolution metrics
    pub fn metrics(&self) -> ResolutionMetrics {
        self.metrics.get_metrics()
    }

    /// Export resolution metrics in Prometheus format
    pub fn export_metrics(&self) -> String {
        self.metrics.export_prometheus()
    }

    async fn resolve(&self) -> Result<Arc<SyncedEnforcer>> {
        let start = Instant::now();
        self.metrics.record_attempt();

        info!("Resolving enforcer");

        match self.construct().await {
            Ok((enforcer, strategy)) => {
                let elapsed = start.elapsed();
                self.metrics.record_success(strategy, elapsed);
                info!("Enforcer resolved via {} in {:?}", strategy, elapsed);
                Ok(Arc::new(SyncedEnforcer::new(enforcer, strategy)))
            }
            Err(e) => {
                self.metrics.record_failure(start.elapsed());
                warn!("Enforcer resolution failed: {}", e);
                Err(e)
            }
        }
    }

    async fn construct(&self) -> Result<(Enforcer, ResolutionStrategy)> {
        let options = self.options.snapshot();

        // Step 1: custom factory, model may be absent
        if let Some(factory) = &options.factory {
            debug!("Using custom enforcer factory");
            let enforcer = self.construct_with_factory(factory).await?;
            return Ok((enforcer, ResolutionStrategy::Factory));
        }

        // Step 2: every remaining strategy needs a model
        let model = self.model_provider.get_model().await?.ok_or_else(|| {
            ProviderError::Configuration(
                "ModelProvider::get_model returned no model while no enforcer factory is configured"
                    .to_string(),
            )
        })?;

        // Step 3: registered adapter
        if let Some(adapter) = self.services.adapter() {
            debug!("Using registered adapter");
            let enforcer = build_enforcer(model, adapter, options.auto_save).await?;
            return Ok((enforcer, ResolutionStrategy::RegisteredAdapter));
        }

        // Step 4: default policy file
        if let Some(path) = &options.default_policy_path {
            if !is_file(path).await? {
                return Err(ProviderError::PolicyFileNotFound {
                    path: PathBuf::from(path),
                });
            }

            debug!("Using default policy file {}", path);
            let enforcer = build_enforcer(model, FileAdapter::new(path.clone()), options.auto_save).await?;
            return Ok((enforcer, ResolutionStrategy::PolicyFile));
        }

        // Step 5: model alone
        debug!("No policy source configured, using model only");
        let enforcer = build_enforcer(model, MemoryAdapter::default(), options.auto_save).await?;
        Ok((enforcer, ResolutionStrategy::ModelOnly))
    }

    async fn construct_with_factory(&self, factory: &EnforcerFactory<R::Scope>) -> Result<Enforcer> {
        // Released on every exit path when dropped
        let scope = self.services.create_scope();
        let model = self.model_provider.get_model().await?;

        let enforcer = (factory.as_ref())(&scope, model).await;
        drop(scope);

        enforcer
    }
}

impl<R: ServiceResolver> fmt::Debug for EnforcerProvider<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnforcerProvider")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn build_enforcer<A>(model: DefaultModel, adapter: A, auto_save: bool) -> Result<Enforcer>
where
    A: Adapter + 'static,
{
    let mut enforcer = Enforcer::new(model, adapter).await?;
    enforcer.enable_auto_save(auto_save);
    Ok(enforcer)
}

/// Whether `path` names an existing regular file; a missing path is `false`
async fn is_file(path: &str) -> Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ProviderError::Io(e)),
    }
}
