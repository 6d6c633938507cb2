//! # CretoAI Enforcer Provider
//!
//! Resolves one shared casbin enforcer on demand and caches it for the
//! lifetime of the provider.
//!
//! ## Features
//!
//! - **Fixed precedence**: custom factory, registered adapter, default policy
//!   file, then the bare model
//! - **Memoize-once**: the first successful construction is kept forever;
//!   failures are never cached
//! - **Scoped factories**: resolution scopes are released on every exit path
//! - **Async-first design** using Tokio runtime
//! - **Resolution metrics** with Prometheus export
//!
//! ## Example
//!
//! ```rust
//! use cretoai_enforcer::{EnforcerProvider, ProviderSettings, ServiceRegistry};
//! use casbin::CoreApi;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ProviderSettings {
//!         default_model_text: Some(
//!             "[request_definition]\nr = sub, obj, act\n\n\
//!              [policy_definition]\np = sub, obj, act\n\n\
//!              [policy_effect]\ne = some(where (p.eft == allow))\n\n\
//!              [matchers]\nm = r.sub == p.sub && r.obj == p.obj && r.act == p.act\n"
//!                 .to_string(),
//!         ),
//!         ..Default::default()
//!     };
//!
//!     let services: Arc<ServiceRegistry> = Arc::new(ServiceRegistry::new());
//!     let provider = EnforcerProvider::from_settings(services, &settings)?;
//!
//!     let enforcer = provider.get_enforcer().await?;
//!     let allowed = enforcer.read().await.enforce(("alice", "data1", "read"))?;
//!
//!     if !allowed {
//!         println!("Access denied");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod enforcer;
pub mod error;
pub mod metrics;
pub mod model;
pub mod options;
pub mod provider;
pub mod services;

// Re-export commonly used types
pub use config::ProviderSettings;
pub use enforcer::{ResolutionStrategy, SyncedEnforcer};
pub use error::{ProviderError, Result};
pub use metrics::{ProviderMetrics, ResolutionMetrics};
pub use model::{DefaultModelProvider, ModelProvider, ModelSource};
pub use options::{EnforcerFactory, OptionsSource, ResolutionOptions, SharedOptions};
pub use provider::{EnforcerProvider, ResolutionState};
pub use services::{RegistryScope, ServiceRegistry, ServiceResolver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
