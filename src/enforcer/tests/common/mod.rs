//! Counting collaborators and fixtures for provider tests

#![allow(dead_code)]

use async_trait::async_trait;
use casbin::{CoreApi, DefaultModel, Enforcer, MemoryAdapter};
use cretoai_enforcer::{
    ModelProvider, RegistryScope, Result, ServiceRegistry, ServiceResolver,
};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

pub const MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = r.sub == p.sub && r.obj == p.obj && r.act == p.act
"#;

pub const POLICY: &str = "p, alice, data1, read\np, bob, data2, write\n";

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Write `contents` to a temp file with the given suffix
pub fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Model provider that counts calls and can be reconfigured between calls
pub struct CountingModelProvider {
    model: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl CountingModelProvider {
    pub fn with_model() -> Self {
        Self::new(Some(MODEL.to_string()))
    }

    pub fn without_model() -> Self {
        Self::new(None)
    }

    pub fn new(model: Option<String>) -> Self {
        Self {
            model: Mutex::new(model),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_model(&self, model: Option<String>) {
        *self.model.lock() = model;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for CountingModelProvider {
    async fn get_model(&self) -> Result<Option<DefaultModel>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let text = self.model.lock().clone();
        match text {
            Some(text) => Ok(Some(DefaultModel::from_str(&text).await?)),
            None => Ok(None),
        }
    }
}

/// Resolver that counts adapter lookups and opened scopes
pub struct CountingResolver<A = MemoryAdapter> {
    registry: ServiceRegistry<A>,
    adapter_lookups: AtomicUsize,
    scopes_opened: AtomicUsize,
}

impl<A> CountingResolver<A>
where
    A: casbin::Adapter + 'static,
{
    pub fn new(registry: ServiceRegistry<A>) -> Self {
        Self {
            registry,
            adapter_lookups: AtomicUsize::new(0),
            scopes_opened: AtomicUsize::new(0),
        }
    }

    pub fn adapter_lookups(&self) -> usize {
        self.adapter_lookups.load(Ordering::SeqCst)
    }

    pub fn scopes_opened(&self) -> usize {
        self.scopes_opened.load(Ordering::SeqCst)
    }

    pub fn active_scopes(&self) -> usize {
        self.registry.active_scopes()
    }

    pub fn registry(&self) -> &ServiceRegistry<A> {
        &self.registry
    }
}

impl<A> ServiceResolver for CountingResolver<A>
where
    A: casbin::Adapter + 'static,
{
    type Adapter = A;
    type Scope = RegistryScope<A>;

    fn create_scope(&self) -> RegistryScope<A> {
        self.scopes_opened.fetch_add(1, Ordering::SeqCst);
        self.registry.create_scope()
    }

    fn adapter(&self) -> Option<A> {
        self.adapter_lookups.fetch_add(1, Ordering::SeqCst);
        self.registry.adapter()
    }
}

/// Enforcer built the way a host factory would: given model or the fixture model
pub async fn factory_enforcer(model: Option<DefaultModel>) -> Result<Enforcer> {
    let model = match model {
        Some(model) => model,
        None => DefaultModel::from_str(MODEL).await?,
    };

    Ok(Enforcer::new(model, MemoryAdapter::default()).await?)
}
