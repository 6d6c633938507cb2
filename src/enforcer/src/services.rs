//! Service resolution for enforcer construction
//!
//! The provider never talks to a host container directly. It needs two
//! capabilities, both expressed by [`ServiceResolver`]:
//!
//! - an optional, externally registered policy adapter
//! - short-lived resolution scopes handed to custom enforcer factories
//!
//! [`ServiceRegistry`] is the in-process implementation: a type-keyed map of
//! shared services plus an optional adapter registration. Scopes are RAII
//! guards; dropping a [`RegistryScope`] releases it on every exit path.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Resolves collaborators for the enforcer provider
pub trait ServiceResolver: Send + Sync + 'static {
    /// Policy adapter type this resolver can supply
    type Adapter: casbin::Adapter + 'static;

    /// Scope handed to custom factories, released when dropped
    type Scope: Send + Sync + 'static;

    /// Open a short-lived resolution scope
    fn create_scope(&self) -> Self::Scope;

    /// Registered adapter, if any
    fn adapter(&self) -> Option<Self::Adapter>;
}

type AdapterFn<A> = Arc<dyn Fn() -> A + Send + Sync>;
type ServiceMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// In-process service registry
pub struct ServiceRegistry<A = casbin::MemoryAdapter> {
    services: Arc<RwLock<ServiceMap>>,
    adapter: Option<AdapterFn<A>>,
    active_scopes: Arc<AtomicUsize>,
    next_scope_id: AtomicU64,
}

impl<A> ServiceRegistry<A>
where
    A: casbin::Adapter + 'static,
{
    /// Create an empty registry with no adapter
    pub fn new() -> Self {
        Self {
            services: Arc::new(RwLock::new(HashMap::new())),
            adapter: None,
            active_scopes: Arc::new(AtomicUsize::new(0)),
            next_scope_id: AtomicU64::new(1),
        }
    }

    /// Register an adapter; the closure is called once per resolution that needs it
    pub fn with_adapter<F>(mut self, adapter: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.adapter = Some(Arc::new(adapter));
        self
    }

    /// Whether an adapter is registered
    pub fn has_adapter(&self) -> bool {
        self.adapter.is_some()
    }

    /// Register a shared service; re-registering replaces the previous value
    pub fn register<T>(&self, service: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        self.services.write().insert(TypeId::of::<T>(), service);
    }

    /// Look up a shared service
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        lookup(&self.services, TypeId::of::<T>())
    }

    /// Number of scopes currently open
    pub fn active_scopes(&self) -> usize {
        self.active_scopes.load(Ordering::SeqCst)
    }
}

impl<A> Default for ServiceRegistry<A>
where
    A: casbin::Adapter + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for ServiceRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.services.read().len())
            .field("has_adapter", &self.adapter.is_some())
            .field("active_scopes", &self.active_scopes.load(Ordering::SeqCst))
            .finish()
    }
}

impl<A> ServiceResolver for ServiceRegistry<A>
where
    A: casbin::Adapter + 'static,
{
    type Adapter = A;
    type Scope = RegistryScope<A>;

    fn create_scope(&self) -> RegistryScope<A> {
        let id = self.next_scope_id.fetch_add(1, Ordering::SeqCst);
        let open = self.active_scopes.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Opened resolution scope {} ({} active)", id, open);

        RegistryScope {
            id,
            services: Arc::clone(&self.services),
            adapter: self.adapter.clone(),
            active_scopes: Arc::clone(&self.active_scopes),
        }
    }

    fn adapter(&self) -> Option<A> {
        self.adapter.as_ref().map(|make| make())
    }
}

/// Short-lived resolution scope
///
/// Resolves the same services as its registry. Released on drop.
pub struct RegistryScope<A = casbin::MemoryAdapter> {
    id: u64,
    services: Arc<RwLock<ServiceMap>>,
    adapter: Option<AdapterFn<A>>,
    active_scopes: Arc<AtomicUsize>,
}

impl<A> RegistryScope<A> {
    /// Scope identifier, unique per registry
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Look up a shared service
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        lookup(&self.services, TypeId::of::<T>())
    }

    /// Registered adapter, if any
    pub fn adapter(&self) -> Option<A> {
        self.adapter.as_ref().map(|make| make())
    }
}

impl<A> fmt::Debug for RegistryScope<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryScope").field("id", &self.id).finish()
    }
}

impl<A> Drop for RegistryScope<A> {
    fn drop(&mut self) {
        let remaining = self.active_scopes.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!("Released resolution scope {} ({} active)", self.id, remaining);
    }
}

fn lookup<T>(services: &RwLock<ServiceMap>, key: TypeId) -> Option<Arc<T>>
where
    T: Send + Sync + 'static,
{
    let entry = services.read().get(&key).cloned()?;
    entry.downcast::<T>().ok()
}
