//! Thread-safe enforcer handle

use crate::error::Result;
use casbin::{CoreApi, Enforcer};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Strategy that produced an enforcer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Built by the custom factory
    Factory,
    /// Built from the model and the registered adapter
    RegisteredAdapter,
    /// Built from the model and the default policy file
    PolicyFile,
    /// Built from the model alone
    ModelOnly,
}

impl ResolutionStrategy {
    /// All strategies in precedence order
    pub const ALL: [ResolutionStrategy; 4] = [
        ResolutionStrategy::Factory,
        ResolutionStrategy::RegisteredAdapter,
        ResolutionStrategy::PolicyFile,
        ResolutionStrategy::ModelOnly,
    ];

    /// Stable name used in logs and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStrategy::Factory => "factory",
            ResolutionStrategy::RegisteredAdapter => "registered_adapter",
            ResolutionStrategy::PolicyFile => "policy_file",
            ResolutionStrategy::ModelOnly => "model_only",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enforcer guarded for concurrent decisions
///
/// Decisions take a shared read lock; policy management takes the write lock.
pub struct SyncedEnforcer {
    inner: RwLock<Enforcer>,
    strategy: ResolutionStrategy,
}

impl SyncedEnforcer {
    /// Wrap an enforcer built by `strategy`
    pub fn new(enforcer: Enforcer, strategy: ResolutionStrategy) -> Self {
        Self {
            inner: RwLock::new(enforcer),
            strategy,
        }
    }

    /// Strategy that built this enforcer
    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    /// Shared access for decisions
    pub async fn read(&self) -> RwLockReadGuard<'_, Enforcer> {
        self.inner.read().await
    }

    /// Exclusive access for policy management
    pub async fn write(&self) -> RwLockWriteGuard<'_, Enforcer> {
        self.inner.write().await
    }

    /// Reload the policy from the enforcer's adapter
    pub async fn reload_policy(&self) -> Result<()> {
        self.inner.write().await.load_policy().await?;
        Ok(())
    }
}

impl fmt::Debug for SyncedEnforcer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncedEnforcer")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casbin::{DefaultModel, MemoryAdapter, MgmtApi};

    const MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = r.sub == p.sub && r.obj == p.obj && r.act == p.act
"#;

    async fn memory_enforcer() -> Enforcer {
        let model = DefaultModel::from_str(MODEL).await.unwrap();
        Enforcer::new(model, MemoryAdapter::default()).await.unwrap()
    }

    #[test]
    fn test_strategy_names() {
        let names: Vec<&str> = ResolutionStrategy::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["factory", "registered_adapter", "policy_file", "model_only"]);
        assert_eq!(ResolutionStrategy::PolicyFile.to_string(), "policy_file");
    }

    #[tokio::test]
    async fn test_read_and_write_access() {
        let enforcer = SyncedEnforcer::new(memory_enforcer().await, ResolutionStrategy::ModelOnly);
        assert_eq!(enforcer.strategy(), ResolutionStrategy::ModelOnly);

        assert!(!enforcer.read().await.enforce(("alice", "data1", "read")).unwrap());

        enforcer
            .write()
            .await
            .add_policy(vec!["alice".to_string(), "data1".to_string(), "read".to_string()])
            .await
            .unwrap();

        assert!(enforcer.read().await.enforce(("alice", "data1", "read")).unwrap());
    }
}
