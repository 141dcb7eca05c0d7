//! Canonical handle registry
//!
//! Two lookups of the same (kind, name) pair must yield the same
//! allocation so that handle equality reflects device identity.
//! Creation is serialized behind the map mutex; there is no eviction,
//! handles live as long as the registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::runner::CommandRunner;
use crate::sysctl::SystemControl;

/// Concrete link flavor; part of the registry key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Iface,
    Bridge,
}

/// Canonical per-device state owned by the registry
pub struct LinkState {
    pub(crate) name: String,
    /// Lazily created system-control handle, one per interface name
    pub(crate) sysctl: Mutex<Option<Arc<SystemControl>>>,
}

/// Maps (kind, name) to the single canonical state for that device
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryState>,
}

struct RegistryState {
    runner: Arc<dyn CommandRunner>,
    links: Mutex<HashMap<(LinkKind, String), Arc<LinkState>>>,
}

impl Registry {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            inner: Arc::new(RegistryState {
                runner,
                links: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        self.inner.runner.clone()
    }

    /// Return the canonical state for (kind, name), creating it on first use
    pub fn get_or_create(&self, kind: LinkKind, name: &str) -> Arc<LinkState> {
        let mut links = self.inner.links.lock().unwrap();
        links
            .entry((kind, name.to_string()))
            .or_insert_with(|| {
                Arc::new(LinkState {
                    name: name.to_string(),
                    sysctl: Mutex::new(None),
                })
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::ScriptedRunner;

    fn test_registry() -> Registry {
        Registry::new(Arc::new(ScriptedRunner::new()))
    }

    #[test]
    fn test_same_key_yields_same_state() {
        let registry = test_registry();
        let a = registry.get_or_create(LinkKind::Iface, "tap0");
        let b = registry.get_or_create(LinkKind::Iface, "tap0");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_distinct_names_yield_distinct_states() {
        let registry = test_registry();
        let a = registry.get_or_create(LinkKind::Iface, "tap0");
        let b = registry.get_or_create(LinkKind::Iface, "tap1");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_distinct_kinds_yield_distinct_states() {
        let registry = test_registry();
        let a = registry.get_or_create(LinkKind::Iface, "br0");
        let b = registry.get_or_create(LinkKind::Bridge, "br0");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_cloned_registry_shares_the_map() {
        let registry = test_registry();
        let clone = registry.clone();
        let a = registry.get_or_create(LinkKind::Bridge, "br0");
        let b = clone.get_or_create(LinkKind::Bridge, "br0");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
