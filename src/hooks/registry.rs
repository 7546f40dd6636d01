use crate::hooks::HookListener;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

pub type ArcListener = Arc<dyn HookListener>;

/// Ordered set of post-receive listeners, keyed by `Arc` identity.
///
/// Dispatch works on a snapshot, so a listener added or removed while a
/// dispatch is running may or may not be seen by that dispatch.
#[derive(Default)]
pub struct HookRegistry {
    listeners: RwLock<Vec<ArcListener>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry composed once at startup.
    pub fn with_listeners(listeners: impl IntoIterator<Item = ArcListener>) -> Self {
        let registry = Self::new();
        for listener in listeners {
            registry.add(listener);
        }
        registry
    }

    /// Returns `false` if this exact listener is already registered.
    pub fn add(&self, listener: ArcListener) -> bool {
        let mut listeners = self.write();
        if listeners.iter().any(|known| same_listener(known, &listener)) {
            return false;
        }
        debug!("registering post-receive listener {}", listener.name());
        listeners.push(listener);
        true
    }

    /// Returns `false` if the listener was not registered.
    pub fn remove(&self, listener: &ArcListener) -> bool {
        let mut listeners = self.write();
        let before = listeners.len();
        listeners.retain(|known| !same_listener(known, listener));
        let removed = listeners.len() != before;
        if removed {
            debug!("unregistered post-receive listener {}", listener.name());
        }
        removed
    }

    /// Listeners in registration order.
    pub fn snapshot(&self) -> Vec<ArcListener> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // add/remove never leave the vector half-updated, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Vec<ArcListener>> {
        self.listeners.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ArcListener>> {
        self.listeners.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.read().iter().map(|l| l.name().to_string()).collect::<Vec<_>>();
        f.debug_struct("HookRegistry").field("listeners", &names).finish()
    }
}

fn same_listener(a: &ArcListener, b: &ArcListener) -> bool {
    // Compare data pointers only, vtable pointers are not unique per type.
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{Changeset, Repository};
    use std::thread;

    struct Named(&'static str);

    impl HookListener for Named {
        fn on_post_receive(&self, _: &Repository, _: &[Changeset]) -> anyhow::Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            self.0
        }
    }

    fn listener(name: &'static str) -> ArcListener {
        Arc::new(Named(name))
    }

    #[test]
    fn test_add_is_idempotent_per_instance() {
        let registry = HookRegistry::new();
        let a = listener("a");
        assert!(registry.add(a.clone()));
        assert!(!registry.add(a.clone()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_equal_but_distinct_instances_are_both_kept() {
        let registry = HookRegistry::new();
        registry.add(listener("a"));
        registry.add(listener("a"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove() {
        let registry = HookRegistry::new();
        let a = listener("a");
        let b = listener("b");
        registry.add(a.clone());
        assert!(!registry.remove(&b));
        assert!(registry.remove(&a));
        assert!(!registry.remove(&a));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_keeps_registration_order() {
        let registry = HookRegistry::new();
        for name in ["first", "second", "third"] {
            registry.add(listener(name));
        }
        let names = registry
            .snapshot()
            .iter()
            .map(|l| l.name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = HookRegistry::new();
        let a = listener("a");
        registry.add(a.clone());
        let snapshot = registry.snapshot();
        registry.remove(&a);
        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_add_and_remove() {
        let registry = Arc::new(HookRegistry::new());
        let keep = (0..8).map(|_| listener("keep")).collect::<Vec<_>>();
        let handles = keep
            .iter()
            .cloned()
            .map(|l| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let transient = listener("transient");
                        registry.add(transient.clone());
                        registry.add(l.clone());
                        let _ = registry.snapshot();
                        registry.remove(&transient);
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), keep.len());
    }
}
