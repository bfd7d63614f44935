//! Process-wide scroll-trigger plugin
//!
//! Registered once at application startup with [`init`]. The registry tracks
//! which elements currently have a live scroll-linked binding, so leaked or
//! duplicate bindings are observable.

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use vitrine_core::ElementId;

static REGISTRY: OnceCell<TriggerRegistry> = OnceCell::new();

/// Register the scroll-trigger plugin. Repeated calls return the same registry.
pub fn init() -> &'static TriggerRegistry {
    REGISTRY.get_or_init(|| {
        info!("Scroll trigger plugin registered");
        TriggerRegistry::default()
    })
}

/// The registry, once `init` has run
pub fn registry() -> Option<&'static TriggerRegistry> {
    REGISTRY.get()
}

/// Used by controllers that may be mounted before startup registration
pub(crate) fn ensure_registered() -> &'static TriggerRegistry {
    if let Some(registry) = REGISTRY.get() {
        return registry;
    }
    warn!("Scroll trigger plugin used before startup registration, registering now");
    init()
}

#[derive(Debug, Default)]
pub struct TriggerRegistry {
    bindings: Mutex<HashMap<ElementId, usize>>,
}

impl TriggerRegistry {
    /// Record a new binding animating `target`
    pub fn claim(&'static self, target: ElementId) -> TriggerToken {
        let mut bindings = self.bindings.lock();
        let count = bindings.entry(target).or_insert(0);
        if *count > 0 {
            warn!(element = %target, existing = *count, "Element already driven by a scroll binding");
        }
        *count += 1;
        debug!(element = %target, "Scroll binding claimed");
        TriggerToken {
            registry: self,
            target,
        }
    }

    pub fn bound_count(&self, target: ElementId) -> usize {
        self.bindings.lock().get(&target).copied().unwrap_or(0)
    }

    /// Total live bindings across all elements
    pub fn live(&self) -> usize {
        self.bindings.lock().values().sum()
    }

    fn release(&self, target: ElementId) {
        let mut bindings = self.bindings.lock();
        if let Some(count) = bindings.get_mut(&target) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                bindings.remove(&target);
            }
        }
        debug!(element = %target, "Scroll binding released");
    }
}

/// Live claim on an element; released on drop
#[derive(Debug)]
pub struct TriggerToken {
    registry: &'static TriggerRegistry,
    target: ElementId,
}

impl TriggerToken {
    pub fn target(&self) -> ElementId {
        self.target
    }
}

impl Drop for TriggerToken {
    fn drop(&mut self) {
        self.registry.release(self.target);
    }
}
