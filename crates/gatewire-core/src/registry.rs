//! Instance registry.
//!
//! The registry holds the population of constructed application objects the
//! explorer scans at startup. It preserves insertion order, so discovery is
//! deterministic for a given startup, and it is treated as read-only while
//! the dispatch service runs its wiring pass.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::gateway::Registrant;

/// Insertion-ordered population of registered instances.
///
/// # Thread safety
///
/// Registration takes a read-write lock; [`snapshot`](Self::snapshot) clones
/// the current population so discovery never holds the lock while exploring.
#[derive(Default)]
pub struct InstanceRegistry {
    entries: RwLock<Vec<Arc<dyn Registrant>>>,
}

impl InstanceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an instance to the population.
    pub fn register(&self, instance: Arc<dyn Registrant>) {
        let mut entries = self.entries.write();
        entries.push(instance);
        debug!(count = entries.len(), "Registrant added");
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clones the population in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Registrant>> {
        self.entries.read().clone()
    }
}

impl std::fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("len", &self.len())
            .finish()
    }
}
