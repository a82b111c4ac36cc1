//! Listener storage shared by peers and acceptors.
//!
//! Listeners are kept per kind in registration order. Registering the same
//! `Arc` twice for one kind is a no-op; identity is the allocation address,
//! so two separately allocated closures with identical code are distinct.
//!
//! [`EventTarget::listeners`] returns a snapshot. Callers invoke the snapshot
//! after the lock is released, so a listener may add or remove listeners
//! (or close its own socket) without deadlocking.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::hash::Hash;
use std::ptr;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

// ============================================================================
// EventTarget
// ============================================================================

/// Ordered, duplicate-free listener lists keyed by event kind.
pub struct EventTarget<K, F: ?Sized> {
    listeners: Mutex<FxHashMap<K, Vec<Arc<F>>>>,
}

impl<K, F: ?Sized> EventTarget<K, F>
where
    K: Eq + Hash,
{
    /// Creates an empty target.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(FxHashMap::default()),
        }
    }

    /// Appends `listener` for `kind`.
    ///
    /// Returns `false` if that exact listener was already registered.
    pub fn add(&self, kind: K, listener: Arc<F>) -> bool {
        let mut map = self.listeners.lock();
        let list = map.entry(kind).or_default();
        if list.iter().any(|existing| same(existing, &listener)) {
            return false;
        }
        list.push(listener);
        true
    }

    /// Removes `listener` from `kind`.
    ///
    /// Returns `true` if it was registered.
    pub fn remove(&self, kind: &K, listener: &Arc<F>) -> bool {
        let mut map = self.listeners.lock();
        let Some(list) = map.get_mut(kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|existing| !same(existing, listener));
        before != list.len()
    }

    /// Returns a snapshot of the listeners for `kind`.
    #[must_use]
    pub fn listeners(&self, kind: &K) -> Vec<Arc<F>> {
        self.listeners
            .lock()
            .get(kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the number of listeners for `kind`.
    #[must_use]
    pub fn count(&self, kind: &K) -> usize {
        self.listeners.lock().get(kind).map_or(0, Vec::len)
    }
}

impl<K, F: ?Sized> Default for EventTarget<K, F>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, F: ?Sized> fmt::Debug for EventTarget<K, F>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.listeners.lock();
        let mut debug = f.debug_map();
        for (kind, list) in map.iter() {
            debug.entry(kind, &list.len());
        }
        debug.finish()
    }
}

/// Compares data addresses only; vtable pointers may differ per codegen unit.
#[inline]
fn same<F: ?Sized>(a: &Arc<F>, b: &Arc<F>) -> bool {
    ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

// ============================================================================
// Tests
// ============================================================================
