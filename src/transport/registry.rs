//! Address registry: the rendezvous point between acceptors and peers.
//!
//! Maps each normalized [`Address`] to the one [`Acceptor`] bound there and
//! the peers currently attached to it, in attachment order.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Registry                    │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ ws://host/a → Acceptor 1, [peer 1, 2]  │  │
//! │  │ ws://host/b → Acceptor 2, []           │  │
//! │  └────────────────────────────────────────┘  │
//! │  Scheduler (caller-drained task queue)       │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! A registry is an explicit object: create one per test and pass it to
//! every acceptor and peer. Entries live until `unbind`/`detach` (or
//! [`Registry::clear`]) removes them.
//!
//! Acceptors and peers hold their registry, and the registry holds the
//! bound acceptors, attached peers and queued tasks. That cycle keeps the
//! whole registry allocated until entries are removed and the queue is
//! drained; dropping the handles alone frees nothing.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::address::Address;
use crate::identifiers::AcceptorId;
use crate::socket::{Acceptor, PeerHandle};

use super::Scheduler;

// ============================================================================
// RegistryEntry
// ============================================================================

/// One address's acceptor and attached peers.
struct RegistryEntry {
    /// The bound acceptor.
    acceptor: Acceptor,
    /// Attached peers in attachment order, no duplicates.
    peers: Vec<PeerHandle>,
}

// ============================================================================
// Registry
// ============================================================================

/// Process-local table of bound acceptors and attached peers.
///
/// Cloning yields another handle to the same table and scheduler.
///
/// # Example
///
/// ```ignore
/// let registry = Registry::new();
/// let acceptor = Acceptor::bind(&registry, "ws://localhost:8080", AcceptorOptions::new())?;
/// let peer = PeerHandle::connect(&registry, "ws://localhost:8080", ())?;
///
/// registry.flush().await;
/// assert_eq!(acceptor.clients(), vec![peer]);
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    /// Entries by normalized address.
    entries: Mutex<FxHashMap<Address, RegistryEntry>>,
    /// Delivery queue shared by every endpoint on this registry.
    scheduler: Scheduler,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.len())
            .field("scheduler", &self.inner.scheduler)
            .finish()
    }
}

// ============================================================================
// Registry - Constructor
// ============================================================================

impl Registry {
    /// Creates an empty registry with its own task queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: Mutex::new(FxHashMap::default()),
                scheduler: Scheduler::new(),
            }),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Registry - Scheduling
// ============================================================================

impl Registry {
    /// Returns the delivery queue.
    #[inline]
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Waits for one cooperative turn. See [`Scheduler::flush`].
    pub async fn flush(&self) {
        self.inner.scheduler.flush().await;
    }

    /// Waits until no deliveries are pending. See [`Scheduler::settle`].
    pub async fn settle(&self) {
        self.inner.scheduler.settle().await;
    }
}

// ============================================================================
// Registry - Binding
// ============================================================================

impl Registry {
    /// Binds `acceptor` to `address`.
    ///
    /// Returns `None` if the address is already bound; the existing entry
    /// is left untouched.
    pub fn bind(&self, acceptor: &Acceptor, address: &Address) -> Option<Acceptor> {
        let mut entries = self.inner.entries.lock();
        if entries.contains_key(address) {
            debug!(address = %address, "Address already bound");
            return None;
        }

        entries.insert(
            address.clone(),
            RegistryEntry {
                acceptor: acceptor.clone(),
                peers: Vec::new(),
            },
        );

        debug!(address = %address, acceptor = %acceptor.id(), "Acceptor bound");
        Some(acceptor.clone())
    }

    /// Removes the entry for `address`. No-op if absent.
    pub fn unbind(&self, address: &Address) {
        if self.inner.entries.lock().remove(address).is_some() {
            debug!(address = %address, "Acceptor unbound");
        }
    }

    /// Removes the entry for `address` only if `owner` is bound there.
    ///
    /// Returns `true` if an entry was removed.
    pub(crate) fn unbind_owned(&self, address: &Address, owner: AcceptorId) -> bool {
        let mut entries = self.inner.entries.lock();
        let owned = entries
            .get(address)
            .is_some_and(|entry| entry.acceptor.id() == owner);

        if owned {
            entries.remove(address);
            debug!(address = %address, acceptor = %owner, "Acceptor unbound");
        }
        owned
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let removed = {
            let mut entries = self.inner.entries.lock();
            let count = entries.len();
            entries.clear();
            count
        };

        if removed > 0 {
            debug!(count = removed, "Registry cleared");
        }
    }
}

// ============================================================================
// Registry - Attachment
// ============================================================================

impl Registry {
    /// Attaches `peer` to the entry for `address`.
    ///
    /// Returns the bound acceptor, or `None` if nothing listens there or the
    /// peer is already attached.
    pub fn attach(&self, peer: &PeerHandle, address: &Address) -> Option<Acceptor> {
        let mut entries = self.inner.entries.lock();
        let entry = entries.get_mut(address)?;

        if entry.peers.iter().any(|p| p.id() == peer.id()) {
            trace!(address = %address, peer = %peer.id(), "Peer already attached");
            return None;
        }

        entry.peers.push(peer.clone());
        trace!(address = %address, peer = %peer.id(), "Peer attached");
        Some(entry.acceptor.clone())
    }

    /// Detaches `peer` from the entry for `address`. No-op if absent.
    pub fn detach(&self, peer: &PeerHandle, address: &Address) {
        let mut entries = self.inner.entries.lock();
        if let Some(entry) = entries.get_mut(address) {
            let before = entry.peers.len();
            entry.peers.retain(|p| p.id() != peer.id());
            if entry.peers.len() != before {
                trace!(address = %address, peer = %peer.id(), "Peer detached");
            }
        }
    }
}

// ============================================================================
// Registry - Lookup
// ============================================================================

impl Registry {
    /// Returns the acceptor bound to `address`.
    #[must_use]
    pub fn lookup_acceptor(&self, address: &Address) -> Option<Acceptor> {
        self.inner
            .entries
            .lock()
            .get(address)
            .map(|entry| entry.acceptor.clone())
    }

    /// Returns the peers attached to `address`, in attachment order.
    #[must_use]
    pub fn lookup_peers(&self, address: &Address) -> Vec<PeerHandle> {
        self.inner
            .entries
            .lock()
            .get(address)
            .map(|entry| entry.peers.clone())
            .unwrap_or_default()
    }

    /// Returns the number of bound addresses.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Returns `true` if nothing is bound.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Tests
// ============================================================================
