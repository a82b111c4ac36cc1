//! Type-safe identifiers for simulated endpoints.
//!
//! Handles are compared by identity, not by address: two peers connected to
//! the same address are still distinct registry members. Each handle gets a
//! process-unique id from an atomic counter at construction.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// Counters
// ============================================================================

static NEXT_PEER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_ACCEPTOR_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// PeerId
// ============================================================================

/// Identifier of a [`PeerHandle`](crate::PeerHandle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    /// Allocates the next peer id.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_PEER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

// ============================================================================
// AcceptorId
// ============================================================================

/// Identifier of an [`Acceptor`](crate::Acceptor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AcceptorId(u64);

impl AcceptorId {
    /// Allocates the next acceptor id.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ACCEPTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AcceptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acceptor-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
