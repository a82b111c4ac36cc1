//! Process-wide default connector.
//!
//! Code under test often cannot be handed a [`Registry`]: it just opens a
//! socket. An [`Acceptor`](crate::Acceptor) built with `mock_global` enabled
//! installs a [`Connector`] for its registry here, and [`connect`] routes
//! through whatever connector is installed. `Acceptor::stop` puts back the
//! connector that was installed before it, or clears the slot.
//!
//! The slot is shared by the whole process. Tests that assert on it should
//! live in their own test binary.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::{RwLock, const_rwlock};
use tracing::debug;

use crate::error::{Error, Result};
use crate::socket::{PeerHandle, Protocols};

use super::Registry;

// ============================================================================
// Global Slot
// ============================================================================

static DEFAULT_CONNECTOR: RwLock<Option<Connector>> = const_rwlock(None);

// ============================================================================
// Connector
// ============================================================================

/// Constructs peers on a fixed registry.
#[derive(Debug, Clone)]
pub struct Connector {
    registry: Registry,
}

impl Connector {
    /// Creates a connector for `registry`.
    #[inline]
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Returns the registry peers are created on.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Connects a new peer. See [`PeerHandle::connect`].
    ///
    /// # Errors
    ///
    /// Same as [`PeerHandle::connect`].
    pub fn connect(&self, address: &str, protocols: impl Into<Protocols>) -> Result<PeerHandle> {
        PeerHandle::connect(&self.registry, address, protocols)
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Installs `connector`, returning the one it replaced.
pub fn install(connector: Connector) -> Option<Connector> {
    debug!("Default connector installed");
    DEFAULT_CONNECTOR.write().replace(connector)
}

/// Clears the slot, returning the connector that was installed.
pub fn uninstall() -> Option<Connector> {
    debug!("Default connector removed");
    DEFAULT_CONNECTOR.write().take()
}

/// Puts `previous` back, or clears the slot when `None`.
pub(crate) fn restore(previous: Option<Connector>) {
    match previous {
        Some(connector) => {
            install(connector);
        }
        None => {
            uninstall();
        }
    }
}

/// Returns the installed connector.
#[must_use]
pub fn installed() -> Option<Connector> {
    DEFAULT_CONNECTOR.read().clone()
}

/// Connects a peer through the installed connector.
///
/// # Errors
///
/// - [`Error::NotInstalled`] if no connector is installed
/// - otherwise the errors of [`PeerHandle::connect`]
pub fn connect(address: &str, protocols: impl Into<Protocols>) -> Result<PeerHandle> {
    let connector = installed().ok_or(Error::NotInstalled)?;
    connector.connect(address, protocols)
}
