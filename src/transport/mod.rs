//! In-memory transport plumbing.
//!
//! Nothing here touches a real network. Acceptors and peers meet in a
//! [`Registry`] and every deferred effect runs on the registry's
//! [`Scheduler`].
//!
//! # Connection Lifecycle
//!
//! 1. `Acceptor::bind` - Registry entry created for the address
//! 2. `PeerHandle::connect` - Peer attached, handshake run, outcome scheduled
//! 3. One turn later - `open` on the peer and `connection` on the acceptor
//!    (or `error` + `close` on the peer)
//! 4. `send` - Delivery scheduled to the other side's listeners
//! 5. `close` - Peer detached, both sides notified
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `global` | Process-wide default connector |
//! | `registry` | Address registry |
//! | `scheduler` | Cooperative delivery queue |

// ============================================================================
// Submodules
// ============================================================================

/// Process-wide default connector.
pub mod global;

/// Address registry.
pub mod registry;

/// Cooperative delivery queue.
pub mod scheduler;

// ============================================================================
// Re-exports
// ============================================================================

pub use global::Connector;
pub use registry::Registry;
pub use scheduler::Scheduler;
