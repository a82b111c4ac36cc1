//! Simulated socket endpoints.
//!
//! | Type | Role |
//! |------|------|
//! | [`Acceptor`] | Listening endpoint bound to an address |
//! | [`PeerHandle`] | Connecting endpoint with the browser socket state machine |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `acceptor` | [`Acceptor`] and its notifications |
//! | `options` | Acceptor configuration and per-call options |
//! | `peer` | [`PeerHandle`] |
//! | `state` | [`ReadyState`] and [`BinaryType`] |

// ============================================================================
// Submodules
// ============================================================================

/// Listening endpoint.
pub mod acceptor;

/// Configuration types.
pub mod options;

/// Connecting endpoint.
pub mod peer;

/// Connection states.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use acceptor::{Acceptor, AcceptorEvent, AcceptorEventKind, AcceptorHandler, Simulation};
pub use options::{
    AcceptorOptions, ClientVerifier, CloseOptions, EmitOptions, ProtocolSelector, Protocols,
};
pub use peer::PeerHandle;
pub use state::{BinaryType, ReadyState};
