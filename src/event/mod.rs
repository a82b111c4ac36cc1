//! Peer notifications.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `factory` | Builds immutable event records |
//! | `payload` | Message data |
//! | `record` | Event record shapes and [`EventKind`] |
//! | `target` | Listener storage shared by peers and acceptors |

// ============================================================================
// Submodules
// ============================================================================

/// Event record construction.
pub mod factory;

/// Message payloads.
pub mod payload;

/// Event record shapes.
pub mod record;

/// Listener storage.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use factory::{create_close_event, create_event, create_message_event};
pub use payload::Payload;
pub use record::{BasicEvent, CloseEvent, Event, EventKind, Listener, MessageEvent, listener};
pub use target::EventTarget;
