//! Mock Socket - In-process simulation of browser WebSocket semantics.
//!
//! This library lets test code stand up a fake server and fake clients
//! that behave like the browser `WebSocket` API, without any network I/O.
//!
//! # Architecture
//!
//! Endpoints meet in an explicit [`Registry`]:
//!
//! - **Acceptor**: binds an address, admits peers, fans out notifications
//! - **PeerHandle**: connects to an address, runs the handshake, sends and closes
//!
//! Key design principles:
//!
//! - One [`Registry`] per test; registries never see each other's endpoints
//! - Every observable effect is deferred to the registry's [`Scheduler`] and
//!   runs when the caller awaits `flush`/`settle`, never in the background
//! - A registry and its bound endpoints keep each other alive; call
//!   [`Acceptor::stop`] or [`Registry::clear`] to release them
//! - Handshake failures are events (`error` + `close`), never `Err`
//! - Misuse (bad address, early send, bad close code) is a synchronous `Err`
//!
//! # Quick Start
//!
//! ```no_run
//! use mock_socket::{Acceptor, AcceptorOptions, EmitOptions, PeerHandle, Registry, Result};
//! use mock_socket::event::listener;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let registry = Registry::new();
//!     let acceptor = Acceptor::bind(&registry, "ws://localhost:8080", AcceptorOptions::new())?;
//!     acceptor.on_connection(|peer| println!("{} connected", peer.id()));
//!
//!     let peer = PeerHandle::connect(&registry, "ws://localhost:8080", ())?;
//!     peer.set_on_message(Some(listener(|event| {
//!         println!("got {:?}", event.as_message().map(|m| m.data()));
//!     })));
//!
//!     // Handshake completes after one turn.
//!     registry.flush().await;
//!
//!     acceptor.send("welcome", EmitOptions::new());
//!     registry.flush().await;
//!
//!     acceptor.stop();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`address`] | Address normalization |
//! | [`close_code`] | Close code constants |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`event`] | Event records, payloads, listener storage |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`socket`] | [`Acceptor`] and [`PeerHandle`] |
//! | [`transport`] | [`Registry`], [`Scheduler`], global connector |

// ============================================================================
// Modules
// ============================================================================

/// Address normalization.
pub mod address;

/// Close code constants.
pub mod close_code;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Peer notifications.
pub mod event;

/// Type-safe identifiers for endpoints.
pub mod identifiers;

/// Simulated endpoints.
///
/// - [`Acceptor`] - Listening endpoint
/// - [`PeerHandle`] - Connecting endpoint
pub mod socket;

/// In-memory transport.
///
/// Registry, delivery queue and the process-wide default connector.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Address types
pub use address::Address;

// Error types
pub use error::{Error, Result};

// Event types
pub use event::{CloseEvent, Event, EventKind, Listener, MessageEvent, Payload};

// Identifier types
pub use identifiers::{AcceptorId, PeerId};

// Socket types
pub use socket::{
    Acceptor, AcceptorEvent, AcceptorEventKind, AcceptorHandler, AcceptorOptions, BinaryType,
    CloseOptions, EmitOptions, PeerHandle, Protocols, ReadyState, Simulation,
};

// Transport types
pub use transport::{Connector, Registry, Scheduler, global};
