//! Shared utilities for integration tests.
//!
//! Provides:
//! - Logging initialization
//! - Event recorders for peers and acceptors

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use mock_socket::event::listener;
use mock_socket::{Acceptor, EventKind, PeerHandle};

// ============================================================================
// Constants
// ============================================================================

pub const URL: &str = "ws://localhost:8080";
pub const NORMALIZED_URL: &str = "ws://localhost:8080/";

// ============================================================================
// Types
// ============================================================================

/// Shared log of rendered events.
pub type Log = Arc<Mutex<Vec<String>>>;

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging. Filter comes from `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Records every lifecycle and message event a peer receives.
///
/// Close events render as `close:<code>`, messages as `message:<text>`.
pub fn record_peer(peer: &PeerHandle) -> Log {
    let log = Log::default();
    for kind in [
        EventKind::Open,
        EventKind::Message,
        EventKind::Error,
        EventKind::Close,
    ] {
        let sink = Arc::clone(&log);
        peer.on(
            kind,
            listener(move |event| {
                let entry = if let Some(close) = event.as_close() {
                    format!("close:{}", close.code())
                } else if let Some(message) = event.as_message() {
                    format!("message:{}", message.data().as_text().unwrap_or("<binary>"))
                } else {
                    event.kind().to_string()
                };
                sink.lock().push(entry);
            }),
        );
    }
    log
}

/// Records every notification an acceptor receives.
///
/// Entries: `connection:<peer>`, `message:<peer>`, `close:<peer|none>`,
/// `error`.
pub fn record_acceptor(acceptor: &Acceptor) -> Log {
    let log = Log::default();

    let sink = Arc::clone(&log);
    acceptor.on_connection(move |peer| sink.lock().push(format!("connection:{}", peer.id())));

    let sink = Arc::clone(&log);
    acceptor.on_message(move |peer, _| sink.lock().push(format!("message:{}", peer.id())));

    let sink = Arc::clone(&log);
    acceptor.on_close(move |peer| {
        let who = peer.map_or_else(|| "none".to_owned(), |p| p.id().to_string());
        sink.lock().push(format!("close:{who}"));
    });

    let sink = Arc::clone(&log);
    acceptor.on_error(move |_| sink.lock().push("error".to_owned()));

    log
}
