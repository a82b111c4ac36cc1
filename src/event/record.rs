//! Notification records delivered to peer listeners.
//!
//! Three immutable shapes exist, mirroring the browser event model:
//!
//! | Shape | Kinds | Extra fields |
//! |-------|-------|--------------|
//! | [`BasicEvent`] | `open`, `error` | none |
//! | [`MessageEvent`] | `message`, custom kinds | `data`, `origin` |
//! | [`CloseEvent`] | `close` | `code`, `reason`, `was_clean` |
//!
//! Records are built by the [`factory`](super::factory) functions.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::socket::PeerHandle;

use super::Payload;

// ============================================================================
// EventKind
// ============================================================================

/// Kind of a peer notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Handshake completed.
    Open,
    /// Data arrived.
    Message,
    /// Connection failed or errored.
    Error,
    /// Connection closed.
    Close,
    /// Application-defined kind emitted by an acceptor.
    Custom(String),
}

impl EventKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Message => "message",
            Self::Error => "error",
            Self::Close => "close",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        match name {
            "open" => Self::Open,
            "message" => Self::Message,
            "error" => Self::Error,
            "close" => Self::Close,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Listener
// ============================================================================

/// Peer event listener.
///
/// Listeners are compared by `Arc` identity: keep the `Arc` around to
/// remove it later with [`PeerHandle::off`].
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Wraps a closure into a [`Listener`].
#[inline]
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    Arc::new(f)
}

// ============================================================================
// BasicEvent
// ============================================================================

/// Event without extra fields.
#[derive(Debug, Clone)]
pub struct BasicEvent {
    pub(super) kind: EventKind,
    pub(super) target: Option<PeerHandle>,
}

// ============================================================================
// MessageEvent
// ============================================================================

/// Event carrying data from an acceptor.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub(super) kind: EventKind,
    pub(super) target: Option<PeerHandle>,
    pub(super) data: Payload,
    pub(super) origin: String,
}

impl MessageEvent {
    /// Returns the payload.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &Payload {
        &self.data
    }

    /// Returns the address of the acceptor that sent the data.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Deserializes the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error if the payload is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        self.data.parse_json()
    }
}

// ============================================================================
// CloseEvent
// ============================================================================

/// Event reporting connection closure.
#[derive(Debug, Clone)]
pub struct CloseEvent {
    pub(super) target: Option<PeerHandle>,
    pub(super) code: u16,
    pub(super) reason: String,
    pub(super) was_clean: bool,
}

impl CloseEvent {
    /// Returns the close code.
    #[inline]
    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Returns the close reason.
    #[inline]
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns whether the close was clean.
    #[inline]
    #[must_use]
    pub fn was_clean(&self) -> bool {
        self.was_clean
    }
}

// ============================================================================
// Event
// ============================================================================

static CLOSE_KIND: EventKind = EventKind::Close;

/// A notification delivered to peer listeners.
#[derive(Debug, Clone)]
pub enum Event {
    /// `open` or `error`.
    Basic(BasicEvent),
    /// `message` or a custom kind.
    Message(MessageEvent),
    /// `close`.
    Close(CloseEvent),
}

impl Event {
    /// Returns the event kind.
    #[must_use]
    pub fn kind(&self) -> &EventKind {
        match self {
            Self::Basic(event) => &event.kind,
            Self::Message(event) => &event.kind,
            Self::Close(_) => &CLOSE_KIND,
        }
    }

    /// Returns the peer the event is addressed to, if any.
    #[must_use]
    pub fn target(&self) -> Option<&PeerHandle> {
        match self {
            Self::Basic(event) => event.target.as_ref(),
            Self::Message(event) => event.target.as_ref(),
            Self::Close(event) => event.target.as_ref(),
        }
    }

    /// Returns the message fields, if this is a message-shaped event.
    #[inline]
    #[must_use]
    pub fn as_message(&self) -> Option<&MessageEvent> {
        match self {
            Self::Message(event) => Some(event),
            _ => None,
        }
    }

    /// Returns the close fields, if this is a close event.
    #[inline]
    #[must_use]
    pub fn as_close(&self) -> Option<&CloseEvent> {
        match self {
            Self::Close(event) => Some(event),
            _ => None,
        }
    }
}
