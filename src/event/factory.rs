//! Event record construction.

// ============================================================================
// Imports
// ============================================================================

use crate::close_code;
use crate::socket::PeerHandle;

use super::{BasicEvent, CloseEvent, Event, EventKind, MessageEvent, Payload};

// ============================================================================
// Factory Functions
// ============================================================================

/// Builds an event without extra fields (`open`, `error`).
#[must_use]
pub fn create_event(kind: EventKind, target: Option<&PeerHandle>) -> Event {
    Event::Basic(BasicEvent {
        kind,
        target: target.cloned(),
    })
}

/// Builds a message-shaped event.
#[must_use]
pub fn create_message_event(
    kind: EventKind,
    target: Option<&PeerHandle>,
    data: Payload,
    origin: impl Into<String>,
) -> Event {
    Event::Message(MessageEvent {
        kind,
        target: target.cloned(),
        data,
        origin: origin.into(),
    })
}

/// Builds a close event.
///
/// When `was_clean` is `None` it is derived from `code == 1000`.
#[must_use]
pub fn create_close_event(
    target: Option<&PeerHandle>,
    code: u16,
    reason: impl Into<String>,
    was_clean: Option<bool>,
) -> Event {
    Event::Close(CloseEvent {
        target: target.cloned(),
        code,
        reason: reason.into(),
        was_clean: was_clean.unwrap_or(code == close_code::NORMAL),
    })
}

// ============================================================================
// Tests
// ============================================================================
