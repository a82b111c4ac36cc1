//! Peer connection states.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ReadyState
// ============================================================================

/// Connection state of a [`PeerHandle`](super::PeerHandle).
///
/// ```text
/// CONNECTING ──► OPEN ──► CLOSING ──► CLOSED
///      │                                ▲
///      └──── handshake failure ─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadyState {
    /// Handshake pending.
    Connecting = 0,
    /// Handshake succeeded.
    Open = 1,
    /// Close requested, completion pending.
    Closing = 2,
    /// Terminal.
    Closed = 3,
}

impl ReadyState {
    /// Returns the numeric value used by the browser API.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` for `CLOSING` and `CLOSED`.
    #[inline]
    #[must_use]
    pub const fn is_closing_or_closed(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
        })
    }
}

// ============================================================================
// BinaryType
// ============================================================================

/// How a peer would expose binary data. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BinaryType {
    /// `"blob"`.
    #[default]
    Blob,
    /// `"arraybuffer"`.
    ArrayBuffer,
}

// ============================================================================
// Tests
// ============================================================================
