//! Error types for mock-socket.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use mock_socket::{PeerHandle, Registry, Result};
//!
//! fn example(registry: &Registry) -> Result<()> {
//!     let peer = PeerHandle::connect(registry, "ws://localhost:8080", ())?;
//!     peer.close(Some(4000), Some("done"))?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Construction | [`Error::MissingAddress`], [`Error::InvalidAddress`], [`Error::InvalidScheme`], [`Error::FragmentPresent`] |
//! | Operation | [`Error::InvalidState`], [`Error::CloseCodeOutOfRange`] |
//! | Acceptor channel | [`Error::AlreadyListening`] |
//! | Handshake (logged) | [`Error::Handshake`] |
//! | Global install | [`Error::NotInstalled`] |
//! | Internal | [`Error::Internal`] |
//!
//! Handshake failures never come back from a constructor. They are only
//! observable as `error` + `close` events on the peer, and as
//! [`Error::Handshake`] in log output.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::socket::ReadyState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Construction Errors
    // ========================================================================
    /// Peer constructed without an address.
    #[error("Failed to construct 'WebSocket': 1 argument required, but only 0 present.")]
    MissingAddress,

    /// Address could not be parsed.
    #[error("Invalid address '{address}': {message}")]
    InvalidAddress {
        /// The rejected input.
        address: String,
        /// Parser message.
        message: String,
    },

    /// Address scheme is not `ws` or `wss`.
    #[error("SyntaxError: url scheme incorrect ({scheme})")]
    InvalidScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// Address carries a `#fragment`.
    #[error("SyntaxError: url fragment exists ({address})")]
    FragmentPresent {
        /// The rejected input.
        address: String,
    },

    // ========================================================================
    // Operation Errors
    // ========================================================================
    /// Operation not allowed in the current ready state.
    ///
    /// Returned by `send` while the handshake is still pending.
    #[error("InvalidStateError: operation not allowed while {state}")]
    InvalidState {
        /// State the peer was in.
        state: ReadyState,
    },

    /// Close code outside `1000` and `3000..5000`.
    #[error("InvalidAccessError: close code {code} out of user configurable range")]
    CloseCodeOutOfRange {
        /// The rejected code.
        code: u16,
    },

    // ========================================================================
    // Acceptor Channel Errors
    // ========================================================================
    /// Another acceptor already owns the address.
    #[error("A mock server is already listening on {address}")]
    AlreadyListening {
        /// The contested address.
        address: String,
    },

    /// Connection handshake rejected.
    #[error("WebSocket connection to '{address}' failed{reason}")]
    Handshake {
        /// Address the peer tried to reach.
        address: String,
        /// Failure detail, prefixed with `": "` when present.
        reason: String,
    },

    /// No default connector is installed.
    ///
    /// Returned by [`global::connect`](crate::global::connect) when no
    /// acceptor with `mock_global` is active.
    #[error("WebSocket is not defined: no default connector installed")]
    NotInstalled,

    // ========================================================================
    // Internal Errors
    // ========================================================================
    /// Dispatch invariant broken (missing peer or data).
    #[error("Internal error: {message}")]
    Internal {
        /// What was missing.
        message: String,
    },
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid address error.
    #[inline]
    pub fn invalid_address(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid scheme error.
    #[inline]
    pub fn invalid_scheme(scheme: impl Into<String>) -> Self {
        Self::InvalidScheme {
            scheme: scheme.into(),
        }
    }

    /// Creates a fragment present error.
    #[inline]
    pub fn fragment_present(address: impl Into<String>) -> Self {
        Self::FragmentPresent {
            address: address.into(),
        }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(state: ReadyState) -> Self {
        Self::InvalidState { state }
    }

    /// Creates a close code out of range error.
    #[inline]
    pub fn close_code_out_of_range(code: u16) -> Self {
        Self::CloseCodeOutOfRange { code }
    }

    /// Creates an already listening error.
    #[inline]
    pub fn already_listening(address: impl Into<String>) -> Self {
        Self::AlreadyListening {
            address: address.into(),
        }
    }

    /// Creates a handshake error.
    ///
    /// An empty `reason` renders as the bare failure message.
    #[inline]
    pub fn handshake(address: impl Into<String>, reason: &str) -> Self {
        let reason = if reason.is_empty() {
            String::new()
        } else {
            format!(": {reason}")
        };
        Self::Handshake {
            address: address.into(),
            reason,
        }
    }

    /// Creates an internal error.
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error is raised by peer construction.
    #[inline]
    #[must_use]
    pub fn is_constructor_error(&self) -> bool {
        matches!(
            self,
            Self::MissingAddress
                | Self::InvalidAddress { .. }
                | Self::InvalidScheme { .. }
                | Self::FragmentPresent { .. }
        )
    }

    /// Returns `true` if this error reports API misuse on a live socket.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidState { .. } | Self::CloseCodeOutOfRange { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
