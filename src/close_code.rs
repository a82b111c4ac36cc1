//! WebSocket close codes.
//!
//! Only [`NORMAL`] and the application range `3000..5000` may be passed to
//! [`PeerHandle::close`](crate::PeerHandle::close). The remaining constants are
//! reserved codes an [`Acceptor`](crate::Acceptor) may still use when it
//! closes its peers.

/// Normal closure.
pub const NORMAL: u16 = 1000;
/// Endpoint going away.
pub const GOING_AWAY: u16 = 1001;
/// Protocol error.
pub const PROTOCOL_ERROR: u16 = 1002;
/// Unsupported data type.
pub const UNSUPPORTED: u16 = 1003;
/// No status code present.
pub const NO_STATUS: u16 = 1005;
/// Closed without a close frame.
pub const ABNORMAL: u16 = 1006;
/// Payload inconsistent with message type.
pub const UNSUPPORTED_DATA: u16 = 1007;
/// Policy violation.
pub const POLICY_VIOLATION: u16 = 1008;
/// Message too big.
pub const TOO_LARGE: u16 = 1009;
/// Client expected an extension the server did not negotiate.
pub const MISSING_EXTENSION: u16 = 1010;
/// Unexpected server condition.
pub const INTERNAL_ERROR: u16 = 1011;
/// Server restarting.
pub const SERVICE_RESTART: u16 = 1012;
/// Try again later.
pub const TRY_AGAIN_LATER: u16 = 1013;
/// TLS handshake failure.
pub const TLS_HANDSHAKE: u16 = 1015;

/// First code of the application range.
pub const USER_RANGE_START: u16 = 3000;
/// One past the last code of the application range.
pub const USER_RANGE_END: u16 = 5000;

/// Returns `true` if a peer may close with `code`.
#[inline]
#[must_use]
pub const fn is_user_closable(code: u16) -> bool {
    code == NORMAL || (code >= USER_RANGE_START && code < USER_RANGE_END)
}

// ============================================================================
// Tests
// ============================================================================
