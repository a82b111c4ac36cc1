//! Acceptor configuration and per-call options.
//!
//! # Example
//!
//! ```ignore
//! use mock_socket::AcceptorOptions;
//!
//! let options = AcceptorOptions::new()
//!     .with_mock_global(false)
//!     .with_protocol_selector(|requested| {
//!         if requested.iter().any(|p| p == "chat") { "chat".into() } else { String::new() }
//!     })
//!     .with_client_verifier(|| true);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use super::PeerHandle;

// ============================================================================
// Hook Types
// ============================================================================

/// Picks a subprotocol from the peer's requested list.
///
/// Returning `""` accepts the connection without a subprotocol. Returning a
/// value the peer did not request fails the handshake.
pub type ProtocolSelector = Arc<dyn Fn(&[String]) -> String + Send + Sync>;

/// Decides whether a connection attempt is admitted.
pub type ClientVerifier = Arc<dyn Fn() -> bool + Send + Sync>;

// ============================================================================
// AcceptorOptions
// ============================================================================

/// Configuration of an [`Acceptor`](super::Acceptor).
#[derive(Clone)]
pub struct AcceptorOptions {
    /// Install this acceptor's registry as the process-wide default
    /// connector while it runs. Defaults to `true`.
    pub mock_global: bool,

    /// Subprotocol negotiation hook.
    pub select_protocol: Option<ProtocolSelector>,

    /// Access-check hook.
    pub verify_client: Option<ClientVerifier>,
}

impl Default for AcceptorOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AcceptorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcceptorOptions")
            .field("mock_global", &self.mock_global)
            .field("select_protocol", &self.select_protocol.is_some())
            .field("verify_client", &self.verify_client.is_some())
            .finish()
    }
}

impl AcceptorOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            mock_global: true,
            select_protocol: None,
            verify_client: None,
        }
    }

    /// Enables or disables the global connector install.
    #[inline]
    #[must_use]
    pub fn with_mock_global(mut self, enabled: bool) -> Self {
        self.mock_global = enabled;
        self
    }

    /// Sets the subprotocol negotiation hook.
    #[inline]
    #[must_use]
    pub fn with_protocol_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        self.select_protocol = Some(Arc::new(selector));
        self
    }

    /// Sets the access-check hook.
    #[inline]
    #[must_use]
    pub fn with_client_verifier<F>(mut self, verifier: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.verify_client = Some(Arc::new(verifier));
        self
    }
}

// ============================================================================
// CloseOptions
// ============================================================================

/// Options for [`Acceptor::close`](super::Acceptor::close).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseOptions {
    /// Close code sent to every peer. Defaults to 1000.
    pub code: Option<u16>,
    /// Close reason. Defaults to `""`.
    pub reason: Option<String>,
    /// Explicit clean flag. Derived from the code when unset.
    pub was_clean: Option<bool>,
}

impl CloseOptions {
    /// Creates empty options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the close code.
    #[inline]
    #[must_use]
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    /// Sets the close reason.
    #[inline]
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets the clean flag.
    #[inline]
    #[must_use]
    pub fn with_was_clean(mut self, was_clean: bool) -> Self {
        self.was_clean = Some(was_clean);
        self
    }
}

// ============================================================================
// EmitOptions
// ============================================================================

/// Options for [`Acceptor::send`](super::Acceptor::send) and
/// [`Acceptor::emit`](super::Acceptor::emit).
#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    /// Recipients. All attached peers when unset.
    pub peers: Option<Vec<PeerHandle>>,
}

impl EmitOptions {
    /// Creates options targeting every attached peer.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts delivery to `peers`.
    #[inline]
    #[must_use]
    pub fn to_peers(mut self, peers: impl IntoIterator<Item = PeerHandle>) -> Self {
        self.peers = Some(peers.into_iter().collect());
        self
    }
}

// ============================================================================
// Protocols
// ============================================================================

/// Subprotocols requested by a connecting peer.
///
/// A blank single protocol and an empty list both mean "none requested".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Protocols(Vec<String>);

impl Protocols {
    /// No subprotocol requested.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns the requested list.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consumes into the requested list.
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    fn single(protocol: String) -> Self {
        if protocol.is_empty() {
            Self::none()
        } else {
            Self(vec![protocol])
        }
    }
}

impl From<()> for Protocols {
    fn from((): ()) -> Self {
        Self::none()
    }
}

impl From<&str> for Protocols {
    fn from(protocol: &str) -> Self {
        Self::single(protocol.to_owned())
    }
}

impl From<String> for Protocols {
    fn from(protocol: String) -> Self {
        Self::single(protocol)
    }
}

impl From<Vec<String>> for Protocols {
    fn from(protocols: Vec<String>) -> Self {
        Self(protocols)
    }
}

impl From<Vec<&str>> for Protocols {
    fn from(protocols: Vec<&str>) -> Self {
        Self(protocols.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for Protocols {
    fn from(protocols: &[&str]) -> Self {
        Self(protocols.iter().map(|p| (*p).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Protocols {
    fn from(protocols: [&str; N]) -> Self {
        Self(protocols.iter().map(|p| (*p).to_owned()).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptor_defaults() {
        let options = AcceptorOptions::default();
        assert!(options.mock_global);
        assert!(options.select_protocol.is_none());
        assert!(options.verify_client.is_none());
    }

    #[test]
    fn test_acceptor_builder() {
        let options = AcceptorOptions::new()
            .with_mock_global(false)
            .with_protocol_selector(|requested| requested[0].clone())
            .with_client_verifier(|| false);

        assert!(!options.mock_global);
        let select = options.select_protocol.as_ref().unwrap();
        assert_eq!(select(&["chat".to_owned()]), "chat");
        let verify = options.verify_client.as_ref().unwrap();
        assert!(!verify());
    }

    #[test]
    fn test_acceptor_debug_hides_closures() {
        let options = AcceptorOptions::new().with_client_verifier(|| true);
        let debug = format!("{options:?}");
        assert!(debug.contains("verify_client: true"));
        assert!(debug.contains("select_protocol: false"));
    }

    #[test]
    fn test_close_builder() {
        let options = CloseOptions::new()
            .with_code(4001)
            .with_reason("shutdown")
            .with_was_clean(false);
        assert_eq!(options.code, Some(4001));
        assert_eq!(options.reason.as_deref(), Some("shutdown"));
        assert_eq!(options.was_clean, Some(false));
    }

    #[test]
    fn test_protocols_conversions() {
        assert!(Protocols::from(()).as_slice().is_empty());
        assert!(Protocols::from("").as_slice().is_empty());
        assert_eq!(Protocols::from("chat").into_vec(), vec!["chat"]);
        assert_eq!(
            Protocols::from(["chat", "superchat"]).into_vec(),
            vec!["chat", "superchat"]
        );
        assert_eq!(Protocols::from(Vec::<String>::new()), Protocols::none());
    }
}
