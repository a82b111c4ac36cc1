//! Endpoint address normalization.
//!
//! Addresses are parsed with the [`url`] crate and serialized back into a
//! canonical string, which is the registry key. Normalization lowercases the
//! host, drops default ports and defaults an empty path to `/`, so
//! `ws://LOCALHOST:80` and `ws://localhost/` name the same rendezvous point.
//!
//! Peers only accept the `ws` and `wss` schemes and reject fragments.
//! Acceptors accept any absolute address.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Schemes a peer may connect to.
const PEER_SCHEMES: [&str; 2] = ["ws", "wss"];

// ============================================================================
// Address
// ============================================================================

/// A normalized endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    url: Url,
}

impl Address {
    /// Normalizes an address a peer wants to connect to.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingAddress`] if `input` is blank
    /// - [`Error::InvalidAddress`] if `input` is not an absolute URL
    /// - [`Error::InvalidScheme`] if the scheme is not `ws`/`wss`
    /// - [`Error::FragmentPresent`] if `input` has a `#fragment`
    pub fn for_peer(input: &str) -> Result<Self> {
        let url = parse(input)?;

        if !PEER_SCHEMES.contains(&url.scheme()) {
            return Err(Error::invalid_scheme(url.scheme()));
        }

        if url.fragment().is_some() {
            return Err(Error::fragment_present(input));
        }

        Ok(Self::from_url(url))
    }

    /// Normalizes an address an acceptor listens on.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingAddress`] if `input` is blank
    /// - [`Error::InvalidAddress`] if `input` is not an absolute URL
    pub fn for_acceptor(input: &str) -> Result<Self> {
        parse(input).map(Self::from_url)
    }

    fn from_url(mut url: Url) -> Self {
        if url.path().is_empty() && !url.cannot_be_a_base() {
            url.set_path("/");
        }
        Self { url }
    }

    /// Returns the canonical string form.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Returns the scheme, without the trailing `:`.
    #[inline]
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Returns the host, if any.
    #[inline]
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// Returns the path (at least `/` for hierarchical addresses).
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingAddress);
    }
    Url::parse(trimmed).map_err(|e| Error::invalid_address(input, e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_defaults_to_root() {
        let address = Address::for_peer("ws://localhost:8080").unwrap();
        assert_eq!(address.as_str(), "ws://localhost:8080/");
        assert_eq!(address.path(), "/");
    }

    #[test]
    fn test_host_is_lowercased_and_default_port_dropped() {
        let a = Address::for_peer("ws://LOCALHOST:80").unwrap();
        let b = Address::for_peer("ws://localhost/").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.host(), Some("localhost"));
    }

    #[test]
    fn test_path_and_query_are_kept() {
        let address = Address::for_peer("wss://example.com/chat?room=1").unwrap();
        assert_eq!(address.as_str(), "wss://example.com/chat?room=1");
        assert_eq!(address.scheme(), "wss");
    }

    #[test]
    fn test_peer_rejects_other_schemes() {
        let err = Address::for_peer("http://localhost:8080").unwrap_err();
        assert_eq!(err, Error::invalid_scheme("http"));
    }

    #[test]
    fn test_peer_rejects_fragment() {
        let err = Address::for_peer("ws://localhost:8080/#frag").unwrap_err();
        assert!(matches!(err, Error::FragmentPresent { .. }));
    }

    #[test]
    fn test_blank_address_is_missing() {
        assert_eq!(Address::for_peer("").unwrap_err(), Error::MissingAddress);
        assert_eq!(Address::for_acceptor("  ").unwrap_err(), Error::MissingAddress);
    }

    #[test]
    fn test_relative_address_is_invalid() {
        let err = Address::for_acceptor("/just/a/path").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { .. }));
    }

    #[test]
    fn test_acceptor_accepts_any_scheme() {
        let address = Address::for_acceptor("foo://bar").unwrap();
        assert_eq!(address.as_str(), "foo://bar/");

        let ws = Address::for_acceptor("ws://localhost:8080").unwrap();
        assert_eq!(ws, Address::for_peer("ws://localhost:8080/").unwrap());
    }
}
