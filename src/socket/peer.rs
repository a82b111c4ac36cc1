//! Client-side simulated socket.
//!
//! A [`PeerHandle`] mirrors the browser `WebSocket` object: construction
//! returns immediately in `CONNECTING`, and the handshake outcome arrives
//! one cooperative turn later as `open` (success) or `error` + `close`
//! (failure).
//!
//! # Handshake
//!
//! 1. Attach to the registry entry for the address; no entry is a failure
//! 2. Run the acceptor's access check, if any
//! 3. Run the acceptor's subprotocol selector, if any; a value the peer did
//!    not request is a failure
//! 4. Schedule `open` on the peer together with `connection` on the acceptor
//!
//! Failures never surface as `Err` from [`PeerHandle::connect`]. A hook that
//! panics is treated as a rejection.
//!
//! # Example
//!
//! ```ignore
//! let peer = PeerHandle::connect(&registry, "ws://localhost:8080", "chat")?;
//! peer.set_on_message(Some(listener(|event| {
//!     println!("{:?}", event.as_message().map(|m| m.data()));
//! })));
//!
//! registry.flush().await;
//! peer.send("hello")?;
//! peer.close(None, None)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, error, trace, warn};

use crate::address::Address;
use crate::close_code;
use crate::error::{Error, Result};
use crate::event::{
    Event, EventKind, EventTarget, Listener, Payload, create_close_event, create_event,
};
use crate::identifiers::PeerId;
use crate::transport::scheduler::run_guarded;
use crate::transport::{Registry, Scheduler};

use super::acceptor::{Acceptor, AcceptorEventKind};
use super::options::Protocols;
use super::state::{BinaryType, ReadyState};

// ============================================================================
// Constants
// ============================================================================

/// Logged when the access check rejects the peer.
const REASON_AUTH: &str = "HTTP Authentication failed; no valid credentials available";

/// Logged when the selector picks an unrequested subprotocol.
const REASON_PROTOCOL: &str = "Invalid Sub-Protocol";

/// Logged when a handshake hook panics.
const REASON_HOOK_PANIC: &str = "handshake hook panicked";

// ============================================================================
// Types
// ============================================================================

/// Listener callback as stored in the event target.
type ListenerFn = dyn Fn(&Event) + Send + Sync;

/// Mutable connection state.
#[derive(Debug)]
struct PeerState {
    ready_state: ReadyState,
    protocol: String,
    buffered_amount: usize,
    binary_type: BinaryType,
}

/// Shared inner state of a peer.
struct PeerInner {
    id: PeerId,
    address: Address,
    registry: Registry,
    state: Mutex<PeerState>,
    listeners: EventTarget<EventKind, ListenerFn>,
    /// Single-slot handlers (`on_open` style), also present in `listeners`.
    slots: Mutex<FxHashMap<EventKind, Listener>>,
}

// ============================================================================
// PeerHandle
// ============================================================================

/// A simulated client socket.
///
/// Cloning yields another handle to the same socket; equality is identity.
#[derive(Clone)]
pub struct PeerHandle {
    inner: Arc<PeerInner>,
}

impl fmt::Debug for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerHandle")
            .field("id", &self.inner.id)
            .field("url", &self.inner.address.as_str())
            .field("ready_state", &self.ready_state())
            .finish_non_exhaustive()
    }
}

impl PartialEq for PeerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for PeerHandle {}

// ============================================================================
// PeerHandle - Constructor
// ============================================================================

impl PeerHandle {
    /// Opens a simulated connection to `address`.
    ///
    /// Returns in `CONNECTING`; the outcome is delivered as events after
    /// one cooperative turn.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingAddress`] if `address` is blank
    /// - [`Error::InvalidAddress`] if `address` is not an absolute URL
    /// - [`Error::InvalidScheme`] if the scheme is not `ws`/`wss`
    /// - [`Error::FragmentPresent`] if `address` has a fragment
    pub fn connect(
        registry: &Registry,
        address: &str,
        protocols: impl Into<Protocols>,
    ) -> Result<Self> {
        let address = Address::for_peer(address)?;
        let requested = protocols.into().into_vec();

        let peer = Self {
            inner: Arc::new(PeerInner {
                id: PeerId::next(),
                address,
                registry: registry.clone(),
                state: Mutex::new(PeerState {
                    ready_state: ReadyState::Connecting,
                    protocol: requested.first().cloned().unwrap_or_default(),
                    buffered_amount: 0,
                    binary_type: BinaryType::default(),
                }),
                listeners: EventTarget::new(),
                slots: Mutex::new(FxHashMap::default()),
            }),
        };

        debug!(peer = %peer.id(), url = %peer.url(), ?requested, "Peer connecting");

        peer.handshake(&requested);
        Ok(peer)
    }

    /// Runs the handshake and schedules its outcome.
    fn handshake(&self, requested: &[String]) {
        let Some(acceptor) = self.inner.registry.attach(self, &self.inner.address) else {
            self.schedule_failure("");
            return;
        };

        let options = acceptor.options();

        if let Some(verify) = &options.verify_client {
            match run_guarded("client verifier", || verify()) {
                Some(true) => {}
                Some(false) => {
                    self.schedule_failure(REASON_AUTH);
                    return;
                }
                None => {
                    self.schedule_failure(REASON_HOOK_PANIC);
                    return;
                }
            }
        }

        if let Some(select) = &options.select_protocol {
            let Some(selected) = run_guarded("protocol selector", || select(requested)) else {
                self.schedule_failure(REASON_HOOK_PANIC);
                return;
            };

            if !selected.is_empty() && !requested.contains(&selected) {
                self.schedule_failure(REASON_PROTOCOL);
                return;
            }

            self.inner.state.lock().protocol = selected;
        }

        let peer = self.clone();
        self.scheduler()
            .schedule(move || peer.complete_open(&acceptor));
    }

    /// Deferred success path: `open` here, `connection` on the acceptor.
    fn complete_open(&self, acceptor: &Acceptor) {
        {
            let mut state = self.inner.state.lock();
            if state.ready_state != ReadyState::Connecting {
                trace!(peer = %self.id(), state = %state.ready_state, "Open skipped");
                return;
            }
            state.ready_state = ReadyState::Open;
        }

        debug!(peer = %self.id(), url = %self.url(), "Peer open");

        self.dispatch_event(&create_event(EventKind::Open, Some(self)));

        if let Err(e) = acceptor.dispatch(AcceptorEventKind::Connection, Some(self), None) {
            error!(peer = %self.id(), error = %e, "Connection dispatch failed");
        }
    }

    /// Schedules the failure path: `error` then `close` (1000).
    ///
    /// Once scheduled the sequence always runs, whatever the state is by then.
    fn schedule_failure(&self, reason: &str) {
        let failure = Error::handshake(self.url(), reason);
        let peer = self.clone();

        self.scheduler().schedule(move || {
            peer.inner.state.lock().ready_state = ReadyState::Closed;

            peer.inner.registry.detach(&peer, &peer.inner.address);
            peer.dispatch_event(&create_event(EventKind::Error, Some(&peer)));
            peer.dispatch_event(&create_close_event(
                Some(&peer),
                close_code::NORMAL,
                "",
                None,
            ));

            warn!(peer = %peer.id(), error = %failure, "Connection failed");
        });
    }
}

// ============================================================================
// PeerHandle - Accessors
// ============================================================================

impl PeerHandle {
    /// Returns the peer id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> PeerId {
        self.inner.id
    }

    /// Returns the normalized address.
    #[inline]
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.inner.address
    }

    /// Returns the normalized address as a string.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        self.inner.address.as_str()
    }

    /// Returns the registry this peer was created on.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.inner.state.lock().ready_state
    }

    /// Returns the subprotocol: the negotiated one once the handshake ran,
    /// otherwise the first requested one.
    #[must_use]
    pub fn protocol(&self) -> String {
        self.inner.state.lock().protocol.clone()
    }

    /// Returns the negotiated extensions. Always empty.
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &'static str {
        ""
    }

    /// Returns the bytes passed to `send` after the peer started closing.
    ///
    /// Text counts its UTF-8 bytes, not UTF-16 code units as in browsers, so
    /// non-ASCII text reports more than `String.length` would.
    #[inline]
    #[must_use]
    pub fn buffered_amount(&self) -> usize {
        self.inner.state.lock().buffered_amount
    }

    /// Returns the binary type.
    #[inline]
    #[must_use]
    pub fn binary_type(&self) -> BinaryType {
        self.inner.state.lock().binary_type
    }

    /// Sets the binary type.
    #[inline]
    pub fn set_binary_type(&self, binary_type: BinaryType) {
        self.inner.state.lock().binary_type = binary_type;
    }

    #[inline]
    fn scheduler(&self) -> &Scheduler {
        self.inner.registry.scheduler()
    }
}

// ============================================================================
// PeerHandle - Operations
// ============================================================================

impl PeerHandle {
    /// Sends `data` to the acceptor.
    ///
    /// While `CLOSING` or `CLOSED` the data is dropped and its length added
    /// to [`buffered_amount`](Self::buffered_amount).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] while `CONNECTING`; the peer is
    /// detached from the registry first.
    pub fn send(&self, data: impl Into<Payload>) -> Result<()> {
        let data = data.into();

        let ready_state = {
            let mut state = self.inner.state.lock();
            if state.ready_state.is_closing_or_closed() {
                state.buffered_amount += data.len();
            }
            state.ready_state
        };

        match ready_state {
            ReadyState::Connecting => {
                self.inner.registry.detach(self, &self.inner.address);
                Err(Error::invalid_state(ready_state))
            }
            ReadyState::Open => {
                self.deliver_to_acceptor(data);
                Ok(())
            }
            ReadyState::Closing | ReadyState::Closed => Ok(()),
        }
    }

    fn deliver_to_acceptor(&self, data: Payload) {
        let Some(acceptor) = self.inner.registry.lookup_acceptor(&self.inner.address) else {
            trace!(peer = %self.id(), "No acceptor for message");
            return;
        };

        let peer = self.clone();
        self.scheduler().schedule(move || {
            if let Err(e) = acceptor.dispatch(AcceptorEventKind::Message, Some(&peer), Some(&data))
            {
                error!(peer = %peer.id(), error = %e, "Message dispatch failed");
            }
        });
    }

    /// Closes the connection.
    ///
    /// `code` defaults to 1000. Completion (state `CLOSED`, detach, `close`
    /// here and on the acceptor if it is still bound) happens one turn later.
    /// A no-op when already `CLOSING` or `CLOSED`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CloseCodeOutOfRange`] for codes other than 1000 and
    /// `3000..5000`; the state is left unchanged.
    pub fn close(&self, code: Option<u16>, reason: Option<&str>) -> Result<()> {
        if let Some(code) = code
            && !close_code::is_user_closable(code)
        {
            return Err(Error::close_code_out_of_range(code));
        }

        {
            let mut state = self.inner.state.lock();
            if state.ready_state.is_closing_or_closed() {
                return Ok(());
            }
            state.ready_state = ReadyState::Closing;
        }

        let code = code.unwrap_or(close_code::NORMAL);
        let reason = reason.unwrap_or_default().to_owned();
        let peer = self.clone();

        self.scheduler()
            .schedule(move || peer.complete_close(code, &reason));
        Ok(())
    }

    /// Deferred close completion. Runs regardless of the state by then.
    fn complete_close(&self, code: u16, reason: &str) {
        self.inner.state.lock().ready_state = ReadyState::Closed;

        self.inner.registry.detach(self, &self.inner.address);
        self.dispatch_event(&create_close_event(Some(self), code, reason, None));

        debug!(peer = %self.id(), code, "Peer closed");

        if let Some(acceptor) = self.inner.registry.lookup_acceptor(&self.inner.address)
            && let Err(e) = acceptor.dispatch(AcceptorEventKind::Close, Some(self), None)
        {
            error!(peer = %self.id(), error = %e, "Close dispatch failed");
        }
    }

    /// Sets the state without any notification.
    ///
    /// Used by acceptors for bulk close and error simulation; the caller
    /// delivers events itself.
    pub fn force_state(&self, state: ReadyState) {
        self.inner.state.lock().ready_state = state;
    }
}

// ============================================================================
// PeerHandle - Listeners
// ============================================================================

impl PeerHandle {
    /// Registers `listener` for `kind`.
    ///
    /// Returns `false` if that exact listener was already registered.
    pub fn on(&self, kind: impl Into<EventKind>, listener: Listener) -> bool {
        self.inner.listeners.add(kind.into(), listener)
    }

    /// Removes `listener` from `kind`.
    ///
    /// Returns `true` if it was registered.
    pub fn off(&self, kind: impl Into<EventKind>, listener: &Listener) -> bool {
        self.inner.listeners.remove(&kind.into(), listener)
    }

    /// Invokes the listeners for the event's kind, in registration order.
    ///
    /// Returns `true` if at least one listener ran. A panicking listener is
    /// logged and does not stop the others.
    pub fn dispatch_event(&self, event: &Event) -> bool {
        let listeners = self.inner.listeners.listeners(event.kind());
        for listener in &listeners {
            run_guarded("peer listener", || listener(event));
        }
        !listeners.is_empty()
    }

    /// Replaces the `open` slot handler.
    pub fn set_on_open(&self, listener: Option<Listener>) {
        self.set_slot(EventKind::Open, listener);
    }

    /// Returns the `open` slot handler.
    #[must_use]
    pub fn on_open(&self) -> Option<Listener> {
        self.slot(&EventKind::Open)
    }

    /// Replaces the `message` slot handler.
    pub fn set_on_message(&self, listener: Option<Listener>) {
        self.set_slot(EventKind::Message, listener);
    }

    /// Returns the `message` slot handler.
    #[must_use]
    pub fn on_message(&self) -> Option<Listener> {
        self.slot(&EventKind::Message)
    }

    /// Replaces the `error` slot handler.
    pub fn set_on_error(&self, listener: Option<Listener>) {
        self.set_slot(EventKind::Error, listener);
    }

    /// Returns the `error` slot handler.
    #[must_use]
    pub fn on_error(&self) -> Option<Listener> {
        self.slot(&EventKind::Error)
    }

    /// Replaces the `close` slot handler.
    pub fn set_on_close(&self, listener: Option<Listener>) {
        self.set_slot(EventKind::Close, listener);
    }

    /// Returns the `close` slot handler.
    #[must_use]
    pub fn on_close(&self) -> Option<Listener> {
        self.slot(&EventKind::Close)
    }

    /// The previous slot handler leaves the listener list before the new
    /// one joins it.
    fn set_slot(&self, kind: EventKind, listener: Option<Listener>) {
        let previous = {
            let mut slots = self.inner.slots.lock();
            match &listener {
                Some(l) => slots.insert(kind.clone(), Arc::clone(l)),
                None => slots.remove(&kind),
            }
        };

        if let Some(previous) = previous {
            self.inner.listeners.remove(&kind, &previous);
        }

        if let Some(listener) = listener {
            self.inner.listeners.add(kind, listener);
        }
    }

    fn slot(&self, kind: &EventKind) -> Option<Listener> {
        self.inner.slots.lock().get(kind).cloned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_test::{assert_err, assert_ok};

    use crate::event::listener;
    use crate::socket::{AcceptorOptions, CloseOptions};

    const URL: &str = "ws://localhost:8080";

    /// Records the kinds (and close codes) a peer receives.
    fn record(peer: &PeerHandle) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            EventKind::Open,
            EventKind::Message,
            EventKind::Error,
            EventKind::Close,
        ] {
            let log = Arc::clone(&log);
            peer.on(
                kind,
                listener(move |event| {
                    let entry = match event.as_close() {
                        Some(close) => format!("close:{}", close.code()),
                        None => event.kind().to_string(),
                    };
                    log.lock().push(entry);
                }),
            );
        }
        log
    }

    fn acceptor(registry: &Registry, options: AcceptorOptions) -> Acceptor {
        Acceptor::bind(registry, URL, options.with_mock_global(false)).unwrap()
    }

    #[tokio::test]
    async fn test_construction_errors_are_synchronous() {
        let registry = Registry::new();

        assert_eq!(
            PeerHandle::connect(&registry, "", ()).unwrap_err(),
            Error::MissingAddress
        );
        assert!(matches!(
            PeerHandle::connect(&registry, "http://localhost", ()),
            Err(Error::InvalidScheme { .. })
        ));
        assert!(matches!(
            PeerHandle::connect(&registry, "ws://localhost/#x", ()),
            Err(Error::FragmentPresent { .. })
        ));
    }

    #[tokio::test]
    async fn test_starts_connecting_with_normalized_url() {
        let registry = Registry::new();
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();

        assert_eq!(peer.ready_state(), ReadyState::Connecting);
        assert_eq!(peer.url(), "ws://localhost:8080/");
        assert_eq!(peer.protocol(), "");
        assert_eq!(peer.extensions(), "");
        assert_eq!(peer.buffered_amount(), 0);
    }

    #[tokio::test]
    async fn test_no_acceptor_yields_error_then_close() {
        let registry = Registry::new();
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        let log = record(&peer);

        assert!(log.lock().is_empty());
        registry.flush().await;

        assert_eq!(peer.ready_state(), ReadyState::Closed);
        assert_eq!(*log.lock(), vec!["error", "close:1000"]);
    }

    #[tokio::test]
    async fn test_open_and_connection_in_same_turn() {
        let registry = Registry::new();
        let acceptor = acceptor(&registry, AcceptorOptions::new());
        let connected = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&connected);
        acceptor.on_connection(move |peer| sink.lock().push(peer.clone()));

        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        let log = record(&peer);

        registry.flush().await;

        assert_eq!(peer.ready_state(), ReadyState::Open);
        assert_eq!(*log.lock(), vec!["open"]);
        assert_eq!(*connected.lock(), vec![peer]);
    }

    #[tokio::test]
    async fn test_verifier_rejection_detaches() {
        let registry = Registry::new();
        let acceptor = acceptor(&registry, AcceptorOptions::new().with_client_verifier(|| false));
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        let log = record(&peer);

        // Attached until the failure runs.
        assert_eq!(acceptor.clients().len(), 1);
        registry.flush().await;

        assert_eq!(*log.lock(), vec!["error", "close:1000"]);
        assert_eq!(peer.ready_state(), ReadyState::Closed);
        assert!(acceptor.clients().is_empty());
    }

    #[tokio::test]
    async fn test_protocol_negotiation() {
        let registry = Registry::new();
        let _acceptor = acceptor(
            &registry,
            AcceptorOptions::new().with_protocol_selector(|requested| requested[1].clone()),
        );

        let peer = PeerHandle::connect(&registry, URL, ["chat", "superchat"]).unwrap();
        assert_eq!(peer.protocol(), "superchat");

        registry.flush().await;
        assert_eq!(peer.ready_state(), ReadyState::Open);
    }

    #[tokio::test]
    async fn test_selector_may_decline_protocol() {
        let registry = Registry::new();
        let _acceptor = acceptor(
            &registry,
            AcceptorOptions::new().with_protocol_selector(|_| String::new()),
        );

        let peer = PeerHandle::connect(&registry, URL, "chat").unwrap();
        assert_eq!(peer.protocol(), "");

        registry.flush().await;
        assert_eq!(peer.ready_state(), ReadyState::Open);
    }

    #[tokio::test]
    async fn test_unrequested_protocol_fails() {
        let registry = Registry::new();
        let acceptor = acceptor(
            &registry,
            AcceptorOptions::new().with_protocol_selector(|_| "other".to_owned()),
        );
        let peer = PeerHandle::connect(&registry, URL, "chat").unwrap();
        let log = record(&peer);

        registry.flush().await;

        assert_eq!(*log.lock(), vec!["error", "close:1000"]);
        assert!(acceptor.clients().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_hook_fails_handshake() {
        let registry = Registry::new();
        let _acceptor = acceptor(
            &registry,
            AcceptorOptions::new().with_client_verifier(|| panic!("verifier exploded")),
        );

        let peer = assert_ok!(PeerHandle::connect(&registry, URL, ()));
        let log = record(&peer);

        registry.flush().await;
        assert_eq!(*log.lock(), vec!["error", "close:1000"]);
    }

    #[tokio::test]
    async fn test_panicking_selector_fails_handshake() {
        let registry = Registry::new();
        let acceptor = acceptor(
            &registry,
            AcceptorOptions::new().with_protocol_selector(|_| panic!("selector exploded")),
        );

        let peer = assert_ok!(PeerHandle::connect(&registry, URL, "chat"));
        let log = record(&peer);

        registry.flush().await;
        assert_eq!(*log.lock(), vec!["error", "close:1000"]);
        assert_eq!(peer.ready_state(), ReadyState::Closed);
        assert!(acceptor.clients().is_empty());
    }

    #[tokio::test]
    async fn test_send_while_connecting_fails_and_detaches() {
        let registry = Registry::new();
        let acceptor = acceptor(&registry, AcceptorOptions::new());
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();

        let err = assert_err!(peer.send("too early"));
        assert_eq!(err, Error::invalid_state(ReadyState::Connecting));
        assert!(acceptor.clients().is_empty());
    }

    #[tokio::test]
    async fn test_send_after_close_accumulates() {
        let registry = Registry::new();
        let _acceptor = acceptor(&registry, AcceptorOptions::new());
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        registry.flush().await;

        assert_ok!(peer.close(None, None));
        assert_ok!(peer.send("abc"));
        assert_ok!(peer.send(vec![0u8; 5]));
        assert_eq!(peer.buffered_amount(), 8);
    }

    #[tokio::test]
    async fn test_close_code_validation() {
        let registry = Registry::new();
        let _acceptor = acceptor(&registry, AcceptorOptions::new());
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        registry.flush().await;

        let err = assert_err!(peer.close(Some(2000), None));
        assert_eq!(err, Error::close_code_out_of_range(2000));
        assert_eq!(peer.ready_state(), ReadyState::Open);

        assert_ok!(peer.close(Some(4000), Some("bye")));
        assert_eq!(peer.ready_state(), ReadyState::Closing);
    }

    #[tokio::test]
    async fn test_close_delivers_code_and_reason() {
        let registry = Registry::new();
        let _acceptor = acceptor(&registry, AcceptorOptions::new());
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        registry.flush().await;

        let closes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&closes);
        peer.set_on_close(Some(listener(move |event| {
            let close = event.as_close().unwrap();
            sink.lock()
                .push((close.code(), close.reason().to_owned(), close.was_clean()));
        })));

        peer.close(Some(4001), Some("done")).unwrap();
        registry.flush().await;

        assert_eq!(*closes.lock(), vec![(4001, "done".to_owned(), false)]);
        assert_eq!(peer.ready_state(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_close_twice_is_noop() {
        let registry = Registry::new();
        let _acceptor = acceptor(&registry, AcceptorOptions::new());
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        registry.flush().await;
        let log = record(&peer);

        peer.close(None, None).unwrap();
        peer.close(None, None).unwrap();
        registry.settle().await;
        peer.close(None, None).unwrap();
        registry.settle().await;

        assert_eq!(*log.lock(), vec!["close:1000"]);
    }

    #[tokio::test]
    async fn test_close_while_connecting_skips_open() {
        let registry = Registry::new();
        let acceptor = acceptor(&registry, AcceptorOptions::new());
        let connections = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&connections);
        acceptor.on_connection(move |_| *sink.lock() += 1);
        let closes = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&closes);
        acceptor.on_close(move |_| *sink.lock() += 1);

        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        let log = record(&peer);
        peer.close(None, None).unwrap();

        registry.settle().await;

        assert_eq!(*log.lock(), vec!["close:1000"]);
        assert_eq!(*connections.lock(), 0);
        assert_eq!(*closes.lock(), 1);
        assert!(acceptor.clients().is_empty());
    }

    #[tokio::test]
    async fn test_force_state_does_not_cancel_failure() {
        let registry = Registry::new();
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        let log = record(&peer);

        peer.force_state(ReadyState::Closed);
        assert_eq!(peer.ready_state(), ReadyState::Closed);
        assert!(log.lock().is_empty());

        registry.flush().await;
        assert_eq!(*log.lock(), vec!["error", "close:1000"]);
        assert_eq!(peer.ready_state(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_acceptor_close_does_not_cancel_rejection() {
        let registry = Registry::new();
        let acceptor = acceptor(
            &registry,
            AcceptorOptions::new().with_client_verifier(|| false),
        );

        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        let log = record(&peer);
        acceptor.close(CloseOptions::new());
        assert_eq!(*log.lock(), vec!["close:1000"]);

        registry.flush().await;
        assert_eq!(*log.lock(), vec!["close:1000", "error", "close:1000"]);
        assert_eq!(peer.ready_state(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_buffered_amount_counts_utf8_bytes() {
        let registry = Registry::new();
        let _acceptor = acceptor(&registry, AcceptorOptions::new());
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        registry.flush().await;

        peer.close(None, None).unwrap();
        assert_ok!(peer.send("héllo"));
        assert_eq!(peer.buffered_amount(), 6);
    }

    #[tokio::test]
    async fn test_slot_replaces_previous_handler() {
        let registry = Registry::new();
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&hits);
        let first = listener(move |_| sink.lock().push("first"));
        let sink = Arc::clone(&hits);
        let second = listener(move |_| sink.lock().push("second"));

        peer.set_on_error(Some(Arc::clone(&first)));
        peer.set_on_error(Some(Arc::clone(&second)));
        assert!(Arc::ptr_eq(&peer.on_error().unwrap(), &second));

        registry.flush().await;
        assert_eq!(*hits.lock(), vec!["second"]);
    }

    #[tokio::test]
    async fn test_slot_and_on_coexist() {
        let registry = Registry::new();
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&hits);
        peer.on("error", listener(move |_| sink.lock().push("on")));
        let sink = Arc::clone(&hits);
        peer.set_on_error(Some(listener(move |_| sink.lock().push("slot"))));
        peer.set_on_error(None);
        assert!(peer.on_error().is_none());

        registry.flush().await;
        assert_eq!(*hits.lock(), vec!["on"]);
    }

    #[tokio::test]
    async fn test_off_and_duplicate_on() {
        let registry = Registry::new();
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        let hits = Arc::new(Mutex::new(0usize));

        let sink = Arc::clone(&hits);
        let counter = listener(move |_| *sink.lock() += 1);

        assert!(peer.on(EventKind::Close, Arc::clone(&counter)));
        assert!(!peer.on(EventKind::Close, Arc::clone(&counter)));
        assert!(peer.on(EventKind::Error, Arc::clone(&counter)));
        assert!(peer.off(EventKind::Error, &counter));

        registry.flush().await;
        assert_eq!(*hits.lock(), 1);
    }

    #[tokio::test]
    async fn test_panicking_listener_does_not_block_others() {
        let registry = Registry::new();
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        let hits = Arc::new(Mutex::new(0usize));

        peer.on(EventKind::Error, listener(|_| panic!("listener exploded")));
        let sink = Arc::clone(&hits);
        peer.on(EventKind::Error, listener(move |_| *sink.lock() += 1));

        registry.flush().await;
        assert_eq!(*hits.lock(), 1);
        assert_eq!(peer.ready_state(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_binary_type() {
        let registry = Registry::new();
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        assert_eq!(peer.binary_type(), BinaryType::Blob);
        peer.set_binary_type(BinaryType::ArrayBuffer);
        assert_eq!(peer.binary_type(), BinaryType::ArrayBuffer);
    }
}
