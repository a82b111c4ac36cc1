//! Server-side simulated endpoint.
//!
//! An [`Acceptor`] binds to an address on a [`Registry`], admits or rejects
//! peers through its [`AcceptorOptions`] hooks, and fans lifecycle and data
//! notifications out to its handlers.
//!
//! # Notifications
//!
//! | Kind | Payload | Raised by |
//! |------|---------|-----------|
//! | `Connection` | the new peer | successful handshake |
//! | `Message` | peer and data | [`PeerHandle::send`] |
//! | `Close` | the peer, or none | [`PeerHandle::close`], [`Acceptor::close`] |
//! | `Error` | an [`Error`] | duplicate bind, [`Acceptor::dispatch_error`] |
//!
//! # Example
//!
//! ```ignore
//! let registry = Registry::new();
//! let acceptor = Acceptor::bind(&registry, "ws://localhost:8080", AcceptorOptions::new())?;
//!
//! acceptor.on_message(|peer, data| {
//!     debug!(peer = %peer.id(), len = data.len(), "Got data");
//! });
//!
//! acceptor.send("hello everyone", EmitOptions::new());
//! acceptor.close(CloseOptions::new().with_code(4000));
//! acceptor.stop();
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::address::Address;
use crate::close_code;
use crate::error::{Error, Result};
use crate::event::{
    EventKind, EventTarget, Payload, create_close_event, create_event, create_message_event,
};
use crate::identifiers::AcceptorId;
use crate::transport::global::{self, Connector};
use crate::transport::scheduler::run_guarded;
use crate::transport::Registry;

use super::options::{AcceptorOptions, CloseOptions, EmitOptions};
use super::peer::PeerHandle;
use super::state::ReadyState;

// ============================================================================
// AcceptorEventKind
// ============================================================================

/// Kind of an acceptor notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcceptorEventKind {
    /// A peer completed the handshake.
    Connection,
    /// A peer sent data.
    Message,
    /// A peer closed, or the acceptor closed itself.
    Close,
    /// An error was reported.
    Error,
}

impl AcceptorEventKind {
    /// Returns the name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Message => "message",
            Self::Close => "close",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for AcceptorEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// AcceptorEvent
// ============================================================================

/// A notification delivered to acceptor handlers.
#[derive(Debug, Clone)]
pub enum AcceptorEvent {
    /// A peer completed the handshake.
    Connection(PeerHandle),
    /// A peer sent data.
    Message {
        /// The sender.
        peer: PeerHandle,
        /// What it sent.
        data: Payload,
    },
    /// A peer closed (`Some`) or the acceptor closed itself (`None`).
    Close(Option<PeerHandle>),
    /// An error was reported.
    Error(Error),
}

impl AcceptorEvent {
    /// Returns the kind of this notification.
    #[must_use]
    pub fn kind(&self) -> AcceptorEventKind {
        match self {
            Self::Connection(_) => AcceptorEventKind::Connection,
            Self::Message { .. } => AcceptorEventKind::Message,
            Self::Close(_) => AcceptorEventKind::Close,
            Self::Error(_) => AcceptorEventKind::Error,
        }
    }
}

/// Acceptor handler. Compared by `Arc` identity.
pub type AcceptorHandler = Arc<dyn Fn(&AcceptorEvent) + Send + Sync>;

// ============================================================================
// Simulation
// ============================================================================

/// Network conditions an acceptor can simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simulation {
    /// Abrupt failure: every peer is closed and receives `error`, without a
    /// close handshake.
    Error,
}

// ============================================================================
// Types
// ============================================================================

/// Global connector bookkeeping.
#[derive(Debug, Default)]
struct GlobalInstall {
    installed: bool,
    previous: Option<Connector>,
}

/// Shared inner state of an acceptor.
struct AcceptorInner {
    id: AcceptorId,
    address: Address,
    registry: Registry,
    options: AcceptorOptions,
    handlers: EventTarget<AcceptorEventKind, dyn Fn(&AcceptorEvent) + Send + Sync>,
    global: Mutex<GlobalInstall>,
}

// ============================================================================
// Acceptor
// ============================================================================

/// A simulated listening endpoint.
///
/// Cloning yields another handle to the same acceptor.
#[derive(Clone)]
pub struct Acceptor {
    inner: Arc<AcceptorInner>,
}

impl fmt::Debug for Acceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acceptor")
            .field("id", &self.inner.id)
            .field("url", &self.inner.address.as_str())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Acceptor - Constructor
// ============================================================================

impl Acceptor {
    /// Binds a new acceptor to `address`.
    ///
    /// An address that is already bound is not an `Err`: the existing
    /// acceptor keeps the address and this one receives
    /// [`Error::AlreadyListening`] on its `error` channel one turn later.
    ///
    /// With `mock_global` enabled the registry is installed as the default
    /// connector until [`stop`](Self::stop).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAddress`] or [`Error::InvalidAddress`] if
    /// `address` cannot be parsed.
    pub fn bind(registry: &Registry, address: &str, options: AcceptorOptions) -> Result<Self> {
        let address = Address::for_acceptor(address)?;

        let acceptor = Self {
            inner: Arc::new(AcceptorInner {
                id: AcceptorId::next(),
                address,
                registry: registry.clone(),
                options,
                handlers: EventTarget::new(),
                global: Mutex::new(GlobalInstall::default()),
            }),
        };

        if registry.bind(&acceptor, &acceptor.inner.address).is_some() {
            debug!(acceptor = %acceptor.id(), url = %acceptor.url(), "Acceptor listening");
        } else {
            let error = Error::already_listening(acceptor.url());
            warn!(acceptor = %acceptor.id(), error = %error, "Bind failed");

            let this = acceptor.clone();
            registry
                .scheduler()
                .schedule(move || this.dispatch_error(error));
        }

        if acceptor.inner.options.mock_global {
            acceptor.start();
        }

        Ok(acceptor)
    }

    /// Installs the default connector, remembering the previous one.
    fn start(&self) {
        let mut global = self.inner.global.lock();
        if global.installed {
            return;
        }

        global.previous = global::install(Connector::new(self.inner.registry.clone()));
        global.installed = true;
    }
}

// ============================================================================
// Acceptor - Accessors
// ============================================================================

impl Acceptor {
    /// Returns the acceptor id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> AcceptorId {
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

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &AcceptorOptions {
        &self.inner.options
    }

    /// Returns the registry this acceptor was created on.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Returns `true` while this acceptor owns its registry entry.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner
            .registry
            .lookup_acceptor(&self.inner.address)
            .is_some_and(|bound| bound.id() == self.id())
    }

    /// Returns a snapshot of the attached peers, in attachment order.
    ///
    /// Empty if this acceptor does not own the address.
    #[must_use]
    pub fn clients(&self) -> Vec<PeerHandle> {
        if self.is_listening() {
            self.inner.registry.lookup_peers(&self.inner.address)
        } else {
            Vec::new()
        }
    }
}

// ============================================================================
// Acceptor - Handlers
// ============================================================================

impl Acceptor {
    /// Registers `handler` for `kind`.
    ///
    /// Returns `false` if that exact handler was already registered.
    pub fn on(&self, kind: AcceptorEventKind, handler: AcceptorHandler) -> bool {
        self.inner.handlers.add(kind, handler)
    }

    /// Removes `handler` from `kind`.
    pub fn off(&self, kind: AcceptorEventKind, handler: &AcceptorHandler) -> bool {
        self.inner.handlers.remove(&kind, handler)
    }

    /// Registers a `connection` handler. Returns it for later [`off`](Self::off).
    pub fn on_connection<F>(&self, f: F) -> AcceptorHandler
    where
        F: Fn(&PeerHandle) + Send + Sync + 'static,
    {
        self.register(AcceptorEventKind::Connection, move |event| {
            if let AcceptorEvent::Connection(peer) = event {
                f(peer);
            }
        })
    }

    /// Registers a `message` handler. Returns it for later [`off`](Self::off).
    pub fn on_message<F>(&self, f: F) -> AcceptorHandler
    where
        F: Fn(&PeerHandle, &Payload) + Send + Sync + 'static,
    {
        self.register(AcceptorEventKind::Message, move |event| {
            if let AcceptorEvent::Message { peer, data } = event {
                f(peer, data);
            }
        })
    }

    /// Registers a `close` handler. Returns it for later [`off`](Self::off).
    pub fn on_close<F>(&self, f: F) -> AcceptorHandler
    where
        F: Fn(Option<&PeerHandle>) + Send + Sync + 'static,
    {
        self.register(AcceptorEventKind::Close, move |event| {
            if let AcceptorEvent::Close(peer) = event {
                f(peer.as_ref());
            }
        })
    }

    /// Registers an `error` handler. Returns it for later [`off`](Self::off).
    pub fn on_error<F>(&self, f: F) -> AcceptorHandler
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.register(AcceptorEventKind::Error, move |event| {
            if let AcceptorEvent::Error(error) = event {
                f(error);
            }
        })
    }

    fn register<F>(&self, kind: AcceptorEventKind, f: F) -> AcceptorHandler
    where
        F: Fn(&AcceptorEvent) + Send + Sync + 'static,
    {
        let handler: AcceptorHandler = Arc::new(f);
        self.inner.handlers.add(kind, Arc::clone(&handler));
        handler
    }
}

// ============================================================================
// Acceptor - Dispatch
// ============================================================================

impl Acceptor {
    /// Synchronously invokes the handlers for `kind`, in registration order.
    ///
    /// `Connection` requires `peer`; `Message` requires both `peer` and
    /// `data`; `Close` takes an optional `peer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if a required argument is missing, or if
    /// `kind` is `Error` (use [`dispatch_error`](Self::dispatch_error)).
    pub fn dispatch(
        &self,
        kind: AcceptorEventKind,
        peer: Option<&PeerHandle>,
        data: Option<&Payload>,
    ) -> Result<()> {
        let require_peer = || {
            peer.cloned()
                .ok_or_else(|| Error::internal(format!("{kind} dispatched without a peer")))
        };

        let event = match kind {
            AcceptorEventKind::Connection => AcceptorEvent::Connection(require_peer()?),
            AcceptorEventKind::Message => {
                let peer = require_peer()?;
                let data = data
                    .cloned()
                    .ok_or_else(|| Error::internal("message dispatched without data"))?;
                AcceptorEvent::Message { peer, data }
            }
            AcceptorEventKind::Close => AcceptorEvent::Close(peer.cloned()),
            AcceptorEventKind::Error => {
                return Err(Error::internal("error dispatched without an error value"));
            }
        };

        self.deliver(&event);
        Ok(())
    }

    /// Delivers `error` to the `error` handlers.
    pub fn dispatch_error(&self, error: Error) {
        self.deliver(&AcceptorEvent::Error(error));
    }

    fn deliver(&self, event: &AcceptorEvent) {
        let handlers = self.inner.handlers.listeners(&event.kind());
        trace!(
            acceptor = %self.id(),
            kind = %event.kind(),
            handlers = handlers.len(),
            "Acceptor dispatch"
        );

        for handler in &handlers {
            run_guarded("acceptor handler", || handler(event));
        }
    }
}

// ============================================================================
// Acceptor - Operations
// ============================================================================

impl Acceptor {
    /// Sends `data` as a `message` to every attached peer, or to
    /// `options.peers`. Delivered one turn later.
    pub fn send(&self, data: impl Into<Payload>, options: EmitOptions) {
        self.emit(EventKind::Message, data, options);
    }

    /// Sends `data` as a message-shaped event of any kind.
    ///
    /// Recipients are resolved now; delivery happens one turn later with
    /// `origin` set to this acceptor's address.
    pub fn emit(&self, kind: impl Into<EventKind>, data: impl Into<Payload>, options: EmitOptions) {
        let kind = kind.into();
        let data = data.into();
        let recipients = options.peers.unwrap_or_else(|| self.clients());
        let origin = self.url().to_owned();

        trace!(
            acceptor = %self.id(),
            kind = %kind,
            recipients = recipients.len(),
            "Emit scheduled"
        );

        self.inner.registry.scheduler().schedule(move || {
            for peer in &recipients {
                let event = create_message_event(kind.clone(), Some(peer), data.clone(), &*origin);
                peer.dispatch_event(&event);
            }
        });
    }

    /// Closes every attached peer and unbinds.
    ///
    /// The entry is removed before any peer is notified, so a peer handler
    /// that reconnects finds nothing listening. Each peer is forced to
    /// `CLOSED` and receives `close`; then the acceptor's own `close`
    /// handlers run with no peer. A no-op once unbound.
    pub fn close(&self, options: CloseOptions) {
        let peers = self.clients();
        if !self
            .inner
            .registry
            .unbind_owned(&self.inner.address, self.id())
        {
            trace!(acceptor = %self.id(), "Close skipped, not listening");
            return;
        }

        let code = options.code.unwrap_or(close_code::NORMAL);
        let reason = options.reason.unwrap_or_default();

        debug!(
            acceptor = %self.id(),
            code,
            peers = peers.len(),
            "Acceptor closing"
        );

        for peer in &peers {
            peer.force_state(ReadyState::Closed);
            peer.dispatch_event(&create_close_event(
                Some(peer),
                code,
                reason.as_str(),
                options.was_clean,
            ));
        }

        self.deliver(&AcceptorEvent::Close(None));
    }

    /// Simulates a network condition on every attached peer.
    ///
    /// For [`Simulation::Error`], each peer is detached, forced to `CLOSED`
    /// and receives `error`.
    pub fn simulate(&self, simulation: Simulation) {
        let peers = self.clients();
        debug!(acceptor = %self.id(), ?simulation, peers = peers.len(), "Simulating");

        match simulation {
            Simulation::Error => {
                for peer in &peers {
                    self.inner.registry.detach(peer, &self.inner.address);
                    peer.force_state(ReadyState::Closed);
                    peer.dispatch_event(&create_event(EventKind::Error, Some(peer)));
                }
            }
        }
    }

    /// Unbinds and restores the previous default connector.
    ///
    /// Attached peers are not notified; use [`close`](Self::close) for that.
    pub fn stop(&self) {
        {
            let mut global = self.inner.global.lock();
            if global.installed {
                global.installed = false;
                global::restore(global.previous.take());
            }
        }

        if self
            .inner
            .registry
            .unbind_owned(&self.inner.address, self.id())
        {
            debug!(acceptor = %self.id(), url = %self.url(), "Acceptor stopped");
        }
    }

    /// Like [`stop`](Self::stop), then runs `callback`.
    pub fn stop_with<F: FnOnce()>(&self, callback: F) {
        self.stop();
        callback();
    }
}

// ============================================================================
// Tests
// ============================================================================
