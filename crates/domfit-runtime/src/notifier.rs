#![forbid(unsafe_code)]

//! Notifier capabilities that request fit passes.
//!
//! A notifier watches something about the container (its box size, its
//! content) and writes a [`TriggerSource`] into the controller's
//! [`TriggerSink`] whenever that something changes. The controller owns its
//! notifiers through a [`NotifierSet`], which connects them on attach and
//! disconnects them on teardown or drop.
//!
//! # How it works
//!
//! 1. `FitController::attach` calls [`NotifierSet::observe_all`] with the
//!    container and a clone of its mailbox.
//! 2. Notifiers deliver triggers into the mailbox at any time.
//! 3. The host calls `FitController::pump`, which drains the mailbox.
//! 4. `FitController::detach` calls [`NotifierSet::disconnect_all`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use domfit_core::{TriggerSink, TriggerSource};

/// A subscription capability that requests passes on change.
///
/// `C` is the container handle type the notifier is attached to.
pub trait Notifier<C: ?Sized> {
    /// Which trigger this notifier produces.
    fn source(&self) -> TriggerSource;

    /// Start observing `target`, delivering into `sink`.
    ///
    /// Calling `observe` on an already-observing notifier replaces its sink.
    fn observe(&mut self, target: &C, sink: TriggerSink);

    /// Stop observing. No trigger may be delivered after this returns.
    fn disconnect(&mut self);
}

/// Manages the lifecycle of a controller's notifiers.
pub struct NotifierSet<C: ?Sized> {
    notifiers: Vec<Box<dyn Notifier<C>>>,
    connected: bool,
}

impl<C: ?Sized> NotifierSet<C> {
    /// Create a set from boxed notifiers. Nothing is observed yet.
    pub fn new(notifiers: Vec<Box<dyn Notifier<C>>>) -> Self {
        Self {
            notifiers,
            connected: false,
        }
    }

    /// Connect every notifier to `target`.
    pub fn observe_all(&mut self, target: &C, sink: &TriggerSink) {
        for notifier in &mut self.notifiers {
            tracing::debug!(source = notifier.source().as_str(), "notifier observe");
            notifier.observe(target, sink.clone());
        }
        self.connected = true;
    }

    /// Disconnect every notifier. Idempotent.
    pub fn disconnect_all(&mut self) {
        if !self.connected {
            return;
        }
        for notifier in &mut self.notifiers {
            tracing::debug!(source = notifier.source().as_str(), "notifier disconnect");
            notifier.disconnect();
        }
        self.connected = false;
    }

    /// Whether the set is currently observing.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of notifiers in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Whether the set has no notifiers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Sources produced by the notifiers, in registration order.
    pub fn sources(&self) -> Vec<TriggerSource> {
        self.notifiers.iter().map(|n| n.source()).collect()
    }
}

impl<C: ?Sized> Drop for NotifierSet<C> {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

impl<C: ?Sized> fmt::Debug for NotifierSet<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierSet")
            .field("sources", &self.sources())
            .field("connected", &self.connected)
            .finish()
    }
}

/// A notifier fired explicitly by the host.
///
/// Clones share the same connection: keep one clone on the host side and hand
/// another to the controller. [`fire`](Self::fire) delivers only while the
/// controller side is connected.
#[derive(Debug, Clone)]
pub struct HostNotifier {
    source: TriggerSource,
    sink: Rc<RefCell<Option<TriggerSink>>>,
}

impl HostNotifier {
    /// Create a notifier producing `source`.
    #[must_use]
    pub fn new(source: TriggerSource) -> Self {
        Self {
            source,
            sink: Rc::new(RefCell::new(None)),
        }
    }

    /// A size-change notifier.
    #[must_use]
    pub fn size_change() -> Self {
        Self::new(TriggerSource::SizeChange)
    }

    /// A content-change notifier.
    #[must_use]
    pub fn content_change() -> Self {
        Self::new(TriggerSource::ContentChange)
    }

    /// Deliver a trigger. Returns `false` when disconnected.
    pub fn fire(&self) -> bool {
        match self.sink.borrow().as_ref() {
            Some(sink) => sink.notify(self.source),
            None => false,
        }
    }

    /// Whether a controller is currently observing through this notifier.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.sink.borrow().is_some()
    }
}

impl<C: ?Sized> Notifier<C> for HostNotifier {
    fn source(&self) -> TriggerSource {
        self.source
    }

    fn observe(&mut self, _target: &C, sink: TriggerSink) {
        *self.sink.borrow_mut() = Some(sink);
    }

    fn disconnect(&mut self) {
        self.sink.borrow_mut().take();
    }
}
