#![forbid(unsafe_code)]

//! `size_to_fit` binding: a [`FitController`] attached to a document element.
//!
//! The container is a weak handle on the document plus a [`NodeId`], so a
//! dropped document ends any in-flight pass as
//! [`PassOutcome::Detached`](domfit_runtime::PassOutcome::Detached).
//! Size changes arrive through a document resize observer, content changes
//! through a mutation observer; both are registered on attach and removed on
//! [`SizeToFit::destroy`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use domfit_core::{MutationFilter, ScrollMetrics, TriggerDisposition, TriggerSink, TriggerSource};
use domfit_runtime::{Container, FitCallbacks, FitConfig, FitController, Notifier, PassReport};

use crate::document::{Document, DomError, NodeId, ObserverId};

/// Shared, host-owned document handle.
pub type SharedDocument = Rc<RefCell<Document>>;

/// One element of a shared document, read as a fit container.
#[derive(Debug, Clone)]
pub struct DomContainer {
    doc: Weak<RefCell<Document>>,
    node: NodeId,
}

impl DomContainer {
    /// Container for `node` in `doc`.
    #[must_use]
    pub fn new(doc: &SharedDocument, node: NodeId) -> Self {
        Self {
            doc: Rc::downgrade(doc),
            node,
        }
    }

    /// The observed element.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Run `f` against the document with a mutable borrow, if it is alive.
    fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> Option<R> {
        let doc = self.doc.upgrade()?;
        let Ok(mut doc) = doc.try_borrow_mut() else {
            tracing::warn!(node = %self.node, "document already borrowed; observer not changed");
            return None;
        };
        Some(f(&mut doc))
    }
}

impl Container for DomContainer {
    fn metrics(&self) -> Option<ScrollMetrics> {
        let doc = self.doc.upgrade()?;
        let Ok(doc) = doc.try_borrow() else {
            tracing::warn!(node = %self.node, "document mutably borrowed during measurement");
            return None;
        };
        doc.scroll_metrics(self.node)
    }
}

/// Requests a pass whenever the container's box size changes.
#[derive(Debug, Default)]
pub struct DomResizeNotifier {
    registration: Option<(DomContainer, ObserverId)>,
}

impl Notifier<DomContainer> for DomResizeNotifier {
    fn source(&self) -> TriggerSource {
        TriggerSource::SizeChange
    }

    fn observe(&mut self, target: &DomContainer, sink: TriggerSink) {
        self.disconnect();
        let registered = target.with_document(|doc| doc.observe_resize(target.node, sink));
        if let Some(Ok(id)) = registered {
            self.registration = Some((target.clone(), id));
        }
    }

    fn disconnect(&mut self) {
        if let Some((target, id)) = self.registration.take() {
            target.with_document(|doc| doc.disconnect(id));
        }
    }
}

/// Requests a pass whenever the container's content mutates.
#[derive(Debug)]
pub struct DomMutationNotifier {
    filter: MutationFilter,
    registration: Option<(DomContainer, ObserverId)>,
}

impl DomMutationNotifier {
    /// Notifier with the given mutation filter.
    #[must_use]
    pub const fn new(filter: MutationFilter) -> Self {
        Self {
            filter,
            registration: None,
        }
    }
}

impl Notifier<DomContainer> for DomMutationNotifier {
    fn source(&self) -> TriggerSource {
        TriggerSource::ContentChange
    }

    fn observe(&mut self, target: &DomContainer, sink: TriggerSink) {
        self.disconnect();
        let filter = self.filter;
        let registered =
            target.with_document(|doc| doc.observe_mutations(target.node, filter, sink));
        if let Some(Ok(id)) = registered {
            self.registration = Some((target.clone(), id));
        }
    }

    fn disconnect(&mut self) {
        if let Some((target, id)) = self.registration.take() {
            target.with_document(|doc| doc.disconnect(id));
        }
    }
}

/// A fit controller bound to one element of a shared document.
///
/// The document must not be borrowed by the caller while calling
/// [`attach`](Self::attach), [`destroy`](Self::destroy), or any method that
/// runs callbacks ([`pump`](Self::pump), [`on_tick`](Self::on_tick),
/// [`update`](Self::update)).
#[derive(Debug)]
pub struct SizeToFit {
    controller: FitController<DomContainer>,
}

impl SizeToFit {
    /// Bind to `node`. Observation follows `config`: a resize observer when
    /// `observe_size` is set, and a mutation observer unless every mutation
    /// kind is disabled.
    pub fn attach<G, S>(
        doc: &SharedDocument,
        node: NodeId,
        grow: G,
        shrink: S,
        config: FitConfig,
    ) -> Result<Self, DomError>
    where
        G: FnMut() -> bool + 'static,
        S: FnMut() -> bool + 'static,
    {
        if !doc.borrow().exists(node) {
            return Err(DomError::UnknownNode(node));
        }
        if !doc.borrow().is_element(node) {
            return Err(DomError::NotAnElement(node));
        }

        let mut notifiers: Vec<Box<dyn Notifier<DomContainer>>> = Vec::new();
        if config.observe_size {
            notifiers.push(Box::new(DomResizeNotifier::default()));
        }
        let filter = config.mutations.filter();
        if !filter.is_empty() {
            notifiers.push(Box::new(DomMutationNotifier::new(filter)));
        }

        let container = DomContainer::new(doc, node);
        let controller =
            FitController::attach(container, FitCallbacks::new(grow, shrink), config, notifiers);
        tracing::debug!(node = %node, "size_to_fit attached");
        Ok(Self { controller })
    }

    /// Swap the callback pair and request a pass.
    pub fn update<G, S>(&mut self, grow: G, shrink: S) -> TriggerDisposition
    where
        G: FnMut() -> bool + 'static,
        S: FnMut() -> bool + 'static,
    {
        self.controller.update(FitCallbacks::new(grow, shrink))
    }

    /// Disconnect the observers. Idempotent.
    pub fn destroy(&mut self) {
        self.controller.detach();
    }

    /// The observed element.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.controller.container().node()
    }

    /// Drain pending observer notifications into a pass request.
    pub fn pump(&mut self) -> Option<TriggerDisposition> {
        self.controller.pump()
    }

    /// Resume the in-flight pass by one step.
    pub fn on_tick(&mut self) -> Option<PassReport> {
        self.controller.on_tick()
    }

    /// Whether a pass is suspended awaiting a tick.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// The underlying controller.
    #[must_use]
    pub fn controller(&self) -> &FitController<DomContainer> {
        &self.controller
    }

    /// Mutable access to the underlying controller.
    pub fn controller_mut(&mut self) -> &mut FitController<DomContainer> {
        &mut self.controller
    }
}
