#![forbid(unsafe_code)]

//! How many leading children fit in a container's current width.
//!
//! Child right edges are measured once, at attach, relative to the
//! container's left edge, so later hiding or moving children does not change
//! the answer. Every container resize re-evaluates against the cached edges.

use domfit_core::TriggerSink;

use crate::document::{Document, DomError, NodeId, ObserverId};

/// Emitted when the fitting item count is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitEvent {
    /// Number of leading children that fit.
    pub item_count: usize,
}

/// Cached child edges of one container, re-evaluated on resize.
#[derive(Debug)]
pub struct ComputeFit {
    node: NodeId,
    /// `edges[0] == 0`; `edges[i]` is the right edge of child `i - 1`.
    edges: Vec<i32>,
    sink: TriggerSink,
    observer: Option<ObserverId>,
}

impl ComputeFit {
    /// Measure the children of `node` and start observing its size.
    ///
    /// The resize observer fires once on the next flush, so the first
    /// [`poll`](Self::poll) after it yields an event.
    pub fn attach(doc: &mut Document, node: NodeId) -> Result<Self, DomError> {
        let mut edges = vec![0];
        edges.extend(doc.child_right_edges(node));
        let sink = TriggerSink::new();
        let observer = doc.observe_resize(node, sink.clone())?;
        Ok(Self {
            node,
            edges,
            sink,
            observer: Some(observer),
        })
    }

    /// Cached edges.
    #[must_use]
    pub fn edges(&self) -> &[i32] {
        &self.edges
    }

    /// Largest `i` with `edges[i] < width`, or `None` for a non-positive width.
    #[must_use]
    pub fn compute(&self, width: i32) -> Option<usize> {
        self.edges.iter().rposition(|edge| *edge < width)
    }

    /// Evaluate against the container's current width.
    #[must_use]
    pub fn evaluate(&self, doc: &Document) -> Option<FitEvent> {
        self.compute(doc.box_size(self.node).width)
            .map(|item_count| FitEvent { item_count })
    }

    /// Evaluate if a resize was observed since the last poll.
    pub fn poll(&mut self, doc: &Document) -> Option<FitEvent> {
        self.sink.take()?;
        let event = self.evaluate(doc);
        if let Some(event) = event {
            tracing::trace!(node = %self.node, item_count = event.item_count, "compute fit");
        }
        event
    }

    /// Stop observing.
    pub fn destroy(&mut self, doc: &mut Document) {
        if let Some(id) = self.observer.take() {
            doc.disconnect(id);
        }
        self.sink.close();
    }
}
