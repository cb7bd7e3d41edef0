#![forbid(unsafe_code)]

//! Keep an element's bottom edge inside the viewport by capping its
//! `max-height`.

use domfit_core::TriggerSink;

use crate::document::{Document, DomError, NodeId, ObserverId};

/// Style property written by [`RestrictToViewport`].
pub const MAX_HEIGHT: &str = "max-height";

/// `viewport_height - top + offset`.
#[must_use]
pub fn viewport_max_height(doc: &Document, node: NodeId, offset: i32) -> i32 {
    doc.viewport().height - doc.top(node) + offset
}

/// Caps `max-height` on attach, on every viewport resize, and on update.
#[derive(Debug)]
pub struct RestrictToViewport {
    node: NodeId,
    offset: i32,
    sink: TriggerSink,
    observer: Option<ObserverId>,
}

impl RestrictToViewport {
    /// Apply the cap now and start watching the viewport.
    pub fn attach(doc: &mut Document, node: NodeId, offset: i32) -> Result<Self, DomError> {
        let sink = TriggerSink::new();
        let this = Self {
            node,
            offset,
            sink: sink.clone(),
            observer: None,
        };
        this.apply(doc)?;
        Ok(Self {
            observer: Some(doc.observe_viewport(sink)),
            ..this
        })
    }

    fn apply(&self, doc: &mut Document) -> Result<i32, DomError> {
        let height = viewport_max_height(doc, self.node, self.offset);
        doc.set_style(self.node, MAX_HEIGHT, &format!("{height}px"))?;
        Ok(height)
    }

    /// Re-apply after a viewport resize was observed. Returns the new cap, or
    /// `None` when the viewport did not change since the last poll.
    pub fn poll(&mut self, doc: &mut Document) -> Result<Option<i32>, DomError> {
        if self.sink.take().is_none() {
            return Ok(None);
        }
        self.apply(doc).map(Some)
    }

    /// Change the offset and re-apply.
    pub fn update(&mut self, doc: &mut Document, offset: i32) -> Result<i32, DomError> {
        self.offset = offset;
        self.apply(doc)
    }

    /// Stop watching the viewport. The last cap stays in place.
    pub fn destroy(&mut self, doc: &mut Document) {
        if let Some(id) = self.observer.take() {
            doc.disconnect(id);
        }
        self.sink.close();
    }
}
