#![forbid(unsafe_code)]

//! Portal: render an element under another container (the body by default).

use crate::document::{Document, DomError, NodeId};

/// An element moved under a portal container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Portal {
    target: NodeId,
}

impl Portal {
    /// Move `target` under `container`, or under the body when `None`.
    pub fn mount(doc: &mut Document, target: NodeId, container: Option<NodeId>) -> Result<Self, DomError> {
        let root = container.unwrap_or_else(|| doc.body());
        doc.append_child(root, target)?;
        Ok(Self { target })
    }

    /// Re-parent under a new container (or the body).
    pub fn update(&self, doc: &mut Document, container: Option<NodeId>) -> Result<(), DomError> {
        let root = container.unwrap_or_else(|| doc.body());
        doc.append_child(root, self.target)
    }

    /// Detach the element from wherever it is mounted.
    pub fn destroy(&self, doc: &mut Document) -> Result<(), DomError> {
        doc.detach(self.target).map(|_| ())
    }

    /// The portalled element.
    #[must_use]
    pub const fn target(&self) -> NodeId {
        self.target
    }
}
