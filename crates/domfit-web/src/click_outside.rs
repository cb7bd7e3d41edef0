#![forbid(unsafe_code)]

//! Click-outside detection.
//!
//! The host forwards every window `mousedown` to [`ClickOutside::on_mousedown`];
//! a press whose target lies outside the watched element yields a
//! [`ClickOutsideEvent`].

use crate::document::{Document, NodeId};

/// A mousedown landed outside the watched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOutsideEvent {
    /// The watched element.
    pub node: NodeId,
    /// Where the press landed.
    pub target: NodeId,
}

/// Click-outside listener bound to one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutside {
    node: NodeId,
    listening: bool,
}

impl ClickOutside {
    /// Watch `node`. Listens only when `enabled`.
    #[must_use]
    pub const fn attach(node: NodeId, enabled: bool) -> Self {
        Self {
            node,
            listening: enabled,
        }
    }

    /// Start or stop listening.
    pub fn update(&mut self, enabled: bool) {
        self.listening = enabled;
    }

    /// Stop listening for good.
    pub fn destroy(&mut self) {
        self.listening = false;
    }

    /// Whether presses are currently inspected.
    #[must_use]
    pub const fn is_listening(&self) -> bool {
        self.listening
    }

    /// Inspect a mousedown. `target` is `None` when the press had no target
    /// node.
    #[must_use]
    pub fn on_mousedown(&self, doc: &Document, target: Option<NodeId>) -> Option<ClickOutsideEvent> {
        if !self.listening {
            return None;
        }
        let target = target?;
        if doc.contains(self.node, target) {
            return None;
        }
        tracing::trace!(node = %self.node, target = %target, "click outside");
        Some(ClickOutsideEvent {
            node: self.node,
            target,
        })
    }
}
