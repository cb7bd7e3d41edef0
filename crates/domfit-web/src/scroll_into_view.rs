#![forbid(unsafe_code)]

//! Scroll a freshly mounted element into view on the next tick.
//!
//! The request is queued on the [`Document`] rather than applied at mount
//! time, so layout produced by the same frame is settled first.
//! [`FitHost::step`](crate::FitHost::step) drains the queue.

use std::fmt;

use crate::document::{Document, DomError, NodeId};

/// Vertical alignment of a scrolled element inside its scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollBlock {
    Start,
    #[default]
    Center,
    End,
    Nearest,
}

impl ScrollBlock {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Center => "center",
            Self::End => "end",
            Self::Nearest => "nearest",
        }
    }
}

impl fmt::Display for ScrollBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queued scroll of `node` into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub node: NodeId,
    pub block: ScrollBlock,
}

/// Queue a centered scroll of `node` when `scroll` is set.
///
/// Returns whether a request was queued. Nothing is queued, and no error is
/// raised, when `scroll` is false.
pub fn scroll_into_view_on_mount(
    doc: &mut Document,
    node: NodeId,
    scroll: bool,
) -> Result<bool, DomError> {
    if !scroll {
        return Ok(false);
    }
    doc.request_scroll(ScrollRequest {
        node,
        block: ScrollBlock::Center,
    })?;
    tracing::trace!(%node, "scroll into view queued");
    Ok(true)
}
