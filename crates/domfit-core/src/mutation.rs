#![forbid(unsafe_code)]

//! Content mutation kinds and observation filters.

use bitflags::bitflags;

bitflags! {
    /// Kinds of content mutation a notifier can report.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MutationKinds: u8 {
        /// An attribute was set, changed or removed.
        const ATTRIBUTES = 0b001;
        /// A child node was inserted or removed.
        const CHILD_LIST = 0b010;
        /// Text content changed.
        const CHARACTER_DATA = 0b100;
    }
}

/// Which mutations an observer wants, and how deep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationFilter {
    /// Accepted mutation kinds.
    pub kinds: MutationKinds,
    /// Also accept mutations on descendants of the observed node.
    pub subtree: bool,
}

impl MutationFilter {
    /// Watch everything, including the full subtree.
    ///
    /// This is the configuration the fit controller uses.
    pub const fn everything() -> Self {
        Self {
            kinds: MutationKinds::all(),
            subtree: true,
        }
    }

    /// Watch only the given kinds on the observed node itself.
    pub const fn node_only(kinds: MutationKinds) -> Self {
        Self {
            kinds,
            subtree: false,
        }
    }

    /// Whether a mutation of `kind` should be reported.
    ///
    /// `on_target` is true when the mutation happened on the observed node
    /// itself, false when it happened on a descendant.
    #[must_use]
    pub fn accepts(&self, kind: MutationKinds, on_target: bool) -> bool {
        self.kinds.intersects(kind) && (on_target || self.subtree)
    }

    /// A filter that accepts nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for MutationFilter {
    fn default() -> Self {
        Self::everything()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_accepts_descendants() {
        let filter = MutationFilter::everything();
        assert!(filter.accepts(MutationKinds::ATTRIBUTES, true));
        assert!(filter.accepts(MutationKinds::CHILD_LIST, false));
        assert!(filter.accepts(MutationKinds::CHARACTER_DATA, false));
    }

    #[test]
    fn node_only_rejects_descendants() {
        let filter = MutationFilter::node_only(MutationKinds::ATTRIBUTES);
        assert!(filter.accepts(MutationKinds::ATTRIBUTES, true));
        assert!(!filter.accepts(MutationKinds::ATTRIBUTES, false));
        assert!(!filter.accepts(MutationKinds::CHILD_LIST, true));
    }

    #[test]
    fn empty_filter_accepts_nothing() {
        let filter = MutationFilter::node_only(MutationKinds::empty());
        assert!(filter.is_empty());
        assert!(!filter.accepts(MutationKinds::all(), true));
    }
}
