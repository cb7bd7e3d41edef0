#![forbid(unsafe_code)]

//! Selector-filtered sibling navigation with optional wrap-around.
//!
//! Used for roving focus in lists and tab strips: "move to the next enabled
//! item, wrapping at the end".

use crate::document::{Document, NodeId};
use crate::selector::Selector;

#[derive(Clone, Copy)]
enum Direction {
    Backward,
    Forward,
}

fn find_sibling(
    doc: &Document,
    node: NodeId,
    selector: &Selector,
    wrap: bool,
    direction: Direction,
) -> Option<NodeId> {
    let step = |n: NodeId| match direction {
        Direction::Backward => doc.previous_element_sibling(n),
        Direction::Forward => doc.next_element_sibling(n),
    };

    let mut sibling = step(node);
    let mut wrapped = false;
    loop {
        while let Some(candidate) = sibling {
            if doc.matches(candidate, selector) {
                return Some(candidate);
            }
            if candidate == node {
                return None;
            }
            sibling = step(candidate);
        }
        if !wrap || wrapped {
            return None;
        }
        wrapped = true;
        let parent = doc.parent(node)?;
        sibling = match direction {
            Direction::Backward => doc.last_element_child(parent),
            Direction::Forward => doc.first_element_child(parent),
        };
    }
}

/// Nearest preceding element sibling matching `selector`.
///
/// With `wrap`, the search continues from the parent's last element child
/// and ends when it comes back to `node`: `node` itself is the answer if it
/// is the only match, otherwise `None`.
#[must_use]
pub fn previous_sibling(doc: &Document, node: NodeId, selector: &Selector, wrap: bool) -> Option<NodeId> {
    find_sibling(doc, node, selector, wrap, Direction::Backward)
}

/// Nearest following element sibling matching `selector`.
///
/// With `wrap`, the search continues from the parent's first element child
/// and ends when it comes back to `node`: `node` itself is the answer if it
/// is the only match, otherwise `None`.
#[must_use]
pub fn next_sibling(doc: &Document, node: NodeId, selector: &Selector, wrap: bool) -> Option<NodeId> {
    find_sibling(doc, node, selector, wrap, Direction::Forward)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `<ul><li/><li.x/><li/><li.x/></ul>` plus a text node between items.
    fn list() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let ul = doc.create_element("ul");
        doc.append_child(doc.body(), ul).unwrap();
        let mut items = Vec::new();
        for (i, class) in ["", "x", "", "x"].iter().enumerate() {
            let li = doc.create_element("li");
            if !class.is_empty() {
                doc.add_class(li, class).unwrap();
            }
            doc.append_child(ul, li).unwrap();
            if i == 1 {
                let gap = doc.create_text(" ");
                doc.append_child(ul, gap).unwrap();
            }
            items.push(li);
        }
        (doc, items)
    }

    #[test]
    fn finds_matching_siblings_without_wrap() {
        let (doc, items) = list();
        let x = Selector::parse(".x").unwrap();
        assert_eq!(next_sibling(&doc, items[0], &x, false), Some(items[1]));
        assert_eq!(next_sibling(&doc, items[1], &x, false), Some(items[3]));
        assert_eq!(next_sibling(&doc, items[3], &x, false), None);
        assert_eq!(previous_sibling(&doc, items[3], &x, false), Some(items[1]));
        assert_eq!(previous_sibling(&doc, items[1], &x, false), None);
    }

    #[test]
    fn wraps_around_the_parent() {
        let (doc, items) = list();
        let x = Selector::parse(".x").unwrap();
        assert_eq!(next_sibling(&doc, items[3], &x, true), Some(items[1]));
        assert_eq!(previous_sibling(&doc, items[1], &x, true), Some(items[3]));
        assert_eq!(previous_sibling(&doc, items[0], &x, true), Some(items[3]));
    }

    #[test]
    fn wrap_stops_at_the_start_node() {
        let (doc, items) = list();
        let none = Selector::parse(".missing").unwrap();
        assert_eq!(next_sibling(&doc, items[2], &none, true), None);
        assert_eq!(previous_sibling(&doc, items[2], &none, true), None);

        let x = Selector::parse(".x").unwrap();
        let mut lone = Document::new();
        let orphan = lone.create_element("li");
        lone.add_class(orphan, "x").unwrap();
        assert_eq!(next_sibling(&lone, orphan, &x, true), None);
    }

    #[test]
    fn wrap_returns_the_start_node_when_it_is_the_only_match() {
        let mut doc = Document::new();
        let ul = doc.create_element("ul");
        doc.append_child(doc.body(), ul).unwrap();
        let only = doc.create_element("li");
        doc.add_class(only, "x").unwrap();
        doc.append_child(ul, only).unwrap();
        let other = doc.create_element("li");
        doc.append_child(ul, other).unwrap();

        let x = Selector::parse(".x").unwrap();
        assert_eq!(next_sibling(&doc, only, &x, true), Some(only));
        assert_eq!(previous_sibling(&doc, only, &x, true), Some(only));
        assert_eq!(next_sibling(&doc, only, &x, false), None);
        assert_eq!(next_sibling(&doc, other, &x, true), Some(only));
    }
}
