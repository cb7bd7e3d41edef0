#![forbid(unsafe_code)]

//! Host-driven document model.
//!
//! [`Document`] is a small element tree standing in for the browser DOM. The
//! host (or a test) owns the geometry: it assigns intrinsic widths, client
//! widths, heights and offsets. The document records content mutations and
//! delivers them, together with box-size and viewport changes, to observers
//! when [`flush_observers`](Document::flush_observers) is called.
//!
//! # Layout
//!
//! Layout is a single row, with no wrapping, margins or positioning:
//!
//! - a text node is one unit wide per character;
//! - an element is its intrinsic width plus its children's widths;
//! - an element with the `hidden` attribute is zero wide.
//!
//! An element's own intrinsic width is a leading inset: it sits to the left
//! of its children, so the first child starts at that offset. This is why
//! [`child_right_edges`](Document::child_right_edges) of a container with
//! intrinsic width 8 and two 30-wide children is `[38, 68]`.
//!
//! An element with an assigned client width is a constrained box: its
//! `scroll_width` is `max(client_width, laid-out width)`. Unconstrained
//! elements are exactly as wide as their content.
//!
//! # Observers
//!
//! | Observer | Fires when | On observe |
//! |----------|------------|------------|
//! | mutation | a record matches target (or descendant, with `subtree`) and kind | no |
//! | resize   | the target's box size differs from the last delivered one | yes |
//! | viewport | the viewport size changed | no |
//!
//! Observers deliver into a [`TriggerSink`]; they never call back into the
//! document, so flushing cannot reenter.

use std::collections::BTreeMap;
use std::fmt;

use domfit_core::{BoxSize, MutationFilter, MutationKinds, ScrollMetrics, TriggerSink, TriggerSource};

use crate::scroll_into_view::ScrollRequest;
use crate::selector::Selector;

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Raw index, stable for the lifetime of the document.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

/// Document operation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The id does not name a node in this document.
    UnknownNode(NodeId),
    /// The operation needs an element.
    NotAnElement(NodeId),
    /// The operation needs a text node.
    NotText(NodeId),
    /// Inserting `child` under `parent` would create a cycle.
    HierarchyCycle {
        /// Requested parent.
        parent: NodeId,
        /// Requested child.
        child: NodeId,
    },
    /// A selector could not be parsed.
    InvalidSelector(String),
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "unknown node {id}"),
            Self::NotAnElement(id) => write!(f, "node {id} is not an element"),
            Self::NotText(id) => write!(f, "node {id} is not a text node"),
            Self::HierarchyCycle { parent, child } => {
                write!(f, "cannot insert {child} under {parent}: would create a cycle")
            }
            Self::InvalidSelector(sel) => write!(f, "invalid selector: {sel:?}"),
        }
    }
}

impl std::error::Error for DomError {}

/// One recorded content mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Node whose attributes, children or text changed.
    pub target: NodeId,
    /// Exactly one of the [`MutationKinds`] flags.
    pub kind: MutationKinds,
    /// Attribute name for attribute mutations.
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    intrinsic_width: i32,
    client_width: Option<i32>,
    height: i32,
    top: i32,
}

#[derive(Debug, Clone)]
enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug)]
enum ObserverKind {
    Mutation { target: NodeId, filter: MutationFilter },
    Resize { target: NodeId, last: Option<BoxSize> },
    Viewport { last: BoxSize },
}

#[derive(Debug)]
struct Observer {
    id: ObserverId,
    kind: ObserverKind,
    sink: TriggerSink,
}

/// Counts from one [`Document::flush_observers`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Mutation records consumed.
    pub records: usize,
    /// Notifications delivered to sinks (all observer kinds).
    pub notifications: usize,
}

/// In-memory element tree with host-assigned geometry.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    viewport: BoxSize,
    records: Vec<MutationRecord>,
    observers: Vec<Observer>,
    next_observer: u32,
    scrolls: Vec<ScrollRequest>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only `body`, with a 1024x768 viewport.
    #[must_use]
    pub fn new() -> Self {
        let body = Node {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element(Element {
                tag: "body".into(),
                ..Element::default()
            }),
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
            viewport: BoxSize::new(1024, 768),
            records: Vec::new(),
            observers: Vec::new(),
            next_observer: 0,
            scrolls: Vec::new(),
        }
    }

    /// The body element; the default mount point for portals.
    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    // -------------------------------------------------------------------------
    // Node creation and tree structure
    // -------------------------------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element {
            tag: tag.to_ascii_lowercase(),
            ..Element::default()
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0 as usize).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(DomError::UnknownNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&Element, DomError> {
        match &self.node(id)?.data {
            NodeData::Element(el) => Ok(el),
            NodeData::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(el) => Ok(el),
            NodeData::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    fn record(&mut self, target: NodeId, kind: MutationKinds, attribute: Option<&str>) {
        self.records.push(MutationRecord {
            target,
            kind,
            attribute: attribute.map(str::to_string),
        });
    }

    /// Whether `id` names a node in this document.
    #[must_use]
    pub fn exists(&self, id: NodeId) -> bool {
        (id.0 as usize) < self.nodes.len()
    }

    /// Whether `id` names an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_ok()
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.element(parent)?;
        self.node(child)?;
        if self.contains(child, parent) {
            return Err(DomError::HierarchyCycle { parent, child });
        }
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.record(parent, MutationKinds::CHILD_LIST, None);
        Ok(())
    }

    /// Remove `child` from `parent`. Returns `false` if it was not a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, DomError> {
        if self.node(child)?.parent != Some(parent) {
            return Ok(false);
        }
        self.detach(child)?;
        Ok(true)
    }

    /// Detach `node` from its parent, returning the former parent.
    pub fn detach(&mut self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(None);
        };
        self.node_mut(parent)?.children.retain(|c| *c != node);
        self.node_mut(node)?.parent = None;
        self.record(parent, MutationKinds::CHILD_LIST, None);
        Ok(Some(parent))
    }

    /// Parent of `node`, if attached.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).ok().and_then(|n| n.parent)
    }

    /// Children of `node` (elements and text), in order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map_or(&[], |n| n.children.as_slice())
    }

    /// Element children of `node`, in order.
    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
    }

    /// Inclusive containment: a node contains itself.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    fn sibling_element(&self, node: NodeId, forward: bool) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|c| *c == node)?;
        if forward {
            siblings[pos + 1..]
                .iter()
                .copied()
                .find(|c| self.is_element(*c))
        } else {
            siblings[..pos]
                .iter()
                .rev()
                .copied()
                .find(|c| self.is_element(*c))
        }
    }

    /// Nearest preceding element sibling.
    #[must_use]
    pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.sibling_element(node, false)
    }

    /// Nearest following element sibling.
    #[must_use]
    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.sibling_element(node, true)
    }

    /// First element child.
    #[must_use]
    pub fn first_element_child(&self, node: NodeId) -> Option<NodeId> {
        self.element_children(node).next()
    }

    /// Last element child.
    #[must_use]
    pub fn last_element_child(&self, node: NodeId) -> Option<NodeId> {
        self.element_children(node).last()
    }

    /// Whether `node` is an element matching `selector`.
    #[must_use]
    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self, node)
    }

    // -------------------------------------------------------------------------
    // Element content
    // -------------------------------------------------------------------------

    /// Lowercase tag name of an element.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).ok().map(|el| el.tag.as_str())
    }

    /// Set an attribute. `class` replaces the class list.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let el = self.element_mut(node)?;
        if name == "class" {
            el.classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            el.attributes.insert(name.to_string(), value.to_string());
        }
        self.record(node, MutationKinds::ATTRIBUTES, Some(name));
        Ok(())
    }

    /// Remove an attribute. Returns whether it was present.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<bool, DomError> {
        let el = self.element_mut(node)?;
        let removed = if name == "class" {
            let had = !el.classes.is_empty();
            el.classes.clear();
            had
        } else {
            el.attributes.remove(name).is_some()
        };
        if removed {
            self.record(node, MutationKinds::ATTRIBUTES, Some(name));
        }
        Ok(removed)
    }

    /// Attribute value (not `class`; see [`classes`](Self::classes)).
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .ok()
            .and_then(|el| el.attributes.get(name))
            .map(String::as_str)
    }

    /// Whether the attribute is present. `class` counts when non-empty.
    #[must_use]
    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        match self.element(node) {
            Ok(el) if name == "class" => !el.classes.is_empty(),
            Ok(el) => el.attributes.contains_key(name),
            Err(_) => false,
        }
    }

    /// Class list of an element.
    #[must_use]
    pub fn classes(&self, node: NodeId) -> &[String] {
        self.element(node).map_or(&[], |el| el.classes.as_slice())
    }

    /// Whether the element carries `class`.
    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).iter().any(|c| c == class)
    }

    /// Add a class. Returns whether the list changed.
    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<bool, DomError> {
        let el = self.element_mut(node)?;
        if el.classes.iter().any(|c| c == class) {
            return Ok(false);
        }
        el.classes.push(class.to_string());
        self.record(node, MutationKinds::ATTRIBUTES, Some("class"));
        Ok(true)
    }

    /// Remove a class. Returns whether the list changed.
    pub fn remove_class(&mut self, node: NodeId, class: &str) -> Result<bool, DomError> {
        let el = self.element_mut(node)?;
        let before = el.classes.len();
        el.classes.retain(|c| c != class);
        let changed = el.classes.len() != before;
        if changed {
            self.record(node, MutationKinds::ATTRIBUTES, Some("class"));
        }
        Ok(changed)
    }

    /// Set an inline style property.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(node)?
            .style
            .insert(property.to_string(), value.to_string());
        self.record(node, MutationKinds::ATTRIBUTES, Some("style"));
        Ok(())
    }

    /// Inline style property value.
    #[must_use]
    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node)
            .ok()
            .and_then(|el| el.style.get(property))
            .map(String::as_str)
    }

    /// Replace the contents of a text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.node_mut(node)?.data {
            NodeData::Text(t) => {
                text.clone_into(t);
            }
            NodeData::Element(_) => return Err(DomError::NotText(node)),
        }
        self.record(node, MutationKinds::CHARACTER_DATA, None);
        Ok(())
    }

    /// Contents of a text node.
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).ok()?.data {
            NodeData::Text(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }

    // -------------------------------------------------------------------------
    // Geometry (host-assigned)
    // -------------------------------------------------------------------------

    /// Set an element's own width, excluding children.
    pub fn set_intrinsic_width(&mut self, node: NodeId, width: i32) -> Result<(), DomError> {
        self.element_mut(node)?.intrinsic_width = width.max(0);
        Ok(())
    }

    /// Constrain (or, with `None`, release) an element's visible width.
    pub fn set_client_width(&mut self, node: NodeId, width: Option<i32>) -> Result<(), DomError> {
        self.element_mut(node)?.client_width = width.map(|w| w.max(0));
        Ok(())
    }

    /// Set an element's height.
    pub fn set_height(&mut self, node: NodeId, height: i32) -> Result<(), DomError> {
        self.element_mut(node)?.height = height.max(0);
        Ok(())
    }

    /// Set an element's top offset relative to the viewport.
    pub fn set_top(&mut self, node: NodeId, top: i32) -> Result<(), DomError> {
        self.element_mut(node)?.top = top;
        Ok(())
    }

    /// Top offset relative to the viewport.
    #[must_use]
    pub fn top(&self, node: NodeId) -> i32 {
        self.element(node).map_or(0, |el| el.top)
    }

    /// Laid-out width: zero when hidden, else own width plus children.
    #[must_use]
    pub fn layout_width(&self, node: NodeId) -> i32 {
        match self.node(node).map(|n| &n.data) {
            Ok(NodeData::Text(t)) => t.chars().count() as i32,
            Ok(NodeData::Element(el)) => {
                if el.attributes.contains_key("hidden") {
                    return 0;
                }
                self.children(node)
                    .iter()
                    .fold(el.intrinsic_width, |acc, c| acc.saturating_add(self.layout_width(*c)))
            }
            Err(_) => 0,
        }
    }

    /// Visible width: the assigned client width, or the laid-out width.
    #[must_use]
    pub fn client_width(&self, node: NodeId) -> i32 {
        match self.element(node) {
            Ok(el) => el
                .client_width
                .unwrap_or_else(|| self.layout_width(node)),
            Err(_) => self.layout_width(node),
        }
    }

    /// Rendered content width, never less than the client width.
    #[must_use]
    pub fn scroll_width(&self, node: NodeId) -> i32 {
        self.client_width(node).max(self.layout_width(node))
    }

    /// `scroll_width` / `client_width` pair, or `None` for unknown nodes.
    #[must_use]
    pub fn scroll_metrics(&self, node: NodeId) -> Option<ScrollMetrics> {
        self.exists(node)
            .then(|| ScrollMetrics::new(self.scroll_width(node), self.client_width(node)))
    }

    /// Border-box size of an element.
    #[must_use]
    pub fn box_size(&self, node: NodeId) -> BoxSize {
        let height = self.element(node).map_or(0, |el| el.height);
        BoxSize::new(self.client_width(node), height)
    }

    /// Right edge of each element child, relative to the parent's left edge.
    ///
    /// Offsets start after the parent's own intrinsic width.
    #[must_use]
    pub fn child_right_edges(&self, node: NodeId) -> Vec<i32> {
        let own = self.element(node).map_or(0, |el| el.intrinsic_width);
        let mut offset = own;
        let mut edges = Vec::new();
        for child in self.children(node) {
            offset = offset.saturating_add(self.layout_width(*child));
            if self.is_element(*child) {
                edges.push(offset);
            }
        }
        edges
    }

    /// Current viewport size.
    #[must_use]
    pub const fn viewport(&self) -> BoxSize {
        self.viewport
    }

    /// Resize the viewport (the window).
    pub fn set_viewport(&mut self, size: BoxSize) {
        self.viewport = size;
    }

    // -------------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------------

    fn register(&mut self, kind: ObserverKind, sink: TriggerSink) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Observer { id, kind, sink });
        id
    }

    /// Observe content mutations of `target` (and its subtree, per `filter`).
    pub fn observe_mutations(
        &mut self,
        target: NodeId,
        filter: MutationFilter,
        sink: TriggerSink,
    ) -> Result<ObserverId, DomError> {
        self.node(target)?;
        Ok(self.register(ObserverKind::Mutation { target, filter }, sink))
    }

    /// Observe the box size of `target`. Fires once on the next flush.
    pub fn observe_resize(&mut self, target: NodeId, sink: TriggerSink) -> Result<ObserverId, DomError> {
        self.element(target)?;
        Ok(self.register(ObserverKind::Resize { target, last: None }, sink))
    }

    /// Observe viewport resizes.
    pub fn observe_viewport(&mut self, sink: TriggerSink) -> ObserverId {
        let last = self.viewport;
        self.register(ObserverKind::Viewport { last }, sink)
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.id != id);
        self.observers.len() != before
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Queue a scroll of an element into view, applied by the next host step.
    pub fn request_scroll(&mut self, request: ScrollRequest) -> Result<(), DomError> {
        self.element(request.node)?;
        self.scrolls.push(request);
        Ok(())
    }

    /// Scroll requests not yet drained.
    #[must_use]
    pub fn pending_scrolls(&self) -> &[ScrollRequest] {
        &self.scrolls
    }

    /// Drain queued scroll requests, dropping those whose node has left the
    /// tree since it was queued.
    pub fn take_scroll_requests(&mut self) -> Vec<ScrollRequest> {
        let mut requests = std::mem::take(&mut self.scrolls);
        requests.retain(|r| self.contains(self.body, r.node));
        requests
    }

    /// Mutation records not yet flushed.
    #[must_use]
    pub fn pending_records(&self) -> &[MutationRecord] {
        &self.records
    }

    /// Deliver pending mutation records, box-size changes and viewport
    /// changes to observers, then clear the records.
    pub fn flush_observers(&mut self) -> FlushStats {
        let records = std::mem::take(&mut self.records);
        let mut delivered = 0;

        for i in 0..self.observers.len() {
            let (fire, source) = match self.observers[i].kind {
                ObserverKind::Mutation { target, filter } => {
                    let fire = records.iter().any(|r| {
                        let on_target = r.target == target;
                        (on_target || self.contains(target, r.target))
                            && filter.accepts(r.kind, on_target)
                    });
                    (fire, TriggerSource::ContentChange)
                }
                ObserverKind::Resize { target, last } => {
                    let now = self.box_size(target);
                    let fire = last != Some(now);
                    self.observers[i].kind = ObserverKind::Resize {
                        target,
                        last: Some(now),
                    };
                    (fire, TriggerSource::SizeChange)
                }
                ObserverKind::Viewport { last } => {
                    let now = self.viewport;
                    self.observers[i].kind = ObserverKind::Viewport { last: now };
                    (last != now, TriggerSource::SizeChange)
                }
            };
            if fire && self.observers[i].sink.notify(source) {
                delivered += 1;
            }
        }

        if delivered > 0 || !records.is_empty() {
            tracing::trace!(records = records.len(), delivered, "document observers flushed");
        }
        FlushStats {
            records: records.len(),
            notifications: delivered,
        }
    }
}
