//! Arena-based model of the host document tree.
//!
//! The exporter never runs against a live rendering engine; instead the host
//! document is an explicit [`Document`] value built by the caller, either
//! programmatically or by mounting rendered markup (see [`Document::append_markup`]).
//! The arena layout keeps traversal cheap and node identity stable across
//! mutation.

use std::collections::HashMap;

use crate::style::StyleSheet;

mod parse;

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node type in the document tree.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with name and attributes.
    Element {
        name: String,
        attrs: Vec<Attribute>,
        /// Pre-extracted id for fast lookup.
        id: Option<String>,
        /// Pre-extracted classes for fast lookup.
        classes: Vec<String>,
    },
    /// Text content.
    Text(String),
    /// Comment.
    Comment(String),
}

/// Element attribute. The name carries any namespace prefix verbatim
/// (`xmlns:xlink` is a single attribute named exactly that).
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// A node in the document tree.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Rendered bounding geometry of an element, relative to the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// Reference to an exportable node: a direct id, or a lookup expression
/// resolved against the document at call time.
///
/// Lookup expressions cover the forms exporting callers use: `#id`,
/// `.class`, and a bare tag name.
#[derive(Debug, Clone)]
pub enum NodeSource {
    Node(NodeId),
    Selector(String),
}

impl From<NodeId> for NodeSource {
    fn from(id: NodeId) -> Self {
        NodeSource::Node(id)
    }
}

impl From<&str> for NodeSource {
    fn from(expr: &str) -> Self {
        NodeSource::Selector(expr.to_string())
    }
}

impl From<String> for NodeSource {
    fn from(expr: String) -> Self {
        NodeSource::Selector(expr)
    }
}

impl std::fmt::Display for NodeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeSource::Node(id) => write!(f, "node {}", id.0),
            NodeSource::Selector(expr) => f.write_str(expr),
        }
    }
}

/// The host document: an arena of nodes plus the registries the exporter
/// reads from it (stylesheets, rendered geometry).
///
/// All nodes are stored in a contiguous vector; parent/child/sibling links
/// use indices into this vector. Nodes are never deallocated within a
/// document's lifetime, so [`NodeId`]s stay valid across mutation.
pub struct Document {
    nodes: Vec<Node>,
    document: NodeId,
    /// Map from id attribute to node ID for fast lookup.
    id_map: HashMap<String, NodeId>,
    sheets: Vec<StyleSheet>,
    bounds: HashMap<NodeId, Rect>,
}

impl Document {
    /// Create a new empty document with a document root.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
            id_map: HashMap::new(),
            sheets: Vec::new(),
            bounds: HashMap::new(),
        };
        doc.document = doc.alloc(Node::new(NodeData::Document));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document root ID.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create a new element node.
    pub fn create_element(&mut self, name: &str, attrs: Vec<Attribute>) -> NodeId {
        let mut id = None;
        let mut classes = Vec::new();

        for attr in &attrs {
            if attr.name == "id" {
                id = Some(attr.value.clone());
            } else if attr.name == "class" {
                classes = attr
                    .value
                    .split_whitespace()
                    .map(|s| s.to_string())
                    .collect();
            }
        }

        let node_id = self.alloc(Node::new(NodeData::Element {
            name: name.to_string(),
            attrs,
            id: id.clone(),
            classes,
        }));

        if let Some(id_str) = id {
            self.id_map.insert(id_str, node_id);
        }

        node_id
    }

    /// Create a new text node.
    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    /// Create a new comment node.
    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if last_child.is_some() {
            if let Some(last_node) = self.get_mut(last_child) {
                last_node.next_sibling = child;
            }
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let parent = self.get(sibling).map(|n| n.parent).unwrap_or(NodeId::NONE);
        let prev = self
            .get(sibling)
            .map(|n| n.prev_sibling)
            .unwrap_or(NodeId::NONE);

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Insert a node as the first child of a parent. Equivalent to inserting
    /// before the current first child, or appending when there is none.
    pub fn insert_first(&mut self, parent: NodeId, new_node: NodeId) {
        let first = self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        if first.is_some() {
            self.insert_before(first, new_node);
        } else {
            self.append(parent, new_node);
        }
    }

    /// Append text to an existing trailing text node, or create a new one.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child) {
            if let NodeData::Text(ref mut existing) = last.data {
                existing.push_str(text);
                return;
            }
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Get node by id attribute.
    pub fn get_by_id(&self, id: &str) -> Option<NodeId> {
        self.id_map.get(id).copied()
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        ChildrenIter {
            doc: self,
            current: first,
        }
    }

    /// Find the first node matching a predicate (DFS, document order).
    pub fn find<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        let mut stack = vec![self.document];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(id) {
                if predicate(node) {
                    return Some(id);
                }
                let mut children: Vec<_> = self.children(id).collect();
                children.reverse();
                stack.extend(children);
            }
        }
        None
    }

    /// Find element by tag name (first match).
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find(|node| {
            if let NodeData::Element { name, .. } = &node.data {
                name == tag
            } else {
                false
            }
        })
    }

    /// Resolve a lookup expression (`#id`, `.class`, or a tag name) to the
    /// first matching element in document order.
    pub fn resolve(&self, expr: &str) -> Option<NodeId> {
        if let Some(id) = expr.strip_prefix('#') {
            self.get_by_id(id)
        } else if let Some(class) = expr.strip_prefix('.') {
            self.find(|node| {
                matches!(&node.data, NodeData::Element { classes, .. }
                    if classes.iter().any(|c| c == class))
            })
        } else {
            self.find_by_tag(expr)
        }
    }

    /// Resolve a [`NodeSource`] to a live node.
    pub fn locate(&self, source: &NodeSource) -> Option<NodeId> {
        match source {
            NodeSource::Node(id) => self.get(*id).map(|_| *id),
            NodeSource::Selector(expr) => self.resolve(expr),
        }
    }

    /// Register a stylesheet. Registration order is preserved and drives
    /// style collection order.
    pub fn register_stylesheet(&mut self, sheet: StyleSheet) {
        self.sheets.push(sheet);
    }

    /// Parse CSS text and register it as a stylesheet.
    pub fn register_css(&mut self, css: &str) {
        self.sheets.push(StyleSheet::parse(css));
    }

    /// The registered stylesheets, in registration order.
    pub fn stylesheets(&self) -> &[StyleSheet] {
        &self.sheets
    }

    /// Record the rendered bounding geometry of an element, as produced by
    /// whatever laid the graphic out.
    pub fn set_rendered_bounds(&mut self, id: NodeId, rect: Rect) {
        self.bounds.insert(id, rect);
    }

    /// Rendered bounding geometry of an element. Elements that were never
    /// laid out report a zero rect.
    pub fn rendered_bounds(&self, id: NodeId) -> Rect {
        self.bounds.get(&id).copied().unwrap_or_default()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    doc: &'a Document,
    current: NodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self.doc.get(id).map(|n| n.next_sibling).unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Convenience methods for element nodes.
impl Document {
    /// Get element's tag name.
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Get an attribute value.
    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Check whether an element carries an attribute.
    pub fn has_attr(&self, id: NodeId, attr_name: &str) -> bool {
        self.get_attr(id, attr_name).is_some()
    }

    /// Set an attribute, overwriting any existing value. Setting `id` or
    /// `class` also refreshes the lookup caches.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: &str) {
        let mut old_id = None;
        let mut new_id = None;

        if let Some(node) = self.get_mut(id) {
            if let NodeData::Element {
                attrs,
                id: elem_id,
                classes,
                ..
            } = &mut node.data
            {
                match attrs.iter_mut().find(|a| a.name == attr_name) {
                    Some(attr) => attr.value = value.to_string(),
                    None => attrs.push(Attribute {
                        name: attr_name.to_string(),
                        value: value.to_string(),
                    }),
                }
                if attr_name == "id" {
                    old_id = elem_id.take();
                    *elem_id = Some(value.to_string());
                    new_id = Some(value.to_string());
                } else if attr_name == "class" {
                    *classes = value.split_whitespace().map(|s| s.to_string()).collect();
                }
            }
        }

        if let Some(old) = old_id {
            self.id_map.remove(&old);
        }
        if let Some(new) = new_id {
            self.id_map.insert(new, id);
        }
    }

    /// Remove an attribute if present.
    pub fn remove_attr(&mut self, id: NodeId, attr_name: &str) {
        let mut old_id = None;

        if let Some(node) = self.get_mut(id) {
            if let NodeData::Element {
                attrs,
                id: elem_id,
                classes,
                ..
            } = &mut node.data
            {
                attrs.retain(|a| a.name != attr_name);
                if attr_name == "id" {
                    old_id = elem_id.take();
                } else if attr_name == "class" {
                    classes.clear();
                }
            }
        }

        if let Some(old) = old_id {
            self.id_map.remove(&old);
        }
    }

    /// Get element's id attribute.
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { id, .. } => id.as_deref(),
            _ => None,
        })
    }

    /// Get element's classes.
    pub fn element_classes(&self, id: NodeId) -> &[String] {
        static EMPTY: &[String] = &[];
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(EMPTY)
    }

    /// Check if node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Check if node is a text node.
    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Get text content of a text node.
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Count of immediate element children (text and comments excluded).
    pub fn child_element_count(&self, id: NodeId) -> usize {
        self.children(id).filter(|&c| self.is_element(c)).count()
    }
}
