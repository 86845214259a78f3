//! Arena-backed document tree.
//!
//! This module provides the core `Document` representation:
//! - **indextree Arena**: all nodes in contiguous memory (cache-friendly)
//! - **Non-owning handles**: a `NodeId` is a plain index; any number of
//!   handles may alias the same node, and the document owns the whole tree
//! - **Structural primitives**: every higher-level mutation composes from
//!   `insert_at`, `remove_from`, `replace_at`, and `decompose`

use indexmap::IndexMap;
use indextree::{Arena, NodeId};

use crate::attrs::parse_style;
use crate::error::{DomError, Result};
use crate::events::EventRegistry;
use crate::tracing_macros::debug;

/// Document = Arena + invisible root node + doctype + listener table.
#[derive(Debug, Clone)]
pub struct Document {
    /// THE tree - all nodes live here
    pub(crate) arena: Arena<NodeData>,

    /// Invisible document node, parent of `<html>`
    root: NodeId,

    /// DOCTYPE if present (usually "html")
    pub(crate) doctype: Option<String>,

    /// Per-node event listener table, keyed by `NodeId`
    pub(crate) events: EventRegistry,
}

impl Document {
    /// Create an empty document containing only the invisible root node.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData {
            kind: NodeKind::Document,
        });
        Self {
            arena,
            root,
            doctype: None,
            events: EventRegistry::default(),
        }
    }

    pub(crate) fn from_parts(arena: Arena<NodeData>, root: NodeId, doctype: Option<String>) -> Self {
        Self {
            arena,
            root,
            doctype,
            events: EventRegistry::default(),
        }
    }

    /// The invisible document node at the top of the tree.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The DOCTYPE name, if one was parsed.
    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    /// Get node data, or `None` if the handle is stale.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.arena
            .get(id)
            .filter(|n| !n.is_removed())
            .map(|n| n.get())
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.get(id).ok_or(DomError::StaleHandle)
    }

    pub(crate) fn element(&self, id: NodeId) -> Result<&ElementData> {
        match &self.node(id)?.kind {
            NodeKind::Element(elem) => Ok(elem),
            _ => Err(DomError::NotAnElement),
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData> {
        let node = self
            .arena
            .get_mut(id)
            .filter(|n| !n.is_removed())
            .ok_or(DomError::StaleHandle)?;
        match &mut node.get_mut().kind {
            NodeKind::Element(elem) => Ok(elem),
            _ => Err(DomError::NotAnElement),
        }
    }

    /// True if the handle refers to a live element node.
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(
            self.get(id),
            Some(NodeData {
                kind: NodeKind::Element(_)
            })
        )
    }

    /// Tag name of an element node, `None` for anything else.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.kind {
            NodeKind::Element(elem) => Some(elem.tag.as_str()),
            _ => None,
        }
    }

    /// Iterate direct children of a node, in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Parent of a node, or `None` at the root / for detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena
            .get(id)
            .filter(|n| !n.is_removed())
            .and_then(|n| n.parent())
    }

    /// Depth-first, pre-order traversal of everything under `id` (excluding
    /// `id` itself). A fresh iterator each call, not a stateful cursor.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena).skip(1)
    }

    /// True iff `node` appears somewhere under `ancestor`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if self.get(node).is_none() {
            return false;
        }
        node != ancestor && node.ancestors(&self.arena).skip(1).any(|a| a == ancestor)
    }

    /// Create a new detached element. The tag is folded to lowercase so that
    /// created and parsed elements compare the same way.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Element(ElementData::new(tag.to_ascii_lowercase())),
        })
    }

    /// Create a new detached text node.
    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Text(text.to_string()),
        })
    }

    /// Insert `node` at position `index` of `parent`'s children, detaching it
    /// from any current parent first. The index is judged against the child
    /// list as it will be after the detach, so moving a node forward within
    /// its own parent addresses the shrunken list.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, node: NodeId) -> Result<()> {
        self.node(node)?;
        self.ensure_can_contain(parent)?;
        self.ensure_no_cycle(node, parent)?;
        let mut len = parent.children(&self.arena).count();
        if self.parent(node) == Some(parent) {
            len -= 1;
        }
        if index > len {
            return Err(DomError::IndexOutOfBounds { index, len });
        }
        node.detach(&mut self.arena);
        match parent.children(&self.arena).nth(index) {
            Some(sibling) => sibling.insert_before(node, &mut self.arena),
            None => parent.append(node, &mut self.arena),
        }
        Ok(())
    }

    /// Detach `node` from `parent`'s children. The node survives, orphaned.
    pub fn remove_from(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        if self.parent(node) != Some(parent) {
            return Err(DomError::ChildNotFound);
        }
        node.detach(&mut self.arena);
        Ok(())
    }

    /// Replace the child at `index` with `node`. The old child is detached,
    /// not decomposed.
    pub fn replace_at(&mut self, parent: NodeId, index: usize, node: NodeId) -> Result<()> {
        self.node(node)?;
        self.ensure_can_contain(parent)?;
        self.ensure_no_cycle(node, parent)?;
        let Some(old) = parent.children(&self.arena).nth(index) else {
            let len = parent.children(&self.arena).count();
            return Err(DomError::IndexOutOfBounds { index, len });
        };
        if old == node {
            return Ok(());
        }
        node.detach(&mut self.arena);
        old.insert_before(node, &mut self.arena);
        old.detach(&mut self.arena);
        Ok(())
    }

    /// Permanently detach `node` and its whole subtree; the slots are freed
    /// and the handles become stale. Listeners registered on any node in the
    /// subtree are dropped with it.
    pub fn decompose(&mut self, node: NodeId) -> Result<()> {
        self.node(node)?;
        let subtree: Vec<NodeId> = node.descendants(&self.arena).collect();
        debug!("decomposing {} nodes", subtree.len());
        for id in subtree {
            self.events.drop_node(id);
        }
        node.remove_subtree(&mut self.arena);
        Ok(())
    }

    /// Decompose all children of `node`, leaving `node` itself in place.
    pub(crate) fn clear_children(&mut self, node: NodeId) {
        let kids: Vec<NodeId> = node.children(&self.arena).collect();
        for kid in kids {
            let subtree: Vec<NodeId> = kid.descendants(&self.arena).collect();
            for id in subtree {
                self.events.drop_node(id);
            }
            kid.remove_subtree(&mut self.arena);
        }
    }

    /// Deep-copy a subtree out of another document's arena into this one.
    /// Returns the detached copy's id.
    pub(crate) fn adopt(&mut self, src: &Document, src_id: NodeId) -> NodeId {
        let data = src.arena[src_id].get().clone();
        let id = self.arena.new_node(data);
        for child in src_id.children(&src.arena) {
            let copy = self.adopt(src, child);
            id.append(copy, &mut self.arena);
        }
        id
    }

    /// Only elements and the document node may hold children.
    pub(crate) fn ensure_can_contain(&self, parent: NodeId) -> Result<()> {
        match self.node(parent)?.kind {
            NodeKind::Element(_) | NodeKind::Document => Ok(()),
            _ => Err(DomError::NotAnElement),
        }
    }

    /// Fail fast if attaching `node` under `parent` would create a cycle.
    pub(crate) fn ensure_no_cycle(&self, node: NodeId, parent: NodeId) -> Result<()> {
        if parent.ancestors(&self.arena).any(|a| a == node) {
            return Err(DomError::HierarchyError);
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// What goes in each arena slot.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
}

/// Node types.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible, parent of `<html>`)
    Document,
    /// Element with tag, attributes, and style map
    Element(ElementData),
    /// Text content
    Text(String),
    /// HTML comment
    Comment(String),
}

/// Element data: tag, namespace, attributes, and the parsed style mapping.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name (lowercase for HTML)
    pub tag: String,

    /// Namespace (Html, Svg, or MathMl)
    pub ns: Namespace,

    /// Attributes - IndexMap preserves insertion order for serialization
    pub attrs: IndexMap<String, String>,

    /// Parsed `style` attribute, seeded once at node creation. Style writes
    /// merge into this map and re-serialize it back to the attribute.
    pub(crate) style: IndexMap<String, String>,
}

impl ElementData {
    /// Create element data with no attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ns: Namespace::Html,
            attrs: IndexMap::new(),
            style: IndexMap::new(),
        }
    }

    /// Element data with attributes already collected; seeds the style map
    /// from the `style` attribute if present.
    pub(crate) fn with_attrs(tag: String, ns: Namespace, attrs: IndexMap<String, String>) -> Self {
        let style = attrs.get("style").map(|s| parse_style(s)).unwrap_or_default();
        Self {
            tag,
            ns,
            attrs,
            style,
        }
    }
}

/// XML namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn from_url(url: &str) -> Self {
        match url {
            "http://www.w3.org/2000/svg" => Namespace::Svg,
            "http://www.w3.org/1998/Math/MathML" => Namespace::MathMl,
            _ => Namespace::Html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let a = doc.create_element("a");
        let text = doc.create_text_node("hi");
        doc.insert_at(doc.root(), 0, div).unwrap();
        doc.insert_at(div, 0, a).unwrap();
        doc.insert_at(a, 0, text).unwrap();
        (doc, div, a, text)
    }

    #[test]
    fn parent_child_symmetry() {
        let (doc, div, a, text) = sample();
        assert_eq!(doc.parent(a), Some(div));
        assert!(doc.children(div).any(|c| c == a));
        assert_eq!(doc.parent(text), Some(a));
        assert!(doc.children(a).any(|c| c == text));
    }

    #[test]
    fn insert_relocates_instead_of_duplicating() {
        let (mut doc, div, a, _) = sample();
        let span = doc.create_element("span");
        doc.insert_at(div, 1, span).unwrap();
        // moving a into span detaches it from div first
        doc.insert_at(span, 0, a).unwrap();
        assert_eq!(doc.parent(a), Some(span));
        assert_eq!(doc.children(div).count(), 1);
    }

    #[test]
    fn insert_out_of_bounds() {
        let (mut doc, div, _, _) = sample();
        let span = doc.create_element("span");
        let err = doc.insert_at(div, 5, span).unwrap_err();
        assert_eq!(err, DomError::IndexOutOfBounds { index: 5, len: 1 });
        // nothing moved
        assert_eq!(doc.parent(span), None);
        assert_eq!(doc.children(div).count(), 1);
    }

    #[test]
    fn insert_into_own_descendant_fails_fast() {
        let (mut doc, div, a, _) = sample();
        assert_eq!(doc.insert_at(a, 0, div), Err(DomError::HierarchyError));
        assert_eq!(doc.insert_at(div, 0, div), Err(DomError::HierarchyError));
        assert_eq!(doc.parent(a), Some(div));
    }

    #[test]
    fn remove_from_wrong_parent() {
        let (mut doc, div, a, text) = sample();
        assert_eq!(doc.remove_from(div, text), Err(DomError::ChildNotFound));
        doc.remove_from(div, a).unwrap();
        assert_eq!(doc.parent(a), None);
        assert_eq!(doc.children(div).count(), 0);
    }

    #[test]
    fn replace_at_detaches_old_child() {
        let (mut doc, div, a, _) = sample();
        let span = doc.create_element("span");
        doc.replace_at(div, 0, span).unwrap();
        assert_eq!(doc.parent(span), Some(div));
        assert_eq!(doc.parent(a), None);
        // old child is detached, not decomposed
        assert!(doc.get(a).is_some());
    }

    #[test]
    fn decompose_makes_subtree_unreachable() {
        let (mut doc, div, a, text) = sample();
        doc.decompose(a).unwrap();
        assert!(doc.get(a).is_none());
        assert!(doc.get(text).is_none());
        assert_eq!(doc.children(div).count(), 0);
        assert!(!doc.descendants(doc.root()).any(|n| n == a));
        assert_eq!(doc.decompose(a), Err(DomError::StaleHandle));
    }

    #[test]
    fn contains_walks_ancestors() {
        let (doc, div, a, text) = sample();
        assert!(doc.contains(div, text));
        assert!(doc.contains(doc.root(), a));
        assert!(!doc.contains(a, div));
        assert!(!doc.contains(div, div));
    }

    #[test]
    fn text_nodes_cannot_hold_children() {
        let (mut doc, _, _, text) = sample();
        let span = doc.create_element("span");
        assert_eq!(doc.insert_at(text, 0, span), Err(DomError::NotAnElement));
    }

    #[test]
    fn created_tags_are_lowercased() {
        let mut doc = Document::new();
        let div = doc.create_element("DIV");
        assert_eq!(doc.tag(div), Some("div"));
    }
}
