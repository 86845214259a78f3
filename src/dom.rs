//! Element-level mutation: child insertion, markup injection, text content,
//! adjacent insertion, and cloning.

use std::str::FromStr;

use indextree::NodeId;

use crate::arena::{Document, NodeKind};
use crate::error::{DomError, Result};
use crate::parser::parse_fragment;
use crate::tracing_macros::debug;

/// Something that can be appended or prepended: an existing node (which is
/// relocated) or raw markup (which is parsed into fresh nodes).
#[derive(Debug, Clone, Copy)]
pub enum Content<'a> {
    Node(NodeId),
    Markup(&'a str),
}

impl From<NodeId> for Content<'_> {
    fn from(id: NodeId) -> Self {
        Content::Node(id)
    }
}

impl<'a> From<&'a str> for Content<'a> {
    fn from(markup: &'a str) -> Self {
        Content::Markup(markup)
    }
}

/// Insertion point relative to a reference element, `insertAdjacentHTML`
/// style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

impl FromStr for InsertPosition {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "beforebegin" => Ok(Self::BeforeBegin),
            "afterbegin" => Ok(Self::AfterBegin),
            "beforeend" => Ok(Self::BeforeEnd),
            "afterend" => Ok(Self::AfterEnd),
            other => Err(DomError::InvalidPosition(other.to_string())),
        }
    }
}

impl Document {
    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.node(child)?;
        self.ensure_can_contain(parent)?;
        self.ensure_no_cycle(child, parent)?;
        child.detach(&mut self.arena);
        parent.append(child, &mut self.arena);
        Ok(child)
    }

    /// Insert `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.node(child)?;
        self.ensure_can_contain(parent)?;
        self.ensure_no_cycle(child, parent)?;
        child.detach(&mut self.arena);
        parent.prepend(child, &mut self.arena);
        Ok(child)
    }

    /// Insert `new` immediately before `reference` among `parent`'s
    /// children. Fails with [`DomError::ChildNotFound`] before any mutation
    /// when `reference` is not a child of `parent`. Inserting a node before
    /// itself is a no-op.
    pub fn insert_before(&mut self, parent: NodeId, new: NodeId, reference: NodeId) -> Result<NodeId> {
        self.node(new)?;
        self.ensure_can_contain(parent)?;
        self.ensure_no_cycle(new, parent)?;
        if self.parent(reference) != Some(parent) {
            return Err(DomError::ChildNotFound);
        }
        if new == reference {
            return Ok(new);
        }
        new.detach(&mut self.arena);
        reference.insert_before(new, &mut self.arena);
        Ok(new)
    }

    /// Replace `old` with `new` among `parent`'s children. `old` is detached
    /// but not destroyed; its handle stays valid.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> Result<NodeId> {
        self.node(new)?;
        self.ensure_can_contain(parent)?;
        self.ensure_no_cycle(new, parent)?;
        if self.parent(old) != Some(parent) {
            return Err(DomError::ChildNotFound);
        }
        if new == old {
            return Ok(old);
        }
        new.detach(&mut self.arena);
        old.insert_before(new, &mut self.arena);
        old.detach(&mut self.arena);
        Ok(old)
    }

    /// Append content at the end of `parent`'s children. Markup may expand
    /// to several nodes; they keep their left-to-right order.
    pub fn append(&mut self, parent: NodeId, content: Content<'_>) -> Result<()> {
        self.ensure_can_contain(parent)?;
        match content {
            Content::Node(id) => {
                self.append_child(parent, id)?;
            }
            Content::Markup(markup) => {
                for id in self.parse_adopted(markup) {
                    parent.append(id, &mut self.arena);
                }
            }
        }
        Ok(())
    }

    /// Insert content at the start of `parent`'s children, preserving the
    /// markup's left-to-right order.
    pub fn prepend(&mut self, parent: NodeId, content: Content<'_>) -> Result<()> {
        self.ensure_can_contain(parent)?;
        match content {
            Content::Node(id) => {
                self.prepend_child(parent, id)?;
            }
            Content::Markup(markup) => {
                let mut anchor: Option<NodeId> = None;
                for id in self.parse_adopted(markup) {
                    match anchor {
                        None => parent.prepend(id, &mut self.arena),
                        Some(prev) => prev.insert_after(id, &mut self.arena),
                    }
                    anchor = Some(id);
                }
            }
        }
        Ok(())
    }

    /// Replace all of `elem`'s children with the result of parsing `markup`.
    pub fn set_inner_html(&mut self, elem: NodeId, markup: &str) -> Result<()> {
        self.element(elem)?;
        debug!(node = ?elem, len = markup.len(), "set_inner_html");
        let roots = self.parse_adopted(markup);
        self.clear_children(elem);
        for id in roots {
            elem.append(id, &mut self.arena);
        }
        Ok(())
    }

    /// Concatenated text of all text descendants, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        for id in node.descendants(&self.arena) {
            if let Some(NodeKind::Text(text)) = self.get(id).map(|n| &n.kind) {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace all of `elem`'s children with a single text node. The text
    /// node is created even for an empty string.
    pub fn set_text_content(&mut self, elem: NodeId, text: &str) -> Result<()> {
        self.element(elem)?;
        self.clear_children(elem);
        let text_node = self.create_text_node(text);
        elem.append(text_node, &mut self.arena);
        Ok(())
    }

    /// Parse `markup` and insert the resulting nodes relative to `elem`.
    /// `BeforeBegin` and `AfterEnd` require a parent.
    pub fn insert_adjacent_html(
        &mut self,
        elem: NodeId,
        position: InsertPosition,
        markup: &str,
    ) -> Result<()> {
        self.element(elem)?;
        if matches!(position, InsertPosition::BeforeBegin | InsertPosition::AfterEnd)
            && self.parent(elem).is_none()
        {
            return Err(DomError::NoParent);
        }
        let roots = self.parse_adopted(markup);
        match position {
            InsertPosition::BeforeBegin => {
                for id in roots {
                    elem.insert_before(id, &mut self.arena);
                }
            }
            InsertPosition::AfterBegin => {
                let mut anchor: Option<NodeId> = None;
                for id in roots {
                    match anchor {
                        None => elem.prepend(id, &mut self.arena),
                        Some(prev) => prev.insert_after(id, &mut self.arena),
                    }
                    anchor = Some(id);
                }
            }
            InsertPosition::BeforeEnd => {
                for id in roots {
                    elem.append(id, &mut self.arena);
                }
            }
            InsertPosition::AfterEnd => {
                let mut anchor = elem;
                for id in roots {
                    anchor.insert_after(id, &mut self.arena);
                    anchor = id;
                }
            }
        }
        Ok(())
    }

    /// Insert an existing element relative to `elem`, relocating it.
    pub fn insert_adjacent_element(
        &mut self,
        elem: NodeId,
        position: InsertPosition,
        new: NodeId,
    ) -> Result<NodeId> {
        self.element(elem)?;
        self.element(new)?;
        match position {
            InsertPosition::BeforeBegin | InsertPosition::AfterEnd => {
                let parent = self.parent(elem).ok_or(DomError::NoParent)?;
                self.ensure_no_cycle(new, parent)?;
                new.detach(&mut self.arena);
                match position {
                    InsertPosition::BeforeBegin => elem.insert_before(new, &mut self.arena),
                    _ => elem.insert_after(new, &mut self.arena),
                }
            }
            InsertPosition::AfterBegin | InsertPosition::BeforeEnd => {
                self.ensure_no_cycle(new, elem)?;
                new.detach(&mut self.arena);
                match position {
                    InsertPosition::AfterBegin => elem.prepend(new, &mut self.arena),
                    _ => elem.append(new, &mut self.arena),
                }
            }
        }
        Ok(new)
    }

    /// Copy a node. A deep clone copies the whole subtree; a shallow clone
    /// copies only the node itself. Clones are detached and carry no event
    /// listeners.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId> {
        let data = self.node(node)?.clone();
        let copy = self.arena.new_node(data);
        if deep {
            let children: Vec<NodeId> = node.children(&self.arena).collect();
            for child in children {
                let child_copy = self.clone_node(child, true)?;
                copy.append(child_copy, &mut self.arena);
            }
        }
        Ok(copy)
    }

    /// Detach `node` from its parent and destroy it together with its
    /// subtree and any event listeners.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        self.decompose(node)
    }

    /// Parse markup as a fragment and graft its top-level nodes into this
    /// arena, returning them in order.
    fn parse_adopted(&mut self, markup: &str) -> Vec<NodeId> {
        let (fragment, roots) = parse_fragment(markup);
        roots
            .into_iter()
            .map(|id| self.adopt(&fragment, id))
            .collect()
    }
}
