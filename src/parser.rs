//! HTML5 parsing via html5ever's TreeSink, building directly into the arena.
//!
//! The sink allocates nodes in the same `Arena<NodeData>` the rest of the
//! crate mutates, so parsing involves no intermediate tree. Fragment parsing
//! reuses whole-document parsing: the fragment is parsed as a document and
//! the scaffold is peeled back off, so nodes the tree builder routes to the
//! head (`<style>`, `<meta>`, `<title>`) and comments preceding the first
//! element survive alongside the body content.

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::interface::ElemName;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, QualName, parse_document};
use html5ever::{local_name, namespace_url, ns};
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use tendril::{StrTendril, TendrilSink};

use crate::arena::{Document, ElementData, Namespace, NodeData, NodeKind};

/// Parse an HTML string into a [`Document`].
///
/// Uses html5ever for browser-compatible parsing with full error recovery:
/// missing `<html>`/`<head>`/`<body>` scaffolding is created, stray tags are
/// relocated or dropped the way a browser would.
pub fn parse(html: &str) -> Document {
    let sink = ArenaSink::new();
    let tendril = StrTendril::from(html);
    parse_document(sink, Default::default()).one(tendril)
}

/// Parse markup as a fragment: returns the backing document and the ids of
/// the fragment's top-level nodes, in source order. Callers graft them into
/// their own arena with [`Document::adopt`].
///
/// The markup is parsed as a document, then the `<html>`/`<head>`/`<body>`
/// scaffold is flattened away: comments sitting at document level keep their
/// place, and the head's children come before the body's. Head-routed
/// elements always precede the first body content in the source (anything
/// after it stays in the body), so this reconstructs the original order.
pub(crate) fn parse_fragment(html: &str) -> (Document, Vec<NodeId>) {
    let doc = parse(html);
    let mut roots = Vec::new();
    for child in doc.children(doc.root()) {
        if doc.tag(child) == Some("html") {
            if let Some(head) = doc.head() {
                roots.extend(doc.children(head));
            }
            if let Some(body) = doc.body() {
                roots.extend(doc.children(body));
            }
        } else {
            roots.push(child);
        }
    }
    (doc, roots)
}

/// Owned element name wrapper for the sink.
#[derive(Debug, Clone)]
struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// TreeSink building the arena-backed document.
struct ArenaSink {
    arena: RefCell<Arena<NodeData>>,

    /// Document node (parent of `<html>`)
    document: NodeId,

    /// DOCTYPE encountered during parse
    doctype: RefCell<Option<String>>,
}

impl ArenaSink {
    fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
        });
        ArenaSink {
            arena: RefCell::new(arena),
            document,
            doctype: RefCell::new(None),
        }
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = Document;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        Document::from_parts(
            self.arena.into_inner(),
            self.document,
            self.doctype.into_inner(),
        )
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers automatically; nothing to report
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        if let NodeKind::Element(elem) = &arena[*target].get().kind {
            let ns = match elem.ns {
                Namespace::Html => ns!(html),
                Namespace::Svg => ns!(svg),
                Namespace::MathMl => ns!(mathml),
            };
            OwnedElemName(QualName {
                prefix: None,
                ns,
                local: LocalName::from(elem.tag.as_str()),
            })
        } else {
            OwnedElemName(QualName {
                prefix: None,
                ns: ns!(html),
                local: local_name!(""),
            })
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        // First occurrence wins for duplicate attribute names (browser behavior)
        let mut map = IndexMap::new();
        for attr in attrs {
            map.entry(attr.name.local.to_string())
                .or_insert_with(|| attr.value.to_string());
        }
        let elem = ElementData::with_attrs(
            name.local.to_string(),
            Namespace::from_url(name.ns.as_ref()),
            map,
        );
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Element(elem),
        })
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(text.to_string()),
        })
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions degrade to empty comments
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(String::new()),
        })
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                // Merge with a trailing text node (html5ever behavior)
                let last_child = parent.children(&arena).next_back();
                if let Some(last_child) = last_child
                    && let NodeKind::Text(existing) = &mut arena[last_child].get_mut().kind
                {
                    existing.push_str(&text);
                    return;
                }
                let text_node = arena.new_node(NodeData {
                    kind: NodeKind::Text(text.to_string()),
                });
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => {
                sibling.insert_before(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                let text_node = arena.new_node(NodeData {
                    kind: NodeKind::Text(text.to_string()),
                });
                sibling.insert_before(text_node, &mut arena);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        _prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        self.append(element, child);
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        *self.doctype.borrow_mut() = Some(name.to_string());
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let NodeKind::Element(elem) = &mut arena[*target].get_mut().kind {
            for attr in attrs {
                elem.attrs
                    .entry(attr.name.local.to_string())
                    .or_insert_with(|| attr.value.to_string());
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&arena).collect();
        for child in children {
            child.detach(&mut arena);
            new_parent.append(child, &mut arena);
        }
    }
}
