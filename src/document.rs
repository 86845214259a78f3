//! Document-level operations: the html/head/body scaffold, title access,
//! `document.write`, and the classic getElementsBy* lookups.

use indextree::NodeId;

use crate::arena::{Document, NodeKind};
use crate::error::Result;
use crate::parser::parse_fragment;
use crate::tracing_macros::debug;

impl Document {
    /// The `<html>` element, if the document has one.
    pub fn html(&self) -> Option<NodeId> {
        self.children(self.root())
            .find(|&id| self.tag(id) == Some("html"))
    }

    /// The `<head>` element, if present.
    pub fn head(&self) -> Option<NodeId> {
        let html = self.html()?;
        self.children(html).find(|&id| self.tag(id) == Some("head"))
    }

    /// The `<body>` element, if present.
    pub fn body(&self) -> Option<NodeId> {
        let html = self.html()?;
        self.children(html).find(|&id| self.tag(id) == Some("body"))
    }

    fn ensure_html(&mut self) -> NodeId {
        if let Some(html) = self.html() {
            return html;
        }
        let html = self.create_element("html");
        self.root().append(html, &mut self.arena);
        html
    }

    /// `<head>` precedes any `<body>` that may already exist.
    fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head() {
            return head;
        }
        let html = self.ensure_html();
        let head = self.create_element("head");
        html.prepend(head, &mut self.arena);
        head
    }

    fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body() {
            return body;
        }
        let html = self.ensure_html();
        let body = self.create_element("body");
        html.append(body, &mut self.arena);
        body
    }

    fn find_title(&self) -> Option<NodeId> {
        let head = self.head()?;
        self.children(head).find(|&id| self.tag(id) == Some("title"))
    }

    /// Text of the `<title>` element; empty when there is none.
    pub fn title(&self) -> String {
        match self.find_title() {
            Some(title) => self.text_content(title),
            None => String::new(),
        }
    }

    /// Set the document title, creating `<html>`, `<head>`, and `<title>`
    /// as needed.
    pub fn set_title(&mut self, text: &str) -> Result<()> {
        let title = match self.find_title() {
            Some(title) => title,
            None => {
                let head = self.ensure_head();
                let title = self.create_element("title");
                head.append(title, &mut self.arena);
                title
            }
        };
        self.set_text_content(title, text)
    }

    /// Replace the entire body content with parsed `markup`, creating the
    /// body scaffold first if the document lacks one. Everything previously
    /// in the body is destroyed, listeners included.
    pub fn write(&mut self, markup: &str) -> Result<()> {
        debug!(len = markup.len(), "document write");
        let body = self.ensure_body();
        self.clear_children(body);
        let (fragment, roots) = parse_fragment(markup);
        for src in roots {
            let id = self.adopt(&fragment, src);
            body.append(id, &mut self.arena);
        }
        Ok(())
    }

    /// First element (document order) whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .find(|&n| self.attr(n, "id") == Some(id))
    }

    /// All elements carrying `class` as a whitespace-separated class token.
    pub fn get_elements_by_class_name(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    /// All elements with the given tag name, case-insensitively. `"*"`
    /// matches every element.
    pub fn get_elements_by_tag_name(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .filter(|&n| match self.tag(n) {
                Some(t) => tag == "*" || t.eq_ignore_ascii_case(tag),
                None => false,
            })
            .collect()
    }

    /// All elements whose `name` attribute equals `name`.
    pub fn get_elements_by_name(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .filter(|&n| self.attr(n, "name") == Some(name))
            .collect()
    }

    /// Nearest ancestor that is an element; `None` at the document node or
    /// for nodes whose parent is the document itself.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        match self.get(parent)?.kind {
            NodeKind::Element(_) => Some(parent),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn scaffold_finders() {
        let doc = parse("<html><head><title>t</title></head><body><p>x</p></body></html>");
        let html = doc.html().unwrap();
        let head = doc.head().unwrap();
        let body = doc.body().unwrap();
        assert_eq!(doc.parent(head), Some(html));
        assert_eq!(doc.parent(body), Some(html));
        assert_eq!(doc.title(), "t");
    }

    #[test]
    fn set_title_builds_scaffold_from_empty() {
        let mut doc = Document::new();
        assert_eq!(doc.title(), "");
        doc.set_title("Hello").unwrap();
        assert_eq!(doc.title(), "Hello");
        assert_eq!(
            doc.to_html(),
            "<html><head><title>Hello</title></head></html>"
        );
    }

    #[test]
    fn set_title_replaces_existing() {
        let mut doc = parse("<html><head><title>old</title></head><body></body></html>");
        doc.set_title("new").unwrap();
        assert_eq!(doc.title(), "new");
        let head = doc.head().unwrap();
        assert_eq!(doc.serialize(head), "<head><title>new</title></head>");
    }

    #[test]
    fn head_is_prepended_before_existing_body() {
        let mut doc = Document::new();
        let html = doc.create_element("html");
        let body = doc.create_element("body");
        let root = doc.root();
        doc.append_child(root, html).unwrap();
        doc.append_child(html, body).unwrap();
        doc.set_title("t").unwrap();
        assert_eq!(
            doc.to_html(),
            "<html><head><title>t</title></head><body></body></html>"
        );
    }

    #[test]
    fn write_replaces_body() {
        let mut doc = parse("<html><body><p>old</p></body></html>");
        doc.write("<h1>new</h1><p>content</p>").unwrap();
        let body = doc.body().unwrap();
        assert_eq!(doc.inner_html(body), "<h1>new</h1><p>content</p>");
    }

    #[test]
    fn write_creates_body_when_missing() {
        let mut doc = Document::new();
        doc.write("<p>hi</p>").unwrap();
        assert_eq!(doc.inner_html(doc.body().unwrap()), "<p>hi</p>");
    }

    #[test]
    fn write_drops_listeners_of_replaced_content() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut doc = parse("<html><body><button>go</button></body></html>");
        let button = doc.select_one(doc.root(), "button").unwrap().unwrap();
        let hits = Rc::new(Cell::new(0));
        let hits2 = Rc::clone(&hits);
        doc.add_event_listener(
            button,
            "click",
            Rc::new(move |_| hits2.set(hits2.get() + 1)),
        )
        .unwrap();
        doc.write("<p>gone</p>").unwrap();
        doc.trigger(button, "click", &[]);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn id_and_class_and_name_lookups() {
        let doc = parse(concat!(
            "<html><body>",
            r#"<div id="main" class="wide dark"><input name="q"></div>"#,
            r#"<span class="dark"></span>"#,
            "</body></html>"
        ));
        assert!(doc.get_element_by_id("main").is_some());
        assert!(doc.get_element_by_id("missing").is_none());
        assert_eq!(doc.get_elements_by_class_name("dark").len(), 2);
        assert_eq!(doc.get_elements_by_class_name("dar").len(), 0);
        assert_eq!(doc.get_elements_by_name("q").len(), 1);
    }

    #[test]
    fn tag_lookup_is_case_insensitive_and_star_matches_all() {
        let doc = parse("<html><body><div></div><div></div><p></p></body></html>");
        assert_eq!(doc.get_elements_by_tag_name("DIV").len(), 2);
        // html, head, body, div, div, p
        assert_eq!(doc.get_elements_by_tag_name("*").len(), 6);
    }

    #[test]
    fn parent_element_skips_document() {
        let doc = parse("<html><body><p>x</p></body></html>");
        let p = doc.select_one(doc.root(), "p").unwrap().unwrap();
        let body = doc.body().unwrap();
        let html = doc.html().unwrap();
        assert_eq!(doc.parent_element(p), Some(body));
        assert_eq!(doc.parent_element(html), None);
    }
}
