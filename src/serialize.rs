//! HTML5-correct serialization.
//!
//! - Void elements never get end tags
//! - Text content is escaped; attribute values are escaped and double-quoted
//! - Raw text elements (script, style) are not escaped
//! - RCDATA elements (title, textarea) escape only `&` and `<`
//! - The invisible document node serializes as its children

use indextree::NodeId;

use crate::arena::{Document, ElementData, NodeKind};

/// HTML5 void elements - these never have end tags.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Raw text elements - content is not escaped.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// RCDATA elements - only `&` and `<` are escaped.
const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

fn is_rcdata_element(tag: &str) -> bool {
    RCDATA_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

impl Document {
    /// Serialize a node and its subtree to HTML (the node's "outer HTML").
    pub fn serialize(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(&mut out, id);
        out
    }

    /// Serialize only a node's children (its "inner HTML").
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(&mut out, child);
        }
        out
    }

    /// Serialize the whole document, DOCTYPE included when one was parsed.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(doctype) = &self.doctype {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push('>');
        }
        self.write_node(&mut out, self.root());
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Document => {
                for child in self.children(id) {
                    self.write_node(out, child);
                }
            }
            NodeKind::Element(elem) => {
                self.write_element(out, id, elem);
            }
            NodeKind::Text(text) => {
                escape_text(out, text);
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }

    fn write_element(&self, out: &mut String, id: NodeId, elem: &ElementData) {
        let tag = elem.tag.as_str();

        out.push('<');
        out.push_str(tag);
        for (name, value) in &elem.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attr(out, value);
            out.push('"');
        }
        out.push('>');

        if is_void_element(tag) {
            return;
        }

        if is_raw_text_element(tag) {
            for child in self.children(id) {
                if let Some(node) = self.get(child)
                    && let NodeKind::Text(text) = &node.kind
                {
                    out.push_str(text);
                }
            }
        } else if is_rcdata_element(tag) {
            for child in self.children(id) {
                if let Some(node) = self.get(child)
                    && let NodeKind::Text(text) = &node.kind
                {
                    escape_rcdata(out, text);
                }
            }
        } else {
            for child in self.children(id) {
                self.write_node(out, child);
            }
        }

        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_rcdata(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn simple_element() {
        let doc = parse("<html><body><div>Hello</div></body></html>");
        let body = doc.body().unwrap();
        assert_eq!(doc.inner_html(body), "<div>Hello</div>");
    }

    #[test]
    fn attributes_in_source_order() {
        let doc = parse(r#"<html><body><div class="c" id="m">x</div></body></html>"#);
        let body = doc.body().unwrap();
        assert_eq!(doc.inner_html(body), r#"<div class="c" id="m">x</div>"#);
    }

    #[test]
    fn text_escaping() {
        let doc = parse("<html><body><div>&lt;script&gt; &amp; \"quotes\"</div></body></html>");
        let body = doc.body().unwrap();
        assert_eq!(
            doc.inner_html(body),
            "<div>&lt;script&gt; &amp; \"quotes\"</div>"
        );
    }

    #[test]
    fn attribute_escaping() {
        let mut doc = parse("<html><body><div>x</div></body></html>");
        let body = doc.body().unwrap();
        let div = doc.children(body).next().unwrap();
        doc.set_attr(div, "title", "say \"hi\" & go").unwrap();
        assert_eq!(
            doc.serialize(div),
            r#"<div title="say &quot;hi&quot; &amp; go">x</div>"#
        );
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let doc = parse(r#"<html><body><br><img src="a.png"></body></html>"#);
        let body = doc.body().unwrap();
        assert_eq!(doc.inner_html(body), r#"<br><img src="a.png">"#);
    }

    #[test]
    fn rcdata_escapes_amp_and_lt_only() {
        let mut doc = parse("<html><head><title></title></head><body></body></html>");
        let title = doc.select_one(doc.root(), "title").unwrap().unwrap();
        doc.set_text_content(title, "a < b > c & d").unwrap();
        assert_eq!(doc.serialize(title), "<title>a &lt; b > c &amp; d</title>");
    }

    #[test]
    fn comment_round_trip() {
        let doc = parse("<html><body><!-- note --></body></html>");
        let body = doc.body().unwrap();
        assert_eq!(doc.inner_html(body), "<!-- note -->");
    }

    #[test]
    fn whole_document_includes_doctype() {
        let doc = parse("<!DOCTYPE html><html><head></head><body>x</body></html>");
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html><html><head></head><body>x</body></html>"
        );
    }
}
