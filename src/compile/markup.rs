//! Typed XHTML construction.
//!
//! ## Why a node tree instead of string concatenation?
//!
//! Recognised text goes straight into markup, and OCR output can contain
//! anything — `&`, `<`, stray control residue from a bad scan. Splicing it
//! into format strings would reproduce the classic injection bug: one `<` in
//! a paragraph and the whole document stops parsing. Building a tree of typed
//! nodes and escaping every text and attribute value at serialisation time
//! makes malformed output impossible to express rather than merely unlikely.

use std::fmt;

/// XHTML namespace declared on every document root.
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
/// EPUB structural-semantics namespace (`epub:type` attributes).
pub const EPUB_OPS_NS: &str = "http://www.idpf.org/2007/ops";

/// Replace the five XML-reserved characters with entities.
///
/// Applied to every text node and attribute value during serialisation;
/// callers never pre-escape.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// A child of an [`Element`]: either a nested element or raw text.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XHTML element with attributes and children.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute (builder style). Attributes serialise in insertion
    /// order.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Append a child element (builder style).
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append a text node (builder style).
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Append a child element in place; for building in loops.
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    fn write_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        out.push_str(&pad);
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_xml(value));
            out.push('"');
        }
        out.push('>');

        // Elements holding only text stay on one line; anything with element
        // children becomes a block.
        let inline = self.children.iter().all(|c| matches!(c, Node::Text(_)));
        if inline {
            for child in &self.children {
                if let Node::Text(text) = child {
                    out.push_str(&escape_xml(text));
                }
            }
        } else {
            out.push('\n');
            for child in &self.children {
                match child {
                    Node::Element(el) => el.write_into(out, depth + 1),
                    Node::Text(text) => {
                        out.push_str(&"  ".repeat(depth + 1));
                        out.push_str(&escape_xml(text));
                        out.push('\n');
                    }
                }
            }
            out.push_str(&pad);
        }

        out.push_str("</");
        out.push_str(&self.name);
        out.push_str(">\n");
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_into(&mut out, 0);
        f.write_str(&out)
    }
}

/// Serialise a complete document: XML declaration, DOCTYPE, then the tree.
pub fn serialize_document(root: &Element) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<!DOCTYPE html>\n");
    root.write_into(&mut out, 0);
    out
}

/// The standard page skeleton shared by every produced document:
/// `<html>` with both namespaces, a `<head><title>` (possibly empty), and a
/// `<body>` holding `body_children`.
pub fn page_shell(title: &str, body_children: Vec<Element>) -> Element {
    let mut body = Element::new("body");
    for child in body_children {
        body.push(child);
    }
    Element::new("html")
        .attr("xmlns", XHTML_NS)
        .attr("xmlns:epub", EPUB_OPS_NS)
        .child(Element::new("head").child(Element::new("title").text(title)))
        .child(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"a & b < c > "d" 'e'"#),
            "a &amp; b &lt; c &gt; &quot;d&quot; &apos;e&apos;"
        );
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn ampersand_escapes_first() {
        // A pre-existing entity must not double-escape into garbage like
        // "&amp;amp;lt;" — but raw text containing "&lt;" is still text.
        assert_eq!(escape_xml("&lt;"), "&amp;lt;");
    }

    #[test]
    fn text_only_element_is_inline() {
        let el = Element::new("p").text("hello");
        assert_eq!(el.to_string(), "<p>hello</p>\n");
    }

    #[test]
    fn empty_element_keeps_explicit_close_tag() {
        let el = Element::new("title");
        assert_eq!(el.to_string(), "<title></title>\n");
    }

    #[test]
    fn nested_elements_indent() {
        let el = Element::new("body").child(Element::new("p").text("one"));
        assert_eq!(el.to_string(), "<body>\n  <p>one</p>\n</body>\n");
    }

    #[test]
    fn attributes_serialise_in_order_and_escape() {
        let el = Element::new("a")
            .attr("href", "x.xhtml")
            .attr("title", "Tom & Jerry");
        assert_eq!(
            el.to_string(),
            "<a href=\"x.xhtml\" title=\"Tom &amp; Jerry\"></a>\n"
        );
    }

    #[test]
    fn text_content_is_escaped() {
        let el = Element::new("p").text("1 < 2 & 3 > 2");
        assert_eq!(el.to_string(), "<p>1 &lt; 2 &amp; 3 &gt; 2</p>\n");
    }

    #[test]
    fn document_has_declaration_and_doctype() {
        let doc = serialize_document(&Element::new("html"));
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE html>\n"));
    }

    #[test]
    fn page_shell_structure() {
        let doc = serialize_document(&page_shell("", vec![Element::new("p").text("x")]));
        assert!(doc.contains("<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\">"));
        assert!(doc.contains("<title></title>"));
        assert!(doc.contains("<p>x</p>"));
        // head precedes body
        let head = doc.find("<head>").unwrap();
        let body = doc.find("<body>").unwrap();
        assert!(head < body);
    }
}
