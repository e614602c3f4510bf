//! Tree builder and serializer
//!
//! Builds a forgiving node tree from [`Tokenizer`] output. Unmatched end tags
//! are dropped and open elements are closed implicitly at end of input, which
//! is enough for pages whose resources are all we care about.

use super::tokenizer::{is_raw_text, is_void, Attribute, Token, Tokenizer};
use std::fmt::Write;

/// A node in the parsed tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    Doctype(String),
}

/// An element with its attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Attribute lookup. `Some(None)` means present without a value.
    pub fn attr(&self, name: &str) -> Option<Option<&str>> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref())
    }

    /// Attribute value, empty string for bare attributes
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attr(name).map(|v| v.unwrap_or(""))
    }

    /// Concatenated text of direct text children
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A parsed page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    /// Parse markup into a document
    pub fn parse(markup: &str) -> Self {
        let mut builder = TreeBuilder::default();
        for token in Tokenizer::new(markup) {
            builder.process(token);
        }
        Self {
            nodes: builder.finish(),
        }
    }

    /// Serialized markup of what belongs in an application's container.
    ///
    /// With a `<body>` this is the body's children. Without one it is the
    /// children of `<html>` (or the top-level nodes) minus any `<head>` and
    /// doctype.
    pub fn body_markup(&self) -> String {
        if let Some(body) = find_element(&self.nodes, "body") {
            return serialize(&body.children);
        }
        let scope = match self.nodes.iter().find_map(|n| match n {
            Node::Element(e) if e.name == "html" => Some(&e.children),
            _ => None,
        }) {
            Some(children) => children,
            None => &self.nodes,
        };
        let kept: Vec<Node> = scope
            .iter()
            .filter(|n| !matches!(n, Node::Element(e) if e.name == "head"))
            .filter(|n| !matches!(n, Node::Doctype(_)))
            .cloned()
            .collect();
        serialize(&kept)
    }
}

fn find_element<'a>(nodes: &'a [Node], name: &str) -> Option<&'a Element> {
    nodes.iter().find_map(|n| match n {
        Node::Element(e) if e.name == name => Some(e),
        Node::Element(e) => find_element(&e.children, name),
        _ => None,
    })
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn close_top(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
    }

    fn process(&mut self, token: Token) {
        match token {
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let element = Element {
                    name,
                    attributes,
                    children: Vec::new(),
                };
                if self_closing || is_void(&element.name) {
                    self.append(Node::Element(element));
                } else {
                    self.open.push(element);
                }
            }
            Token::EndTag { name } => {
                if let Some(depth) = self.open.iter().rposition(|e| e.name == name) {
                    while self.open.len() > depth {
                        self.close_top();
                    }
                }
            }
            Token::Text(text) => self.append(Node::Text(text)),
            Token::Comment(text) => self.append(Node::Comment(text)),
            Token::Doctype(text) => self.append(Node::Doctype(text)),
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.open.is_empty() {
            self.close_top();
        }
        self.root
    }
}

/// Serialize nodes back to markup
pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

/// Escape a value for use inside double-quoted attribute syntax
pub fn escape_attr(value: &str) -> String {
    value.replace('"', "&quot;")
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text(t) => out.push_str(t),
        Node::Comment(c) => {
            let _ = write!(out, "<!--{c}-->");
        }
        Node::Doctype(d) => {
            let _ = write!(out, "<!{d}>");
        }
        Node::Element(e) => {
            out.push('<');
            out.push_str(&e.name);
            for attr in &e.attributes {
                out.push(' ');
                out.push_str(&attr.name);
                if let Some(value) = &attr.value {
                    let _ = write!(out, "=\"{}\"", escape_attr(value));
                }
            }
            out.push('>');
            if is_void(&e.name) {
                return;
            }
            if is_raw_text(&e.name) {
                out.push_str(&e.text_content());
            } else {
                for child in &e.children {
                    write_node(out, child);
                }
            }
            let _ = write!(out, "</{}>", e.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_children_only() {
        let doc = Document::parse(
            "<!DOCTYPE html><html><head><title>t</title></head>\
             <body><div id=\"app\">hi</div></body></html>",
        );
        assert_eq!(doc.body_markup(), "<div id=\"app\">hi</div>");
    }

    #[test]
    fn test_fragment_without_body_drops_head() {
        let doc = Document::parse("<head><meta charset=utf-8></head><p>one</p><p>two</p>");
        assert_eq!(doc.body_markup(), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let doc = Document::parse("<div><span>a</div></em><p>b");
        assert_eq!(serialize(&doc.nodes), "<div><span>a</span></div><p>b</p>");
    }

    #[test]
    fn test_bare_attribute_and_quote_escape() {
        let doc = Document::parse(r#"<script global data-x='say "hi"'></script>"#);
        assert_eq!(
            serialize(&doc.nodes),
            r#"<script global data-x="say &quot;hi&quot;"></script>"#
        );
        let Node::Element(script) = &doc.nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(script.attr("global"), Some(None));
        assert_eq!(script.attr_value("global"), Some(""));
        assert_eq!(script.attr("src"), None);
    }
}
