//! Host document head

use crate::extract::ResourceSource;
use crate::markup::escape_attr;
use parking_lot::Mutex;
use std::fmt;

/// A node appended to the host document head
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadNode {
    /// `<style type="text/css">`
    Style { css: String, global: bool },
    /// `<link rel="stylesheet">`
    Stylesheet { href: String, global: bool },
    /// `<script>`; inline text or `src`
    Script {
        source: ResourceSource,
        script_type: String,
        global: bool,
    },
}

impl fmt::Display for HeadNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = |global: bool| if global { " global=\"true\"" } else { "" };
        match self {
            HeadNode::Style { css, global } => {
                write!(f, "<style type=\"text/css\"{}>{css}</style>", marker(*global))
            }
            HeadNode::Stylesheet { href, global } => {
                let href = escape_attr(href);
                write!(f, "<link rel=\"stylesheet\" href=\"{href}\"{}>", marker(*global))
            }
            HeadNode::Script {
                source,
                script_type,
                global,
            } => {
                let script_type = escape_attr(script_type);
                match source {
                    ResourceSource::Url(src) => write!(
                        f,
                        "<script type=\"{script_type}\" src=\"{}\"{}></script>",
                        escape_attr(src),
                        marker(*global)
                    ),
                    ResourceSource::Inline(code) => write!(
                        f,
                        "<script type=\"{script_type}\"{}>{code}</script>",
                        marker(*global)
                    ),
                }
            }
        }
    }
}

/// The document whose head receives styles and global resources
pub trait HostDocument: Send + Sync {
    fn append_to_head(&self, node: HeadNode);
}

/// In-memory [`HostDocument`] recording appended nodes in order
#[derive(Debug, Default)]
pub struct MemoryDocument {
    head: Mutex<Vec<HeadNode>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self) -> Vec<HeadNode> {
        self.head.lock().clone()
    }

    pub fn head_markup(&self) -> String {
        self.head.lock().iter().map(ToString::to_string).collect()
    }
}

impl HostDocument for MemoryDocument {
    fn append_to_head(&self, node: HeadNode) {
        self.head.lock().push(node);
    }
}
