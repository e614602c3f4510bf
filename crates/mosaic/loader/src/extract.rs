//! Resource extraction
//!
//! Walks a parsed page depth-first, removing every `style`, `script` and
//! `link` element. Styles and scripts become payloads; URLs are claimed in the
//! application's or the global [`LoadedUrls`] before anything is fetched, so a
//! URL seen twice is loaded once.

use crate::markup::{Element, Node};
use crate::registry::LoadedUrls;
use url::Url;

/// Inline text or a URL still to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    Inline(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylePayload {
    pub global: bool,
    pub source: ResourceSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPayload {
    pub global: bool,
    pub script_type: Option<String>,
    pub source: ResourceSource,
}

/// Payloads in document order
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Extracted {
    pub styles: Vec<StylePayload>,
    pub scripts: Vec<ScriptPayload>,
}

/// Depth-first extractor over a node list
pub struct Extractor<'a> {
    base: &'a Url,
    marker: &'a str,
    app_urls: &'a LoadedUrls,
    global_urls: &'a LoadedUrls,
    found: Extracted,
}

impl<'a> Extractor<'a> {
    pub fn new(
        base: &'a Url,
        marker: &'a str,
        app_urls: &'a LoadedUrls,
        global_urls: &'a LoadedUrls,
    ) -> Self {
        Self {
            base,
            marker,
            app_urls,
            global_urls,
            found: Extracted::default(),
        }
    }

    /// Strip resources from `nodes` and return the extracted payloads
    pub fn run(mut self, nodes: &mut Vec<Node>) -> Extracted {
        self.walk(nodes);
        self.found
    }

    fn walk(&mut self, nodes: &mut Vec<Node>) {
        let taken = std::mem::take(nodes);
        for mut node in taken {
            if let Node::Element(element) = &mut node {
                match element.name.as_str() {
                    "style" => {
                        self.style(element);
                        continue;
                    }
                    "script" => {
                        self.script(element);
                        continue;
                    }
                    "link" => {
                        self.link(element);
                        continue;
                    }
                    _ => self.walk(&mut element.children),
                }
            }
            if !matches!(node, Node::Doctype(_)) {
                nodes.push(node);
            }
        }
    }

    fn is_global(&self, element: &Element) -> bool {
        match element.attr(self.marker) {
            Some(Some(value)) => value != "false",
            Some(None) => true,
            None => false,
        }
    }

    fn resolve(&self, reference: &str) -> String {
        self.base
            .join(reference)
            .map(String::from)
            .unwrap_or_else(|_| reference.to_string())
    }

    fn seen(&self, url: &str) -> bool {
        self.app_urls.contains(url) || self.global_urls.contains(url)
    }

    /// Claim in the matching scope; `false` when another claim got there first
    fn claim(&self, url: &str, global: bool) -> bool {
        if global {
            self.global_urls.claim(url)
        } else {
            self.app_urls.claim(url)
        }
    }

    fn style(&mut self, element: &Element) {
        self.found.styles.push(StylePayload {
            global: self.is_global(element),
            source: ResourceSource::Inline(element.text_content()),
        });
    }

    fn script(&mut self, element: &Element) {
        let global = self.is_global(element);
        let src = element.attr_value("src").filter(|s| !s.is_empty());
        let source = match src {
            Some(src) => {
                let url = self.resolve(src);
                if self.seen(&url) || !self.claim(&url, global) {
                    return;
                }
                ResourceSource::Url(url)
            }
            None => ResourceSource::Inline(element.text_content()),
        };
        self.found.scripts.push(ScriptPayload {
            global,
            script_type: element.attr_value("type").map(str::to_string),
            source,
        });
    }

    fn link(&mut self, element: &Element) {
        let Some(href) = element.attr_value("href").filter(|h| !h.is_empty()) else {
            return;
        };
        let url = self.resolve(href);
        if self.seen(&url) {
            return;
        }
        if element.attr_value("rel") != Some("stylesheet") {
            return;
        }
        let global = self.is_global(element);
        if !self.claim(&url, global) {
            return;
        }
        self.found.styles.push(StylePayload {
            global,
            source: ResourceSource::Url(url),
        });
    }
}
