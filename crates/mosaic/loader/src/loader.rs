//! Resource loader
//!
//! Loads an application's page: fetch, parse, extract resources, inject the
//! global ones, then run two named branches (styles, scripts) joined into a
//! single completion. Each branch applies its own results as soon as it
//! finishes: scoped styles are appended to the head, scoped scripts are
//! executed in document order.

use crate::document::{HeadNode, HostDocument};
use crate::executor::{GlobalScope, ScriptContext, ScriptExecutor};
use crate::extract::{Extractor, ResourceSource, ScriptPayload, StylePayload};
use crate::fetch::Fetcher;
use crate::markup::Document;
use crate::registry::LoadedUrls;
use futures::future::try_join_all;
use mosaic_types::{AppName, MosaicError, MosaicEvent, MosaicEventEnvelope, ResourceKind, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, info_span, instrument, Instrument};
use url::Url;

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Attribute marking a resource as global
    #[serde(default = "default_global_marker")]
    pub global_marker: String,

    /// `type` given to injected scripts that declare none
    #[serde(default = "default_script_type")]
    pub default_script_type: String,

    /// Global scope key prefix for lifecycle exports
    #[serde(default = "default_lifecycle_key_prefix")]
    pub lifecycle_key_prefix: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            global_marker: default_global_marker(),
            default_script_type: default_script_type(),
            lifecycle_key_prefix: default_lifecycle_key_prefix(),
        }
    }
}

impl LoaderConfig {
    /// Global scope key for an application's lifecycle export
    pub fn lifecycle_key(&self, app: &AppName) -> String {
        format!("{}{}", self.lifecycle_key_prefix, app)
    }
}

fn default_global_marker() -> String {
    "global".to_string()
}

fn default_script_type() -> String {
    "text/javascript".to_string()
}

fn default_lifecycle_key_prefix() -> String {
    "mosaic-app-".to_string()
}

/// Accept only absolute http(s) URLs with a host
pub fn validate_entry(entry: &str) -> Result<Url> {
    let invalid = || MosaicError::InvalidEntry {
        entry: entry.to_string(),
    };
    let has_prefix = |prefix: &str| {
        entry
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    if !has_prefix("http://") && !has_prefix("https://") {
        return Err(invalid());
    }
    let url = Url::parse(entry).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        _ => Err(invalid()),
    }
}

/// What a completed load produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedResources {
    /// Page markup left after extraction
    pub page_body: String,
    /// Scoped style texts appended to the head, in document order
    pub styles: Vec<String>,
    /// Scoped script texts executed, in document order
    pub scripts: Vec<String>,
    /// Global resources appended to the head
    pub global_injections: usize,
}

/// Loads application pages and their resources
pub struct ResourceLoader {
    fetcher: Arc<dyn Fetcher>,
    document: Arc<dyn HostDocument>,
    executor: Arc<dyn ScriptExecutor>,
    scope: Arc<GlobalScope>,
    global_urls: Arc<LoadedUrls>,
    config: LoaderConfig,
    event_tx: broadcast::Sender<MosaicEventEnvelope>,
}

impl ResourceLoader {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        document: Arc<dyn HostDocument>,
        executor: Arc<dyn ScriptExecutor>,
        scope: Arc<GlobalScope>,
        global_urls: Arc<LoadedUrls>,
        config: LoaderConfig,
        event_tx: broadcast::Sender<MosaicEventEnvelope>,
    ) -> Self {
        Self {
            fetcher,
            document,
            executor,
            scope,
            global_urls,
            config,
            event_tx,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn scope(&self) -> &Arc<GlobalScope> {
        &self.scope
    }

    pub fn global_urls(&self) -> &Arc<LoadedUrls> {
        &self.global_urls
    }

    /// Load `entry` for `app`, claiming scoped URLs in `app_urls`
    #[instrument(skip(self, app_urls), fields(app = %app))]
    pub async fn load(
        &self,
        app: &AppName,
        entry: &str,
        app_urls: &LoadedUrls,
    ) -> Result<LoadedResources> {
        let base = validate_entry(entry)?;
        let markup = self.fetcher.fetch_text(base.as_str()).await?;

        let mut page = Document::parse(&markup);
        let extracted = Extractor::new(
            &base,
            &self.config.global_marker,
            app_urls,
            &self.global_urls,
        )
        .run(&mut page.nodes);
        let page_body = page.body_markup();

        debug!(
            styles = extracted.styles.len(),
            scripts = extracted.scripts.len(),
            "Extracted resources"
        );

        let styles = self
            .style_branch(app, extracted.styles)
            .instrument(info_span!("styles", app = %app));
        let scripts = self
            .script_branch(app, extracted.scripts)
            .instrument(info_span!("scripts", app = %app));

        let ((styles, global_styles), (scripts, global_scripts)) =
            futures::try_join!(styles, scripts)?;

        info!(
            styles = styles.len(),
            scripts = scripts.len(),
            globals = global_styles + global_scripts,
            "Application resources loaded"
        );

        Ok(LoadedResources {
            page_body,
            styles,
            scripts,
            global_injections: global_styles + global_scripts,
        })
    }

    async fn style_branch(
        &self,
        app: &AppName,
        payloads: Vec<StylePayload>,
    ) -> Result<(Vec<String>, usize)> {
        let mut globals = 0;
        let mut scoped = Vec::new();
        for payload in payloads {
            if payload.global {
                let (node, url) = match payload.source {
                    ResourceSource::Url(href) => (
                        HeadNode::Stylesheet {
                            href: href.clone(),
                            global: true,
                        },
                        Some(href),
                    ),
                    ResourceSource::Inline(css) => (HeadNode::Style { css, global: true }, None),
                };
                let kind = match node {
                    HeadNode::Stylesheet { .. } => ResourceKind::Stylesheet,
                    _ => ResourceKind::Style,
                };
                self.inject(app, node, kind, url, true);
                globals += 1;
            } else {
                scoped.push(payload.source);
            }
        }

        let texts = try_join_all(scoped.iter().map(|s| self.source_text(s))).await?;
        for (css, source) in texts.iter().zip(&scoped) {
            let url = match source {
                ResourceSource::Url(url) => Some(url.clone()),
                ResourceSource::Inline(_) => None,
            };
            self.inject(
                app,
                HeadNode::Style {
                    css: css.clone(),
                    global: false,
                },
                ResourceKind::Style,
                url,
                false,
            );
        }
        Ok((texts, globals))
    }

    async fn script_branch(
        &self,
        app: &AppName,
        payloads: Vec<ScriptPayload>,
    ) -> Result<(Vec<String>, usize)> {
        let mut globals = 0;
        let mut scoped = Vec::new();
        for payload in payloads {
            if payload.global {
                let url = match &payload.source {
                    ResourceSource::Url(url) => Some(url.clone()),
                    ResourceSource::Inline(_) => None,
                };
                let node = HeadNode::Script {
                    source: payload.source,
                    script_type: payload
                        .script_type
                        .unwrap_or_else(|| self.config.default_script_type.clone()),
                    global: true,
                };
                self.inject(app, node, ResourceKind::Script, url, true);
                globals += 1;
            } else {
                scoped.push(payload.source);
            }
        }

        let texts = try_join_all(scoped.iter().map(|s| self.source_text(s))).await?;

        let key = self.config.lifecycle_key(app);
        let context = ScriptContext {
            app,
            scope: &self.scope,
            lifecycle_key: &key,
        };
        for code in &texts {
            self.executor
                .execute(code, &context)
                .map_err(|e| MosaicError::Script {
                    app: app.clone(),
                    reason: e.to_string(),
                })?;
        }
        debug!(executed = texts.len(), "Scripts executed");
        Ok((texts, globals))
    }

    async fn source_text(&self, source: &ResourceSource) -> Result<String> {
        match source {
            ResourceSource::Inline(text) => Ok(text.clone()),
            ResourceSource::Url(url) => self.fetcher.fetch_text(url).await,
        }
    }

    fn inject(
        &self,
        app: &AppName,
        node: HeadNode,
        kind: ResourceKind,
        url: Option<String>,
        global: bool,
    ) {
        debug!(kind = ?kind, url = ?url, global, "Appending to head");
        self.document.append_to_head(node);
        self.emit_event(MosaicEvent::ResourceInjected {
            app: app.clone(),
            kind,
            url,
            global,
        });
    }

    fn emit_event(&self, event: MosaicEvent) {
        let _ = self.event_tx.send(MosaicEventEnvelope::new(event));
    }
}
