//! Registered applications and their mutable lifecycle state
//!
//! All status changes go through [`Application::claim`] or
//! [`Application::settle`], which hold the per-application lock for the
//! check-and-set so concurrent passes cannot both start the same transition.

use mosaic_loader::LoadedUrls;
use mosaic_types::{
    ActivationRule, ActiveRule, AppName, AppStatus, Container, HookPayload, Lifecycle,
    LifecycleHook, LifecycleLoader, Location, MosaicError, Props, PropsSource, Result,
};
use parking_lot::Mutex;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// Where an application's lifecycle comes from
#[derive(Clone)]
pub enum AppSource {
    /// Markup page whose scripts publish the lifecycle into the global scope
    PageEntry(String),
    /// Caller-supplied loader yielding the lifecycle directly
    Loader(Arc<dyn LifecycleLoader>),
}

impl fmt::Debug for AppSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppSource::PageEntry(entry) => f.debug_tuple("PageEntry").field(entry).finish(),
            AppSource::Loader(_) => f.write_str("Loader(..)"),
        }
    }
}

/// Registration input
#[derive(Clone)]
pub struct AppConfig {
    pub name: AppName,
    pub active_rule: ActiveRule,
    pub container: Arc<dyn Container>,
    pub props: PropsSource,
    pub source: AppSource,
}

impl AppConfig {
    /// Application loaded from a markup page
    pub fn page_entry(
        name: impl Into<AppName>,
        active_rule: impl Into<ActiveRule>,
        container: Arc<dyn Container>,
        entry: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            active_rule: active_rule.into(),
            container,
            props: PropsSource::Empty,
            source: AppSource::PageEntry(entry.into()),
        }
    }

    /// Application whose lifecycle comes from `loader`
    pub fn with_loader(
        name: impl Into<AppName>,
        active_rule: impl Into<ActiveRule>,
        container: Arc<dyn Container>,
        loader: Arc<dyn LifecycleLoader>,
    ) -> Self {
        Self {
            name: name.into(),
            active_rule: active_rule.into(),
            container,
            props: PropsSource::Empty,
            source: AppSource::Loader(loader),
        }
    }

    pub fn props(mut self, props: impl Into<PropsSource>) -> Self {
        self.props = props.into();
        self
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("name", &self.name)
            .field("active_rule", &self.active_rule)
            .field("props", &self.props)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

struct AppState {
    status: AppStatus,
    bootstrapping: bool,
    props: Props,
    page_body: Option<String>,
    lifecycle: Option<Arc<Lifecycle>>,
}

/// A registered application
pub struct Application {
    name: AppName,
    rule: ActivationRule,
    container: Arc<dyn Container>,
    props_source: PropsSource,
    source: AppSource,
    loaded_urls: LoadedUrls,
    state: Mutex<AppState>,
}

impl Application {
    /// Build from registration input, normalizing the activation rule
    pub fn new(config: AppConfig) -> Result<Self> {
        let rule = config
            .active_rule
            .normalize()
            .map_err(|reason| MosaicError::InvalidRule {
                app: config.name.clone(),
                reason,
            })?;

        Ok(Self {
            name: config.name,
            rule,
            container: config.container,
            props_source: config.props,
            source: config.source,
            loaded_urls: LoadedUrls::new(),
            state: Mutex::new(AppState {
                status: AppStatus::BeforeBootstrap,
                bootstrapping: false,
                props: json!({}),
                page_body: None,
                lifecycle: None,
            }),
        })
    }

    pub fn name(&self) -> &AppName {
        &self.name
    }

    pub fn container(&self) -> &Arc<dyn Container> {
        &self.container
    }

    pub fn source(&self) -> &AppSource {
        &self.source
    }

    pub fn props_source(&self) -> &PropsSource {
        &self.props_source
    }

    pub fn loaded_urls(&self) -> &LoadedUrls {
        &self.loaded_urls
    }

    pub fn status(&self) -> AppStatus {
        self.state.lock().status
    }

    pub fn is_active(&self, location: &Location) -> bool {
        self.rule.matches(location)
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.state.lock().bootstrapping
    }

    pub fn page_body(&self) -> Option<String> {
        self.state.lock().page_body.clone()
    }

    pub fn props(&self) -> Props {
        self.state.lock().props.clone()
    }

    pub fn lifecycle(&self) -> Option<Arc<Lifecycle>> {
        self.state.lock().lifecycle.clone()
    }

    /// Mark a bootstrap as in flight. Fails unless `BEFORE_BOOTSTRAP` and idle.
    pub fn begin_bootstrap(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.status != AppStatus::BeforeBootstrap {
            return Err(MosaicError::InvalidState {
                app: self.name.clone(),
                operation: LifecycleHook::Bootstrap,
                current: state.status,
            });
        }
        if state.bootstrapping {
            return Err(MosaicError::AlreadyBootstrapping(self.name.clone()));
        }
        state.bootstrapping = true;
        Ok(())
    }

    /// Atomically move to `to` if the graph allows it; returns the previous status
    pub fn claim(&self, operation: LifecycleHook, to: AppStatus) -> Result<AppStatus> {
        let mut state = self.state.lock();
        let from = state.status;
        if !from.can_transition_to(to) {
            return Err(MosaicError::InvalidState {
                app: self.name.clone(),
                operation,
                current: from,
            });
        }
        state.status = to;
        Ok(from)
    }

    /// Record the outcome of an in-flight operation; returns the previous status
    pub fn settle(&self, to: AppStatus) -> AppStatus {
        let mut state = self.state.lock();
        let from = state.status;
        debug_assert!(from.can_transition_to(to), "{from} -> {to}");
        state.status = to;
        state.bootstrapping = false;
        from
    }

    /// Store lifecycle functions and resolved props; only the first call wins
    pub fn install(&self, lifecycle: Lifecycle, props: Props, page_body: Option<String>) {
        let mut state = self.state.lock();
        if state.lifecycle.is_some() {
            return;
        }
        state.lifecycle = Some(Arc::new(lifecycle));
        state.props = props;
        state.page_body = page_body;
    }

    /// `{props, container}` handed to every hook
    pub fn payload(&self) -> HookPayload {
        HookPayload {
            props: self.props(),
            container: self.container.clone(),
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("status", &self.status())
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
