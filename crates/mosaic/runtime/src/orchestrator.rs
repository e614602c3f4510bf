//! Orchestrator - the public surface
//!
//! Owns the registry, the loaded-URL sets, the global scope and the event
//! channel for one host. Separate instances share nothing.

use crate::application::AppConfig;
use crate::config::OrchestratorConfig;
use crate::lifecycle::LifecycleRunner;
use crate::navigation::{NavigationEvent, NavigationObserver};
use crate::reconciler::{PassOutcome, Reconciler};
use crate::registry::AppRegistry;
use mosaic_loader::{
    Fetcher, GlobalScope, HostDocument, HttpFetcher, MemoryDocument, ResourceLoader,
    ScriptExecutor, UnsupportedExecutor,
};
use mosaic_types::{
    AppName, AppStatus, Location, MosaicError, MosaicEvent, MosaicEventEnvelope, PassTrigger,
    Result,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};

/// Result of [`Orchestrator::start`]
#[derive(Debug)]
pub enum StartOutcome {
    /// First call: navigation hook installed and the first pass ran
    Started(PassOutcome),
    /// Already started; nothing was done
    AlreadyStarted,
}

/// Builder for [`Orchestrator`]
#[derive(Default)]
pub struct OrchestratorBuilder {
    navigation: Option<Arc<dyn NavigationObserver>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    document: Option<Arc<dyn HostDocument>>,
    executor: Option<Arc<dyn ScriptExecutor>>,
    config: OrchestratorConfig,
}

impl OrchestratorBuilder {
    /// Location source and navigation notifier (required)
    pub fn navigation(mut self, navigation: Arc<dyn NavigationObserver>) -> Self {
        self.navigation = Some(navigation);
        self
    }

    /// Defaults to [`HttpFetcher`]
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Defaults to a [`MemoryDocument`]
    pub fn document(mut self, document: Arc<dyn HostDocument>) -> Self {
        self.document = Some(document);
        self
    }

    /// Defaults to [`UnsupportedExecutor`]
    pub fn executor(mut self, executor: Arc<dyn ScriptExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let navigation = self
            .navigation
            .ok_or_else(|| MosaicError::Config("a navigation observer is required".into()))?;
        if self.config.events.buffer == 0 {
            return Err(MosaicError::Config("events.buffer must be positive".into()));
        }

        let (event_tx, _) = broadcast::channel(self.config.events.buffer);
        let registry = Arc::new(AppRegistry::new());
        let scope = Arc::new(GlobalScope::new());
        let document = self
            .document
            .unwrap_or_else(|| Arc::new(MemoryDocument::new()));

        let loader = Arc::new(ResourceLoader::new(
            self.fetcher.unwrap_or_else(|| Arc::new(HttpFetcher::new())),
            document.clone(),
            self.executor.unwrap_or_else(|| Arc::new(UnsupportedExecutor)),
            scope.clone(),
            registry.global_urls().clone(),
            self.config.loader.clone(),
            event_tx.clone(),
        ));
        let runner = Arc::new(LifecycleRunner::new(loader, event_tx.clone()));
        let reconciler = Arc::new(Reconciler::new(
            registry.clone(),
            runner.clone(),
            navigation.clone(),
            event_tx.clone(),
        ));

        Ok(Orchestrator {
            inner: Arc::new(Inner {
                registry,
                runner,
                reconciler,
                navigation,
                scope,
                document,
                started: AtomicBool::new(false),
                event_tx,
                config: self.config,
            }),
        })
    }
}

struct Inner {
    registry: Arc<AppRegistry>,
    runner: Arc<LifecycleRunner>,
    reconciler: Arc<Reconciler>,
    navigation: Arc<dyn NavigationObserver>,
    scope: Arc<GlobalScope>,
    document: Arc<dyn HostDocument>,
    started: AtomicBool,
    event_tx: broadcast::Sender<MosaicEventEnvelope>,
    config: OrchestratorConfig,
}

/// Micro-application orchestrator
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Register an application in `BEFORE_BOOTSTRAP`
    #[instrument(skip(self, config), fields(app = %config.name))]
    pub fn register_application(&self, config: AppConfig) -> Result<()> {
        let app = self.inner.registry.register(config)?;
        info!(app = %app.name(), source = ?app.source(), "Application registered");
        self.emit_event(MosaicEvent::ApplicationRegistered {
            app: app.name().clone(),
        });
        Ok(())
    }

    /// Install the navigation hook and run the first pass. Only the first
    /// call does anything.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<StartOutcome> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Ok(StartOutcome::AlreadyStarted);
        }

        let reconciler = Arc::downgrade(&self.inner.reconciler);
        self.inner
            .navigation
            .subscribe(Arc::new(move |event: &NavigationEvent| {
                on_navigation(&reconciler, event)
            }));
        info!(apps = self.inner.registry.len(), "Orchestrator started");

        self.reconcile(PassTrigger::Start)
            .await
            .map(StartOutcome::Started)
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// Run a reconciliation pass now
    pub async fn reconcile(&self, trigger: PassTrigger) -> Result<PassOutcome> {
        self.inner.reconciler.reconcile(trigger).await
    }

    /// Bootstrap one application directly
    pub async fn bootstrap(&self, name: &AppName) -> Result<()> {
        let app = self.application(name)?;
        self.inner.runner.bootstrap(&app).await
    }

    /// Mount one application directly
    pub async fn mount(&self, name: &AppName) -> Result<()> {
        let app = self.application(name)?;
        self.inner.runner.mount(&app).await
    }

    /// Unmount one application directly
    pub async fn unmount(&self, name: &AppName) -> Result<()> {
        let app = self.application(name)?;
        self.inner.runner.unmount(&app).await
    }

    pub fn status(&self, name: &AppName) -> Option<AppStatus> {
        self.inner.registry.get(name).map(|a| a.status())
    }

    /// Names and statuses in registration order
    pub fn applications(&self) -> Vec<(AppName, AppStatus)> {
        self.inner
            .registry
            .apps()
            .iter()
            .map(|a| (a.name().clone(), a.status()))
            .collect()
    }

    pub fn location(&self) -> Location {
        self.inner.navigation.location()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MosaicEventEnvelope> {
        self.inner.event_tx.subscribe()
    }

    /// Scope application scripts publish their lifecycles into
    pub fn global_scope(&self) -> &Arc<GlobalScope> {
        &self.inner.scope
    }

    pub fn document(&self) -> &Arc<dyn HostDocument> {
        &self.inner.document
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    fn application(&self, name: &AppName) -> Result<Arc<crate::application::Application>> {
        self.inner
            .registry
            .get(name)
            .ok_or_else(|| MosaicError::ApplicationNotFound(name.clone()))
    }

    fn emit_event(&self, event: MosaicEvent) {
        let _ = self.inner.event_tx.send(MosaicEventEnvelope::new(event));
    }
}

/// Spawn a pass for a navigation; the notifier does not wait for it
fn on_navigation(reconciler: &Weak<Reconciler>, event: &NavigationEvent) {
    let Some(reconciler) = reconciler.upgrade() else {
        return;
    };
    let trigger = PassTrigger::from(event.kind);
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(e) = reconciler.reconcile(trigger).await {
                    error!(error = %e, trigger = ?trigger, "Navigation-triggered pass failed");
                }
            });
        }
        Err(_) => {
            warn!(location = %event.location, "Navigation outside a tokio runtime; pass skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::History;
    use mosaic_types::{HookReturn, LifecycleFns, MemoryContainer};

    fn orchestrator(history: Arc<History>) -> Orchestrator {
        Orchestrator::builder().navigation(history).build().unwrap()
    }

    fn config(name: &str) -> AppConfig {
        AppConfig::with_loader(
            name,
            format!("/{name}"),
            Arc::new(MemoryContainer::new(name)),
            Arc::new(
                LifecycleFns::new()
                    .with_bootstrap(|_| HookReturn::ok())
                    .with_mount(|_| HookReturn::ok())
                    .with_unmount(|_| HookReturn::ok()),
            ),
        )
    }

    #[test]
    fn test_build_requires_navigation() {
        assert!(matches!(
            Orchestrator::builder().build(),
            Err(MosaicError::Config(_))
        ));
    }

    #[test]
    fn test_register_and_list() {
        let orch = orchestrator(Arc::new(History::new("/")));
        let mut events = orch.subscribe();
        orch.register_application(config("vue")).unwrap();
        assert!(orch.register_application(config("vue")).is_err());

        assert_eq!(
            orch.applications(),
            vec![(AppName::from("vue"), AppStatus::BeforeBootstrap)]
        );
        assert!(matches!(
            events.try_recv().unwrap().event,
            MosaicEvent::ApplicationRegistered { .. }
        ));
    }

    #[tokio::test]
    async fn test_start_twice_subscribes_once() {
        let history = Arc::new(History::new("/vue"));
        let orch = orchestrator(history.clone());
        orch.register_application(config("vue")).unwrap();

        let first = orch.start().await.unwrap();
        let StartOutcome::Started(outcome) = first else {
            panic!("first start must run a pass");
        };
        outcome.mounts.settled().await;

        assert!(matches!(
            orch.start().await.unwrap(),
            StartOutcome::AlreadyStarted
        ));
        assert_eq!(history.listener_count(), 1);
        assert_eq!(
            orch.status(&AppName::from("vue")),
            Some(AppStatus::Mounted)
        );
    }

    #[tokio::test]
    async fn test_direct_operations_by_name() {
        let orch = orchestrator(Arc::new(History::new("/")));
        orch.register_application(config("vue")).unwrap();
        let vue = AppName::from("vue");

        orch.bootstrap(&vue).await.unwrap();
        orch.mount(&vue).await.unwrap();
        orch.unmount(&vue).await.unwrap();
        assert_eq!(orch.status(&vue), Some(AppStatus::Unmounted));

        assert!(matches!(
            orch.mount(&AppName::from("react")).await,
            Err(MosaicError::ApplicationNotFound(_))
        ));
    }
}
