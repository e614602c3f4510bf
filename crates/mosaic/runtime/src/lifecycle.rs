//! Lifecycle runner
//!
//! Drives one application through bootstrap, mount and unmount. Each operation
//! claims its starting transition atomically, awaits the application's hook
//! and records either the success status or the matching error status. Errors
//! are returned to the caller after being recorded.

use crate::application::{AppSource, Application};
use mosaic_loader::ResourceLoader;
use mosaic_types::{
    AppStatus, LifecycleFns, LifecycleHook, MosaicError, MosaicEvent, MosaicEventEnvelope,
    Result,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, instrument};

/// Runs lifecycle operations and reports their transitions
pub struct LifecycleRunner {
    loader: Arc<ResourceLoader>,
    event_tx: broadcast::Sender<MosaicEventEnvelope>,
}

impl LifecycleRunner {
    pub fn new(
        loader: Arc<ResourceLoader>,
        event_tx: broadcast::Sender<MosaicEventEnvelope>,
    ) -> Self {
        Self { loader, event_tx }
    }

    /// Acquire lifecycle functions, resolve props and run the bootstrap hook
    #[instrument(skip(self, app), fields(app = %app.name()))]
    pub async fn bootstrap(&self, app: &Application) -> Result<()> {
        app.begin_bootstrap()?;

        match self.run_bootstrap(app).await {
            Ok(()) => {
                self.record(app, AppStatus::Bootstrapped);
                Ok(())
            }
            Err(e) => {
                self.record(app, AppStatus::BootstrapError);
                self.report_failure(app, LifecycleHook::Bootstrap, &e);
                Err(e)
            }
        }
    }

    async fn run_bootstrap(&self, app: &Application) -> Result<()> {
        let (fns, page_body) = self.acquire(app).await?;
        let lifecycle = fns.validate(app.name())?;

        let props = app
            .props_source()
            .resolve()
            .await
            .map_err(|e| MosaicError::Props {
                app: app.name().clone(),
                reason: e.to_string(),
            })?;

        app.install(lifecycle, props, page_body);
        self.invoke(app, LifecycleHook::Bootstrap).await
    }

    /// Lifecycle functions plus, for page entries, the page body
    async fn acquire(&self, app: &Application) -> Result<(LifecycleFns, Option<String>)> {
        let load_failed = |e: mosaic_types::BoxError| MosaicError::LifecycleLoad {
            app: app.name().clone(),
            reason: e.to_string(),
        };

        match app.source() {
            AppSource::Loader(loader) => Ok((loader.load().await.map_err(load_failed)?, None)),
            AppSource::PageEntry(entry) => {
                let resources = self
                    .loader
                    .load(app.name(), entry, app.loaded_urls())
                    .await?;

                let key = self.loader.config().lifecycle_key(app.name());
                let export = self.loader.scope().get(&key).ok_or_else(|| {
                    MosaicError::LifecycleNotInjected {
                        app: app.name().clone(),
                        key: key.clone(),
                    }
                })?;
                let fns = export.resolve().await.map_err(load_failed)?;
                Ok((fns, Some(resources.page_body)))
            }
        }
    }

    /// Claim `BOOTSTRAPPED | UNMOUNTED -> BEFORE_MOUNT`, render and run the mount hook
    #[instrument(skip(self, app), fields(app = %app.name()))]
    pub async fn mount(&self, app: &Application) -> Result<()> {
        let from = app.claim(LifecycleHook::Mount, AppStatus::BeforeMount)?;
        self.status_changed(app, from, AppStatus::BeforeMount);

        if let Some(body) = app.page_body() {
            app.container().set_inner_html(&body);
        }

        match self.invoke(app, LifecycleHook::Mount).await {
            Ok(()) => {
                self.record(app, AppStatus::Mounted);
                Ok(())
            }
            Err(e) => {
                self.record(app, AppStatus::MountError);
                self.report_failure(app, LifecycleHook::Mount, &e);
                Err(e)
            }
        }
    }

    /// Claim `MOUNTED -> BEFORE_UNMOUNT` and run the unmount hook
    #[instrument(skip(self, app), fields(app = %app.name()))]
    pub async fn unmount(&self, app: &Application) -> Result<()> {
        let from = app.claim(LifecycleHook::Unmount, AppStatus::BeforeUnmount)?;
        self.status_changed(app, from, AppStatus::BeforeUnmount);

        match self.invoke(app, LifecycleHook::Unmount).await {
            Ok(()) => {
                self.record(app, AppStatus::Unmounted);
                Ok(())
            }
            Err(e) => {
                self.record(app, AppStatus::UnmountError);
                self.report_failure(app, LifecycleHook::Unmount, &e);
                Err(e)
            }
        }
    }

    async fn invoke(&self, app: &Application, hook: LifecycleHook) -> Result<()> {
        let lifecycle = app.lifecycle().ok_or_else(|| MosaicError::InvalidState {
            app: app.name().clone(),
            operation: hook,
            current: app.status(),
        })?;
        lifecycle
            .invoke(hook, app.payload())
            .await
            .map_err(|e| MosaicError::hook(app.name(), hook, e))
    }

    fn record(&self, app: &Application, to: AppStatus) {
        let from = app.settle(to);
        self.status_changed(app, from, to);
    }

    fn status_changed(&self, app: &Application, from: AppStatus, to: AppStatus) {
        info!(app = %app.name(), from = %from, to = %to, "Status changed");
        self.emit_event(MosaicEvent::StatusChanged {
            app: app.name().clone(),
            from,
            to,
        });
    }

    fn report_failure(&self, app: &Application, hook: LifecycleHook, err: &MosaicError) {
        error!(app = %app.name(), hook = %hook, error = %err, "Lifecycle hook failed");
        self.emit_event(MosaicEvent::LifecycleFailed {
            app: app.name().clone(),
            hook,
            reason: err.to_string(),
        });
    }

    fn emit_event(&self, event: MosaicEvent) {
        let _ = self.event_tx.send(MosaicEventEnvelope::new(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AppConfig;
    use async_trait::async_trait;
    use mosaic_loader::{
        Fetcher, GlobalScope, LoadedUrls, LoaderConfig, MemoryDocument, UnsupportedExecutor,
    };
    use mosaic_types::{
        loader_fn, BoxError, Container, ErrorKind, HookReturn, MemoryContainer, PropsSource,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoFetcher;

    #[async_trait]
    impl Fetcher for NoFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            Err(MosaicError::transport(url, "offline"))
        }
    }

    fn runner() -> (LifecycleRunner, broadcast::Receiver<MosaicEventEnvelope>) {
        let (event_tx, event_rx) = broadcast::channel(64);
        let loader = ResourceLoader::new(
            Arc::new(NoFetcher),
            Arc::new(MemoryDocument::new()),
            Arc::new(UnsupportedExecutor),
            Arc::new(GlobalScope::new()),
            Arc::new(LoadedUrls::new()),
            LoaderConfig::default(),
            event_tx.clone(),
        );
        (LifecycleRunner::new(Arc::new(loader), event_tx), event_rx)
    }

    fn counting(mounts: Arc<AtomicUsize>) -> LifecycleFns {
        LifecycleFns::new()
            .with_bootstrap(|_| HookReturn::ok())
            .with_mount(move |p| {
                p.container.set_inner_html("<p>mounted</p>");
                mounts.fetch_add(1, Ordering::SeqCst);
                HookReturn::ok()
            })
            .with_unmount(|p| {
                p.container.set_inner_html("");
                HookReturn::deferred(async { Ok(()) })
            })
    }

    fn app_with(fns: LifecycleFns) -> (Application, Arc<MemoryContainer>) {
        let container = Arc::new(MemoryContainer::new("root"));
        let app = Application::new(AppConfig::with_loader(
            "a",
            "/a",
            container.clone(),
            Arc::new(fns),
        ))
        .unwrap();
        (app, container)
    }

    #[tokio::test]
    async fn test_full_cycle() {
        let (runner, mut events) = runner();
        let mounts = Arc::new(AtomicUsize::new(0));
        let (app, container) = app_with(counting(mounts.clone()));

        runner.bootstrap(&app).await.unwrap();
        assert_eq!(app.status(), AppStatus::Bootstrapped);

        runner.mount(&app).await.unwrap();
        assert_eq!(app.status(), AppStatus::Mounted);
        assert_eq!(container.inner_html(), "<p>mounted</p>");

        runner.unmount(&app).await.unwrap();
        assert_eq!(app.status(), AppStatus::Unmounted);
        assert_eq!(container.inner_html(), "");

        runner.mount(&app).await.unwrap();
        assert_eq!(mounts.load(Ordering::SeqCst), 2);

        let mut transitions = Vec::new();
        while let Ok(envelope) = events.try_recv() {
            if let MosaicEvent::StatusChanged { from, to, .. } = envelope.event {
                assert!(from.can_transition_to(to), "{from} -> {to}");
                transitions.push(to);
            }
        }
        assert_eq!(
            transitions,
            vec![
                AppStatus::Bootstrapped,
                AppStatus::BeforeMount,
                AppStatus::Mounted,
                AppStatus::BeforeUnmount,
                AppStatus::Unmounted,
                AppStatus::BeforeMount,
                AppStatus::Mounted,
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_mount_is_bootstrap_error() {
        let (runner, _events) = runner();
        let fns = LifecycleFns::new()
            .with_bootstrap(|_| HookReturn::ok())
            .with_unmount(|_| HookReturn::ok());
        let (app, _) = app_with(fns);

        let err = runner.bootstrap(&app).await.unwrap_err();
        assert!(err.to_string().contains("\"mount\""));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(app.status(), AppStatus::BootstrapError);
    }

    #[tokio::test]
    async fn test_failing_deferred_mount() {
        let (runner, _events) = runner();
        let fns = LifecycleFns::new()
            .with_bootstrap(|_| HookReturn::ok())
            .with_mount(|_| HookReturn::deferred(async { Err("render failed".into()) }))
            .with_unmount(|_| HookReturn::ok());
        let (app, _) = app_with(fns);

        runner.bootstrap(&app).await.unwrap();
        let err = runner.mount(&app).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Hook);
        assert_eq!(app.status(), AppStatus::MountError);

        // Error states are absorbing
        assert!(matches!(
            runner.mount(&app).await,
            Err(MosaicError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_mount_before_bootstrap_rejected() {
        let (runner, _events) = runner();
        let (app, _) = app_with(counting(Arc::new(AtomicUsize::new(0))));
        let err = runner.mount(&app).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(app.status(), AppStatus::BeforeBootstrap);
    }

    #[tokio::test]
    async fn test_props_resolved_once_and_passed_to_hooks() {
        let (runner, _events) = runner();
        let produced = Arc::new(AtomicUsize::new(0));
        let counter = produced.clone();
        let container = Arc::new(MemoryContainer::new("root"));
        let fns = LifecycleFns::new()
            .with_bootstrap(|p| {
                assert_eq!(p.props, json!({ "user": "ada" }));
                HookReturn::ok()
            })
            .with_mount(|p| {
                assert_eq!(p.props, json!({ "user": "ada" }));
                HookReturn::ok()
            })
            .with_unmount(|_| HookReturn::ok());
        let app = Application::new(
            AppConfig::with_loader("a", "/a", container, Arc::new(fns)).props(
                PropsSource::producer(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(json!({ "user": "ada" })) }
                }),
            ),
        )
        .unwrap();

        runner.bootstrap(&app).await.unwrap();
        runner.mount(&app).await.unwrap();
        assert_eq!(produced.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loader_failure_reported() {
        let (runner, mut events) = runner();
        let container: Arc<dyn Container> = Arc::new(MemoryContainer::new("root"));
        let app = Application::new(AppConfig::with_loader(
            "a",
            "/a",
            container,
            loader_fn(|| async { Err::<LifecycleFns, BoxError>("chunk load failed".into()) }),
        ))
        .unwrap();

        let err = runner.bootstrap(&app).await.unwrap_err();
        assert!(matches!(err, MosaicError::LifecycleLoad { .. }));
        assert_eq!(app.status(), AppStatus::BootstrapError);

        let failed = std::iter::from_fn(|| events.try_recv().ok()).any(|e| {
            matches!(
                e.event,
                MosaicEvent::LifecycleFailed {
                    hook: LifecycleHook::Bootstrap,
                    ..
                }
            )
        });
        assert!(failed);
    }

    #[tokio::test]
    async fn test_page_entry_transport_failure() {
        let (runner, _events) = runner();
        let app = Application::new(AppConfig::page_entry(
            "a",
            "/a",
            Arc::new(MemoryContainer::new("root")),
            "http://localhost:8001/",
        ))
        .unwrap();

        let err = runner.bootstrap(&app).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(app.status(), AppStatus::BootstrapError);
    }

    #[tokio::test]
    async fn test_failing_unmount_is_absorbing() {
        let (runner, mut events) = runner();
        let fns = LifecycleFns::new()
            .with_bootstrap(|_| HookReturn::ok())
            .with_mount(|_| HookReturn::ok())
            .with_unmount(|_| HookReturn::deferred(async { Err("teardown failed".into()) }));
        let (app, _) = app_with(fns);

        runner.bootstrap(&app).await.unwrap();
        runner.mount(&app).await.unwrap();

        let err = runner.unmount(&app).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Hook);
        assert!(err.to_string().contains("teardown failed"));
        assert_eq!(app.status(), AppStatus::UnmountError);

        let failed = std::iter::from_fn(|| events.try_recv().ok()).any(|e| {
            matches!(
                e.event,
                MosaicEvent::LifecycleFailed {
                    hook: LifecycleHook::Unmount,
                    ..
                }
            )
        });
        assert!(failed);

        for result in [runner.mount(&app).await, runner.unmount(&app).await] {
            assert!(matches!(result, Err(MosaicError::InvalidState { .. })));
        }
        assert_eq!(app.status(), AppStatus::UnmountError);
    }

    #[tokio::test]
    async fn test_failing_props_producer_is_bootstrap_error() {
        let (runner, _events) = runner();
        let bootstraps = Arc::new(AtomicUsize::new(0));
        let counter = bootstraps.clone();
        let fns = LifecycleFns::new()
            .with_bootstrap(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                HookReturn::ok()
            })
            .with_mount(|_| HookReturn::ok())
            .with_unmount(|_| HookReturn::ok());
        let app = Application::new(
            AppConfig::with_loader(
                "a",
                "/a",
                Arc::new(MemoryContainer::new("root")),
                Arc::new(fns),
            )
            .props(PropsSource::producer(|| async {
                Err::<serde_json::Value, BoxError>("session expired".into())
            })),
        )
        .unwrap();

        let err = runner.bootstrap(&app).await.unwrap_err();
        assert!(matches!(err, MosaicError::Props { .. }));
        assert!(err.to_string().contains("session expired"));
        assert_eq!(app.status(), AppStatus::BootstrapError);
        assert_eq!(bootstraps.load(Ordering::SeqCst), 0);
        assert!(!app.is_bootstrapping());
    }
}
