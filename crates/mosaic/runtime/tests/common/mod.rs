//! Shared fakes for scenario tests

#![allow(dead_code)]

use async_trait::async_trait;
use mosaic_loader::{Fetcher, ScriptContext, ScriptExecutor};
use mosaic_runtime::Orchestrator;
use mosaic_types::{
    AppName, AppStatus, BoxError, HookReturn, LifecycleFns, MosaicError, MosaicEvent,
    MosaicEventEnvelope, Result,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Serves fixed bodies and records every request
#[derive(Default)]
pub struct RecordingFetcher {
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    pub fn serve(&self, url: &str, body: &str) {
        self.pages.lock().insert(url.to_string(), body.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|r| *r == url).count()
    }
}

#[async_trait]
impl Fetcher for RecordingFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.requests.lock().push(url.to_string());
        let body = self.pages.lock().get(url).cloned();
        tokio::task::yield_now().await;
        body.ok_or_else(|| MosaicError::transport(url, "HTTP 404"))
    }
}

/// Hook call counters for one application
#[derive(Default)]
pub struct Counters {
    pub bootstrap: AtomicUsize,
    pub mount: AtomicUsize,
    pub unmount: AtomicUsize,
}

impl Counters {
    pub fn mounts(&self) -> usize {
        self.mount.load(Ordering::SeqCst)
    }

    pub fn unmounts(&self) -> usize {
        self.unmount.load(Ordering::SeqCst)
    }

    pub fn bootstraps(&self) -> usize {
        self.bootstrap.load(Ordering::SeqCst)
    }
}

/// Lifecycle whose hooks count their calls; mount renders a marker
pub fn counted(counters: Arc<Counters>) -> LifecycleFns {
    let (b, m, u) = (counters.clone(), counters.clone(), counters);
    LifecycleFns::new()
        .with_bootstrap(move |_| {
            b.bootstrap.fetch_add(1, Ordering::SeqCst);
            HookReturn::ok()
        })
        .with_mount(move |payload| {
            m.mount.fetch_add(1, Ordering::SeqCst);
            let html = payload.container.inner_html();
            payload.container.set_inner_html(&format!("{html}<!--mounted-->"));
            HookReturn::deferred(async {
                tokio::task::yield_now().await;
                Ok(())
            })
        })
        .with_unmount(move |payload| {
            u.unmount.fetch_add(1, Ordering::SeqCst);
            payload.container.set_inner_html("");
            HookReturn::ok()
        })
}

/// Executes scripts by recording them; a script containing `expose` publishes
/// the registered lifecycle for its application
#[derive(Default)]
pub struct RecordingExecutor {
    lifecycles: Mutex<HashMap<AppName, LifecycleFns>>,
    ran: Mutex<Vec<(AppName, String)>>,
}

impl RecordingExecutor {
    pub fn provide(&self, app: &str, fns: LifecycleFns) {
        self.lifecycles.lock().insert(AppName::from(app), fns);
    }

    pub fn ran(&self) -> Vec<(AppName, String)> {
        self.ran.lock().clone()
    }
}

impl ScriptExecutor for RecordingExecutor {
    fn execute(
        &self,
        code: &str,
        context: &ScriptContext<'_>,
    ) -> std::result::Result<(), BoxError> {
        self.ran.lock().push((context.app.clone(), code.to_string()));
        if code.contains("expose") {
            let fns = self
                .lifecycles
                .lock()
                .get(context.app)
                .cloned()
                .ok_or("no lifecycle provided")?;
            context.scope.expose(context.lifecycle_key, fns);
        }
        Ok(())
    }
}

/// Poll until `name` reaches `status`
pub async fn wait_for_status(orch: &Orchestrator, name: &str, status: AppStatus) {
    let name = AppName::from(name);
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while orch.status(&name) != Some(status) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(
        reached.is_ok(),
        "{name} never reached {status}, still {:?}",
        orch.status(&name)
    );
}

/// Drain already-delivered events
pub fn drain(rx: &mut broadcast::Receiver<MosaicEventEnvelope>) -> Vec<MosaicEvent> {
    std::iter::from_fn(|| rx.try_recv().ok())
        .map(|envelope| envelope.event)
        .collect()
}
