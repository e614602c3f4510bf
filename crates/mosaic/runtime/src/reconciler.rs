//! Reconciliation passes
//!
//! A pass compares every registered application against the current location:
//!
//! 1. Mounted applications that are no longer active are unmounted.
//! 2. Active applications that were never bootstrapped are bootstrapped.
//! 3. Active applications that are bootstrapped or unmounted are mounted.
//!
//! Batches 1 and 2 run concurrently within themselves and are joined in order;
//! every member runs to completion and the first failure aborts the pass.
//! Batch 3 is spawned and handed back as a [`MountBatch`] without being
//! awaited, so a failing mount surfaces through events and logs after the
//! pass has returned.

use crate::application::Application;
use crate::lifecycle::LifecycleRunner;
use crate::navigation::NavigationObserver;
use crate::registry::AppRegistry;
use futures::future::join_all;
use mosaic_types::{
    AppName, AppStatus, LifecycleHook, MosaicError, MosaicEvent, MosaicEventEnvelope, PassId,
    PassTrigger, Result,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, instrument, Instrument};

/// Mounts started by a pass
#[derive(Debug, Default)]
pub struct MountBatch {
    handles: Vec<(AppName, JoinHandle<Result<()>>)>,
}

impl MountBatch {
    pub fn names(&self) -> Vec<AppName> {
        self.handles.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every mount to settle
    pub async fn settled(self) -> Vec<(AppName, Result<()>)> {
        let mut results = Vec::with_capacity(self.handles.len());
        for (name, handle) in self.handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(MosaicError::Hook {
                    app: name.clone(),
                    hook: LifecycleHook::Mount,
                    reason: e.to_string(),
                }),
            };
            results.push((name, result));
        }
        results
    }
}

/// Result of a completed pass
#[derive(Debug)]
pub struct PassOutcome {
    pub pass_id: PassId,
    pub trigger: PassTrigger,
    pub unmounted: Vec<AppName>,
    pub bootstrapped: Vec<AppName>,
    pub mounts: MountBatch,
}

/// Runs reconciliation passes over the registry
pub struct Reconciler {
    registry: Arc<AppRegistry>,
    runner: Arc<LifecycleRunner>,
    navigation: Arc<dyn NavigationObserver>,
    event_tx: broadcast::Sender<MosaicEventEnvelope>,
}

impl Reconciler {
    pub fn new(
        registry: Arc<AppRegistry>,
        runner: Arc<LifecycleRunner>,
        navigation: Arc<dyn NavigationObserver>,
        event_tx: broadcast::Sender<MosaicEventEnvelope>,
    ) -> Self {
        Self {
            registry,
            runner,
            navigation,
            event_tx,
        }
    }

    /// Run one pass against the observer's current location
    #[instrument(skip(self))]
    pub async fn reconcile(&self, trigger: PassTrigger) -> Result<PassOutcome> {
        let pass_id = PassId::generate();
        self.emit_event(MosaicEvent::PassStarted { pass_id, trigger });

        match self.run_pass(pass_id, trigger).await {
            Ok(outcome) => {
                self.emit_event(MosaicEvent::PassFinished {
                    pass_id,
                    unmounted: outcome.unmounted.clone(),
                    bootstrapped: outcome.bootstrapped.clone(),
                    mounting: outcome.mounts.names(),
                });
                Ok(outcome)
            }
            Err(e) => {
                error!(pass_id = %pass_id, error = %e, "Reconciliation pass failed");
                self.emit_event(MosaicEvent::PassFailed {
                    pass_id,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_pass(&self, pass_id: PassId, trigger: PassTrigger) -> Result<PassOutcome> {
        let location = self.navigation.location();
        let apps = self.registry.apps();

        let to_unmount: Vec<_> = apps
            .iter()
            .filter(|a| a.status() == AppStatus::Mounted && !a.is_active(&location))
            .cloned()
            .collect();
        let to_bootstrap: Vec<_> = apps
            .iter()
            .filter(|a| {
                a.is_active(&location)
                    && a.status() == AppStatus::BeforeBootstrap
                    && !a.is_bootstrapping()
            })
            .cloned()
            .collect();

        info!(
            pass_id = %pass_id,
            location = %location,
            unmount = to_unmount.len(),
            bootstrap = to_bootstrap.len(),
            "Reconciling"
        );

        let results = join_all(to_unmount.iter().map(|app| self.runner.unmount(app))).await;
        let unmounted = settle_batch(&to_unmount, results)?;

        let results = join_all(to_bootstrap.iter().map(|app| self.runner.bootstrap(app))).await;
        let bootstrapped = settle_batch(&to_bootstrap, results)?;

        // Bootstraps may have taken a while; mount against where we are now
        let location = self.navigation.location();
        let mounts = self.spawn_mounts(
            self.registry
                .apps()
                .into_iter()
                .filter(|a| a.is_active(&location) && a.status().is_mountable())
                .collect(),
        );

        info!(
            pass_id = %pass_id,
            unmounted = unmounted.len(),
            bootstrapped = bootstrapped.len(),
            mounting = mounts.len(),
            "Reconciliation pass finished"
        );

        Ok(PassOutcome {
            pass_id,
            trigger,
            unmounted,
            bootstrapped,
            mounts,
        })
    }

    fn spawn_mounts(&self, apps: Vec<Arc<Application>>) -> MountBatch {
        let handles = apps
            .into_iter()
            .map(|app| {
                let runner = self.runner.clone();
                let name = app.name().clone();
                let span = info_span!("mount", app = %name);
                let handle = tokio::spawn(async move { runner.mount(&app).await }.instrument(span));
                (name, handle)
            })
            .collect();
        MountBatch { handles }
    }

    fn emit_event(&self, event: MosaicEvent) {
        let _ = self.event_tx.send(MosaicEventEnvelope::new(event));
    }
}

/// Names of the batch on success, otherwise the first error in batch order
fn settle_batch(apps: &[Arc<Application>], results: Vec<Result<()>>) -> Result<Vec<AppName>> {
    let mut names = Vec::with_capacity(apps.len());
    let mut first_error = None;
    for (app, result) in apps.iter().zip(results) {
        match result {
            Ok(()) => names.push(app.name().clone()),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(_) => {}
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(names),
    }
}
