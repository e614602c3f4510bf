//! Lifecycle hook contracts
//!
//! An application supplies three hooks (bootstrap, mount, unmount). Each hook
//! receives a [`HookPayload`] and returns either an already-settled result or a
//! deferred completion; the runner normalizes both through [`HookReturn::settle`].

use crate::container::Container;
use crate::error::{BoxError, MosaicError, Result};
use crate::ids::AppName;
use crate::props::Props;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// The three lifecycle hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleHook {
    Bootstrap,
    Mount,
    Unmount,
}

impl LifecycleHook {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleHook::Bootstrap => "bootstrap",
            LifecycleHook::Mount => "mount",
            LifecycleHook::Unmount => "unmount",
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Argument passed to every hook
#[derive(Clone)]
pub struct HookPayload {
    pub props: Props,
    pub container: Arc<dyn Container>,
}

impl fmt::Debug for HookPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookPayload")
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}

pub type HookResult = std::result::Result<(), BoxError>;

/// What a hook hands back: a plain value or a deferred completion
pub enum HookReturn {
    Ready(HookResult),
    Deferred(BoxFuture<'static, HookResult>),
}

impl HookReturn {
    pub fn ok() -> Self {
        HookReturn::Ready(Ok(()))
    }

    pub fn fail(err: impl Into<BoxError>) -> Self {
        HookReturn::Ready(Err(err.into()))
    }

    pub fn deferred<F>(fut: F) -> Self
    where
        F: Future<Output = HookResult> + Send + 'static,
    {
        HookReturn::Deferred(Box::pin(fut))
    }

    /// Await the completion; ready values count as already settled
    pub async fn settle(self) -> HookResult {
        match self {
            HookReturn::Ready(result) => result,
            HookReturn::Deferred(fut) => fut.await,
        }
    }
}

impl From<()> for HookReturn {
    fn from(_: ()) -> Self {
        HookReturn::ok()
    }
}

impl From<HookResult> for HookReturn {
    fn from(result: HookResult) -> Self {
        HookReturn::Ready(result)
    }
}

pub type HookFn = Arc<dyn Fn(HookPayload) -> HookReturn + Send + Sync>;

/// Lifecycle object as exposed by an application; any hook may be missing
#[derive(Clone, Default)]
pub struct LifecycleFns {
    pub bootstrap: Option<HookFn>,
    pub mount: Option<HookFn>,
    pub unmount: Option<HookFn>,
}

impl LifecycleFns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bootstrap<F>(mut self, f: F) -> Self
    where
        F: Fn(HookPayload) -> HookReturn + Send + Sync + 'static,
    {
        self.bootstrap = Some(Arc::new(f));
        self
    }

    pub fn with_mount<F>(mut self, f: F) -> Self
    where
        F: Fn(HookPayload) -> HookReturn + Send + Sync + 'static,
    {
        self.mount = Some(Arc::new(f));
        self
    }

    pub fn with_unmount<F>(mut self, f: F) -> Self
    where
        F: Fn(HookPayload) -> HookReturn + Send + Sync + 'static,
    {
        self.unmount = Some(Arc::new(f));
        self
    }

    /// Check that all three hooks are present, in bootstrap/mount/unmount order
    pub fn validate(self, app: &AppName) -> Result<Lifecycle> {
        let missing = |hook| MosaicError::MissingLifecycle {
            app: app.clone(),
            hook,
        };
        Ok(Lifecycle {
            bootstrap: self.bootstrap.ok_or_else(|| missing(LifecycleHook::Bootstrap))?,
            mount: self.mount.ok_or_else(|| missing(LifecycleHook::Mount))?,
            unmount: self.unmount.ok_or_else(|| missing(LifecycleHook::Unmount))?,
        })
    }
}

impl fmt::Debug for LifecycleFns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleFns")
            .field("bootstrap", &self.bootstrap.is_some())
            .field("mount", &self.mount.is_some())
            .field("unmount", &self.unmount.is_some())
            .finish()
    }
}

/// Validated lifecycle: every hook is callable
#[derive(Clone)]
pub struct Lifecycle {
    bootstrap: HookFn,
    mount: HookFn,
    unmount: HookFn,
}

impl Lifecycle {
    pub fn hook(&self, hook: LifecycleHook) -> &HookFn {
        match hook {
            LifecycleHook::Bootstrap => &self.bootstrap,
            LifecycleHook::Mount => &self.mount,
            LifecycleHook::Unmount => &self.unmount,
        }
    }

    /// Invoke a hook and wait for it to settle
    pub async fn invoke(&self, hook: LifecycleHook, payload: HookPayload) -> HookResult {
        (self.hook(hook))(payload).settle().await
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lifecycle(..)")
    }
}

type LifecycleProducer =
    Arc<dyn Fn() -> BoxFuture<'static, std::result::Result<LifecycleFns, BoxError>> + Send + Sync>;

/// Lifecycle export placed in the global scope by an application's scripts
#[derive(Clone)]
pub enum LifecycleExport {
    Object(LifecycleFns),
    Producer(LifecycleProducer),
}

impl LifecycleExport {
    pub fn producer<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<LifecycleFns, BoxError>> + Send + 'static,
    {
        LifecycleExport::Producer(Arc::new(move || Box::pin(f())))
    }

    pub async fn resolve(&self) -> std::result::Result<LifecycleFns, BoxError> {
        match self {
            LifecycleExport::Object(fns) => Ok(fns.clone()),
            LifecycleExport::Producer(produce) => produce().await,
        }
    }
}

impl From<LifecycleFns> for LifecycleExport {
    fn from(fns: LifecycleFns) -> Self {
        LifecycleExport::Object(fns)
    }
}

impl fmt::Debug for LifecycleExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleExport::Object(fns) => f.debug_tuple("Object").field(fns).finish(),
            LifecycleExport::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Capability-injection source of lifecycle functions (`loadApp`)
#[async_trait]
pub trait LifecycleLoader: Send + Sync {
    async fn load(&self) -> std::result::Result<LifecycleFns, BoxError>;
}

#[async_trait]
impl LifecycleLoader for LifecycleFns {
    async fn load(&self) -> std::result::Result<LifecycleFns, BoxError> {
        Ok(self.clone())
    }
}

struct FnLoader<F>(F);

#[async_trait]
impl<F, Fut> LifecycleLoader for FnLoader<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<LifecycleFns, BoxError>> + Send + 'static,
{
    async fn load(&self) -> std::result::Result<LifecycleFns, BoxError> {
        (self.0)().await
    }
}

/// Wrap an async closure as a [`LifecycleLoader`]
pub fn loader_fn<F, Fut>(f: F) -> Arc<dyn LifecycleLoader>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<LifecycleFns, BoxError>> + Send + 'static,
{
    Arc::new(FnLoader(f))
}
