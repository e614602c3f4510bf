//! Mosaic Runtime - Registry, lifecycle runner and reconciler
//!
//! The [`Orchestrator`] keeps an ordered registry of applications and, on
//! every navigation, runs a reconciliation pass that unmounts applications
//! whose activation rule stopped matching, bootstraps newly active ones and
//! starts mounting everything that is active and mountable.
//!
//! ```no_run
//! use mosaic_runtime::{AppConfig, History, Orchestrator};
//! use mosaic_types::MemoryContainer;
//! use std::sync::Arc;
//!
//! # async fn run() -> mosaic_types::Result<()> {
//! let history = Arc::new(History::new("/vue"));
//! let orchestrator = Orchestrator::builder().navigation(history.clone()).build()?;
//!
//! orchestrator.register_application(AppConfig::page_entry(
//!     "vue",
//!     "/vue",
//!     Arc::new(MemoryContainer::new("subapp-viewport")),
//!     "http://localhost:8001",
//! ))?;
//!
//! orchestrator.start().await?;
//! history.push_state("/react");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod application;
pub mod config;
pub mod lifecycle;
pub mod navigation;
pub mod orchestrator;
pub mod reconciler;
pub mod registry;
pub mod telemetry;

pub use application::{AppConfig, AppSource, Application};
pub use config::{EventConfig, LoggingConfig, OrchestratorConfig};
pub use lifecycle::LifecycleRunner;
pub use navigation::{
    History, NavigationEvent, NavigationKind, NavigationListener, NavigationObserver,
};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, StartOutcome};
pub use reconciler::{MountBatch, PassOutcome, Reconciler};
pub use registry::AppRegistry;
pub use telemetry::init_tracing;
