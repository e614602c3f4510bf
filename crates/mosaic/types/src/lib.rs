//! Mosaic Types - Core types for micro-application orchestration
//!
//! Mosaic hosts independently-built "micro" applications inside a single host
//! page. Each application is registered with an activation rule and driven
//! through a bootstrap → mount → unmount lifecycle as navigation changes.
//!
//! ## Architectural Boundaries
//!
//! - **mosaic-types** owns: identifiers, lifecycle states, locations, hook contracts, events, errors
//! - **mosaic-loader** owns: markup parsing, resource extraction, deduplication and injection
//! - **mosaic-runtime** owns: the registry, the lifecycle runner and the reconciler
//!
//! ## Key Concepts
//!
//! - **Activation rule**: predicate over the current [`Location`]
//! - **Lifecycle hook**: bootstrap / mount / unmount supplied by the application
//! - **Reconciliation pass**: one comparison of desired vs. current application states

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod container;
pub mod error;
pub mod events;
pub mod ids;
pub mod lifecycle;
pub mod location;
pub mod props;
pub mod status;

// Re-export main types
pub use container::{Container, MemoryContainer};
pub use error::{BoxError, ErrorKind, MosaicError, Result};
pub use events::{MosaicEvent, MosaicEventEnvelope, PassTrigger, ResourceKind};
pub use ids::{AppName, PassId};
pub use lifecycle::{
    loader_fn, HookFn, HookPayload, HookResult, HookReturn, Lifecycle, LifecycleExport,
    LifecycleFns, LifecycleHook, LifecycleLoader,
};
pub use location::{ActivationRule, ActiveRule, Location};
pub use props::{Props, PropsSource};
pub use status::AppStatus;
