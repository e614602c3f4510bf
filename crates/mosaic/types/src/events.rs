//! Event types for Mosaic observability
//!
//! Events provide a unified stream of lifecycle and reconciliation activity.
//! Mount batches are not joined by the pass that starts them, so the event
//! stream is where their failures surface.

use crate::ids::{AppName, PassId};
use crate::lifecycle::LifecycleHook;
use crate::status::AppStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all Mosaic events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MosaicEventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// The actual event
    pub event: MosaicEvent,
}

impl MosaicEventEnvelope {
    pub fn new(event: MosaicEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            event,
        }
    }
}

/// What started a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassTrigger {
    Start,
    Push,
    Replace,
    Pop,
    HashChange,
    Manual,
}

/// Kind of resource placed into the host document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Inline `<style>`
    Style,
    /// `<link rel="stylesheet">`
    Stylesheet,
    /// `<script>`
    Script,
}

/// Mosaic events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MosaicEvent {
    /// Application added to the registry
    ApplicationRegistered { app: AppName },

    /// Lifecycle status changed
    StatusChanged {
        app: AppName,
        from: AppStatus,
        to: AppStatus,
    },

    /// A lifecycle phase failed
    LifecycleFailed {
        app: AppName,
        hook: LifecycleHook,
        reason: String,
    },

    /// A resource node was appended to the host document head
    ResourceInjected {
        app: AppName,
        kind: ResourceKind,
        url: Option<String>,
        global: bool,
    },

    /// Reconciliation pass started
    PassStarted { pass_id: PassId, trigger: PassTrigger },

    /// Reconciliation pass finished; mounts may still be settling
    PassFinished {
        pass_id: PassId,
        unmounted: Vec<AppName>,
        bootstrapped: Vec<AppName>,
        mounting: Vec<AppName>,
    },

    /// Reconciliation pass aborted by a failed batch
    PassFailed { pass_id: PassId, reason: String },
}
