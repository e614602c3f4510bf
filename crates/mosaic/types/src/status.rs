//! Application lifecycle states
//!
//! ```text
//! BEFORE_BOOTSTRAP ──► BOOTSTRAPPED ──► BEFORE_MOUNT ──► MOUNTED ──► BEFORE_UNMOUNT ──► UNMOUNTED
//!        │                                   ▲   │                        │                 │
//!        ▼                                   │   ▼                        ▼                 │
//!  BOOTSTRAP_ERROR                           │  MOUNT_ERROR         UNMOUNT_ERROR            │
//!                                            └──────────────────────────────────────────────┘
//! ```
//!
//! The three error states are absorbing: nothing leaves them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a registered application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppStatus {
    BeforeBootstrap,
    Bootstrapped,
    BeforeMount,
    Mounted,
    BeforeUnmount,
    Unmounted,
    BootstrapError,
    MountError,
    UnmountError,
}

impl AppStatus {
    /// Every status, in declaration order
    pub const ALL: [AppStatus; 9] = [
        AppStatus::BeforeBootstrap,
        AppStatus::Bootstrapped,
        AppStatus::BeforeMount,
        AppStatus::Mounted,
        AppStatus::BeforeUnmount,
        AppStatus::Unmounted,
        AppStatus::BootstrapError,
        AppStatus::MountError,
        AppStatus::UnmountError,
    ];

    /// Whether `self → next` is an edge of the lifecycle graph
    pub fn can_transition_to(&self, next: AppStatus) -> bool {
        use AppStatus::*;
        matches!(
            (self, next),
            (BeforeBootstrap, Bootstrapped)
                | (BeforeBootstrap, BootstrapError)
                | (Bootstrapped, BeforeMount)
                | (BeforeMount, Mounted)
                | (BeforeMount, MountError)
                | (Mounted, BeforeUnmount)
                | (BeforeUnmount, Unmounted)
                | (BeforeUnmount, UnmountError)
                | (Unmounted, BeforeMount)
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            AppStatus::BootstrapError | AppStatus::MountError | AppStatus::UnmountError
        )
    }

    /// Statuses a mount may start from
    pub fn is_mountable(&self) -> bool {
        matches!(self, AppStatus::Bootstrapped | AppStatus::Unmounted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::BeforeBootstrap => "BEFORE_BOOTSTRAP",
            AppStatus::Bootstrapped => "BOOTSTRAPPED",
            AppStatus::BeforeMount => "BEFORE_MOUNT",
            AppStatus::Mounted => "MOUNTED",
            AppStatus::BeforeUnmount => "BEFORE_UNMOUNT",
            AppStatus::Unmounted => "UNMOUNTED",
            AppStatus::BootstrapError => "BOOTSTRAP_ERROR",
            AppStatus::MountError => "MOUNT_ERROR",
            AppStatus::UnmountError => "UNMOUNT_ERROR",
        }
    }
}

impl Default for AppStatus {
    fn default() -> Self {
        AppStatus::BeforeBootstrap
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
