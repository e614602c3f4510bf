//! Mosaic error taxonomy

use crate::ids::AppName;
use crate::lifecycle::LifecycleHook;
use crate::status::AppStatus;
use thiserror::Error;

/// Boxed error raised by application-supplied code
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Broad classification of a [`MosaicError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input detected before any side effect (entry URL, missing hook, duplicate name)
    Validation,
    /// Network fetch of markup or a resource failed
    Transport,
    /// Application-supplied code failed
    Hook,
    /// Operation not allowed from the application's current status
    State,
}

/// Mosaic errors
#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("{entry} is not a valid url")]
    InvalidEntry { entry: String },

    #[error("Invalid activation rule for {app}: {reason}")]
    InvalidRule { app: AppName, reason: String },

    #[error("Application already registered: {0}")]
    DuplicateApplication(AppName),

    #[error("Application not found: {0}")]
    ApplicationNotFound(AppName),

    #[error("The \"{hook}\" of {app} must be a function")]
    MissingLifecycle { app: AppName, hook: LifecycleHook },

    #[error("The micro app {app} must inject its lifecycle (\"bootstrap\" \"mount\" \"unmount\") under '{key}'")]
    LifecycleNotInjected { app: AppName, key: String },

    #[error("Cannot {operation} {app} while {current}")]
    InvalidState {
        app: AppName,
        operation: LifecycleHook,
        current: AppStatus,
    },

    #[error("Bootstrap of {0} is already in flight")]
    AlreadyBootstrapping(AppName),

    #[error("Failed to fetch {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("The {hook} hook of {app} failed: {reason}")]
    Hook {
        app: AppName,
        hook: LifecycleHook,
        reason: String,
    },

    #[error("Loading the lifecycle of {app} failed: {reason}")]
    LifecycleLoad { app: AppName, reason: String },

    #[error("Props producer of {app} failed: {reason}")]
    Props { app: AppName, reason: String },

    #[error("Script evaluation for {app} failed: {reason}")]
    Script { app: AppName, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MosaicError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MosaicError::InvalidEntry { .. }
            | MosaicError::InvalidRule { .. }
            | MosaicError::DuplicateApplication(_)
            | MosaicError::ApplicationNotFound(_)
            | MosaicError::MissingLifecycle { .. }
            | MosaicError::LifecycleNotInjected { .. }
            | MosaicError::Config(_) => ErrorKind::Validation,
            MosaicError::Transport { .. } => ErrorKind::Transport,
            MosaicError::Hook { .. }
            | MosaicError::LifecycleLoad { .. }
            | MosaicError::Props { .. }
            | MosaicError::Script { .. } => ErrorKind::Hook,
            MosaicError::InvalidState { .. } | MosaicError::AlreadyBootstrapping(_) => {
                ErrorKind::State
            }
        }
    }

    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        MosaicError::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn hook(app: &AppName, hook: LifecycleHook, err: BoxError) -> Self {
        MosaicError::Hook {
            app: app.clone(),
            hook,
            reason: err.to_string(),
        }
    }
}

/// Result type for Mosaic operations
pub type Result<T> = std::result::Result<T, MosaicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_entry_message() {
        let err = MosaicError::InvalidEntry {
            entry: "ftp://x".into(),
        };
        assert_eq!(err.to_string(), "ftp://x is not a valid url");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_kinds() {
        let app = AppName::from("a");
        assert_eq!(
            MosaicError::transport("http://a/x.js", "connection refused").kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            MosaicError::hook(&app, LifecycleHook::Mount, "boom".into()).kind(),
            ErrorKind::Hook
        );
        assert_eq!(
            MosaicError::InvalidState {
                app,
                operation: LifecycleHook::Unmount,
                current: AppStatus::Bootstrapped,
            }
            .kind(),
            ErrorKind::State
        );
    }
}
