//! Script evaluation and the global scope
//!
//! Fetched application scripts are handed to a [`ScriptExecutor`]. Whatever
//! engine backs it is expected to publish the application's lifecycle export
//! into the [`GlobalScope`] under [`ScriptContext::lifecycle_key`].

use dashmap::DashMap;
use mosaic_types::{AppName, BoxError, LifecycleExport};

/// Shared key/value scope that scripts publish lifecycle exports into
#[derive(Debug, Default)]
pub struct GlobalScope {
    exports: DashMap<String, LifecycleExport>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an export, replacing any previous one under `key`
    pub fn expose(&self, key: impl Into<String>, export: impl Into<LifecycleExport>) {
        self.exports.insert(key.into(), export.into());
    }

    pub fn get(&self, key: &str) -> Option<LifecycleExport> {
        self.exports.get(key).map(|e| e.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.exports.contains_key(key)
    }
}

/// What a script sees while it runs
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    pub app: &'a AppName,
    pub scope: &'a GlobalScope,
    /// Key the application's lifecycle export is expected under
    pub lifecycle_key: &'a str,
}

/// Evaluates script text
pub trait ScriptExecutor: Send + Sync {
    fn execute(&self, code: &str, context: &ScriptContext<'_>) -> Result<(), BoxError>;
}

/// Default executor for hosts without a script engine; every evaluation fails
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedExecutor;

impl ScriptExecutor for UnsupportedExecutor {
    fn execute(&self, _code: &str, context: &ScriptContext<'_>) -> Result<(), BoxError> {
        Err(format!("no script engine configured to run scripts of {}", context.app).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_types::{HookReturn, LifecycleFns};

    #[test]
    fn test_expose_and_get() {
        let scope = GlobalScope::new();
        assert!(scope.get("mosaic-app-a").is_none());
        scope.expose("mosaic-app-a", LifecycleFns::new().with_mount(|_| HookReturn::ok()));
        assert!(scope.contains("mosaic-app-a"));
        assert!(matches!(
            scope.get("mosaic-app-a"),
            Some(LifecycleExport::Object(_))
        ));
    }

    #[test]
    fn test_unsupported_executor_fails() {
        let scope = GlobalScope::new();
        let app = AppName::from("a");
        let ctx = ScriptContext {
            app: &app,
            scope: &scope,
            lifecycle_key: "mosaic-app-a",
        };
        assert!(UnsupportedExecutor.execute("1", &ctx).is_err());
    }
}
