//! Application registry

use crate::application::{AppConfig, Application};
use mosaic_loader::LoadedUrls;
use mosaic_types::{AppName, MosaicError, Result};
use parking_lot::RwLock;
use std::sync::Arc;

/// Ordered collection of registered applications plus the host-wide
/// loaded-URL set for global resources
#[derive(Default)]
pub struct AppRegistry {
    apps: RwLock<Vec<Arc<Application>>>,
    global_urls: Arc<LoadedUrls>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an application in `BEFORE_BOOTSTRAP`. Names must be unique.
    pub fn register(&self, config: AppConfig) -> Result<Arc<Application>> {
        let mut apps = self.apps.write();
        if apps.iter().any(|a| a.name() == &config.name) {
            return Err(MosaicError::DuplicateApplication(config.name));
        }
        let app = Arc::new(Application::new(config)?);
        apps.push(app.clone());
        Ok(app)
    }

    /// Snapshot in registration order
    pub fn apps(&self) -> Vec<Arc<Application>> {
        self.apps.read().clone()
    }

    pub fn get(&self, name: &AppName) -> Option<Arc<Application>> {
        self.apps.read().iter().find(|a| a.name() == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.apps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.read().is_empty()
    }

    pub fn global_urls(&self) -> &Arc<LoadedUrls> {
        &self.global_urls
    }
}
