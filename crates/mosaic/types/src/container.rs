//! Host elements applications mount into
//!
//! The container is shared between host and application: the host creates and
//! destroys it, the orchestrator only replaces its markup before mount.

use parking_lot::RwLock;
use std::fmt;

/// A host element an application renders into
pub trait Container: Send + Sync {
    /// Replace the element's inner markup
    fn set_inner_html(&self, markup: &str);

    /// Current inner markup
    fn inner_html(&self) -> String;
}

/// In-memory container for headless hosts and tests
#[derive(Default)]
pub struct MemoryContainer {
    id: String,
    markup: RwLock<String>,
}

impl MemoryContainer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            markup: RwLock::new(String::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Container for MemoryContainer {
    fn set_inner_html(&self, markup: &str) {
        *self.markup.write() = markup.to_string();
    }

    fn inner_html(&self) -> String {
        self.markup.read().clone()
    }
}

impl fmt::Debug for MemoryContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryContainer").field("id", &self.id).finish()
    }
}
