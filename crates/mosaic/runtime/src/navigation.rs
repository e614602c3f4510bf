//! Navigation observation
//!
//! The orchestrator never reads browser globals. It asks a
//! [`NavigationObserver`] for the current [`Location`] and subscribes once to
//! be told about every history change. [`History`] is the in-memory
//! implementation used by hosts without a real browser and by tests.

use mosaic_types::{Location, PassTrigger};
use parking_lot::Mutex;
use std::sync::Arc;

/// How the location changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    Push,
    Replace,
    Pop,
    HashChange,
}

impl From<NavigationKind> for PassTrigger {
    fn from(kind: NavigationKind) -> Self {
        match kind {
            NavigationKind::Push => PassTrigger::Push,
            NavigationKind::Replace => PassTrigger::Replace,
            NavigationKind::Pop => PassTrigger::Pop,
            NavigationKind::HashChange => PassTrigger::HashChange,
        }
    }
}

/// A completed navigation; `location` is already current when listeners run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub kind: NavigationKind,
    pub location: Location,
}

pub type NavigationListener = Arc<dyn Fn(&NavigationEvent) + Send + Sync>;

/// Source of the current location and of navigation notifications
pub trait NavigationObserver: Send + Sync {
    fn location(&self) -> Location;

    fn subscribe(&self, listener: NavigationListener);
}

struct HistoryState {
    entries: Vec<Location>,
    index: usize,
}

/// In-memory session history
pub struct History {
    state: Mutex<HistoryState>,
    listeners: Mutex<Vec<NavigationListener>>,
}

impl History {
    pub fn new(initial: &str) -> Self {
        Self {
            state: Mutex::new(HistoryState {
                entries: vec![Location::parse(initial)],
                index: 0,
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Add an entry after the current one, dropping any forward entries
    pub fn push_state(&self, url: &str) {
        let location = Location::parse(url);
        {
            let mut state = self.state.lock();
            let next = state.index + 1;
            state.entries.truncate(next);
            state.entries.push(location.clone());
            state.index = next;
        }
        self.notify(NavigationKind::Push, location);
    }

    /// Overwrite the current entry
    pub fn replace_state(&self, url: &str) {
        let location = Location::parse(url);
        {
            let mut state = self.state.lock();
            let index = state.index;
            state.entries[index] = location.clone();
        }
        self.notify(NavigationKind::Replace, location);
    }

    /// Step back one entry. Returns `false` at the start of history.
    pub fn back(&self) -> bool {
        self.traverse(-1)
    }

    /// Step forward one entry. Returns `false` at the end of history.
    pub fn forward(&self) -> bool {
        self.traverse(1)
    }

    /// Change only the fragment, as a new entry
    pub fn set_hash(&self, hash: &str) {
        let location = {
            let mut state = self.state.lock();
            let location = state.entries[state.index].with_hash(hash);
            if location == state.entries[state.index] {
                return;
            }
            let next = state.index + 1;
            state.entries.truncate(next);
            state.entries.push(location.clone());
            state.index = next;
            location
        };
        self.notify(NavigationKind::HashChange, location);
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn traverse(&self, delta: isize) -> bool {
        let location = {
            let mut state = self.state.lock();
            let Some(target) = state.index.checked_add_signed(delta) else {
                return false;
            };
            if target >= state.entries.len() {
                return false;
            }
            state.index = target;
            state.entries[target].clone()
        };
        self.notify(NavigationKind::Pop, location);
        true
    }

    fn notify(&self, kind: NavigationKind, location: Location) {
        let listeners = self.listeners.lock().clone();
        let event = NavigationEvent { kind, location };
        for listener in listeners {
            listener(&event);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl NavigationObserver for History {
    fn location(&self) -> Location {
        let state = self.state.lock();
        state.entries[state.index].clone()
    }

    fn subscribe(&self, listener: NavigationListener) {
        self.listeners.lock().push(listener);
    }
}
