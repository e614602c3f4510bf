//! Loaded-URL registries
//!
//! One set per application plus one shared set for resources marked global.
//! Both are append-only.

use dashmap::DashSet;

/// Set of resource URLs already claimed for loading
#[derive(Debug, Default)]
pub struct LoadedUrls {
    urls: DashSet<String>,
}

impl LoadedUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Claim a URL. Returns `false` when it was already claimed.
    pub fn claim(&self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Sorted snapshot
    pub fn snapshot(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.urls.iter().map(|u| u.key().clone()).collect();
        urls.sort();
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once() {
        let urls = LoadedUrls::new();
        assert!(urls.claim("http://a/x.js"));
        assert!(!urls.claim("http://a/x.js"));
        assert!(urls.contains("http://a/x.js"));
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn test_snapshot_sorted() {
        let urls = LoadedUrls::new();
        urls.claim("http://b");
        urls.claim("http://a");
        assert_eq!(urls.snapshot(), vec!["http://a", "http://b"]);
    }
}
