//! Navigation locations and activation rules

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The host page's current location, split the way a browser exposes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Path component, always starting with `/`
    pub pathname: String,

    /// Query string including the leading `?`, or empty
    pub search: String,

    /// Fragment including the leading `#`, or empty
    pub hash: String,
}

impl Location {
    /// Parse a path-like or absolute URL into its location parts.
    ///
    /// `"/a?x=1#top"` and `"https://host/a?x=1#top"` yield the same location.
    pub fn parse(url: &str) -> Self {
        let mut rest = url.trim();

        // Drop scheme and authority of absolute URLs
        if let Some(after) = strip_scheme(rest) {
            rest = match after.find(['/', '?', '#']) {
                Some(p) => &after[p..],
                None => "",
            };
        }

        let (before_hash, hash) = match rest.find('#') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        let (path, search) = match before_hash.find('?') {
            Some(i) => (&before_hash[..i], &before_hash[i..]),
            None => (before_hash, ""),
        };

        let pathname = if path.is_empty() {
            "/".to_string()
        } else if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Self {
            pathname,
            search: search.to_string(),
            hash: hash.to_string(),
        }
    }

    /// Same location with a different fragment
    pub fn with_hash(&self, hash: &str) -> Self {
        let hash = if hash.is_empty() || hash.starts_with('#') {
            hash.to_string()
        } else {
            format!("#{hash}")
        };
        Self {
            hash,
            ..self.clone()
        }
    }
}

/// Text after `scheme://` when `url` opens with a scheme
fn strip_scheme(url: &str) -> Option<&str> {
    let (scheme, after) = url.split_once("://")?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(after)
}

impl Default for Location {
    fn default() -> Self {
        Self::parse("/")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// Activation rule as supplied at registration time
#[derive(Clone)]
pub enum ActiveRule {
    /// Active when `location.pathname` equals the path exactly
    Path(String),

    /// Caller-supplied predicate
    Predicate(Arc<dyn Fn(&Location) -> bool + Send + Sync>),
}

impl ActiveRule {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Location) -> bool + Send + Sync + 'static,
    {
        ActiveRule::Predicate(Arc::new(f))
    }

    /// Normalize into a predicate over locations
    pub fn normalize(self) -> Result<ActivationRule, String> {
        match self {
            ActiveRule::Path(path) => {
                if path.trim().is_empty() {
                    return Err("path rule must not be empty".to_string());
                }
                Ok(ActivationRule::new(move |location: &Location| {
                    location.pathname == path
                }))
            }
            ActiveRule::Predicate(f) => Ok(ActivationRule(f)),
        }
    }
}

impl From<&str> for ActiveRule {
    fn from(path: &str) -> Self {
        ActiveRule::Path(path.to_string())
    }
}

impl From<String> for ActiveRule {
    fn from(path: String) -> Self {
        ActiveRule::Path(path)
    }
}

impl fmt::Debug for ActiveRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveRule::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ActiveRule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Normalized activation rule
#[derive(Clone)]
pub struct ActivationRule(Arc<dyn Fn(&Location) -> bool + Send + Sync>);

impl ActivationRule {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Location) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn matches(&self, location: &Location) -> bool {
        (self.0)(location)
    }
}

impl fmt::Debug for ActivationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActivationRule(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_path_with_query_and_hash() {
        let location = Location::parse("/shop/cart?step=2#summary");
        assert_eq!(location.pathname, "/shop/cart");
        assert_eq!(location.search, "?step=2");
        assert_eq!(location.hash, "#summary");
        assert_eq!(location.to_string(), "/shop/cart?step=2#summary");
    }

    #[test]
    fn test_parse_absolute_url() {
        let location = Location::parse("https://example.com/vue#/about");
        assert_eq!(location.pathname, "/vue");
        assert_eq!(location.hash, "#/about");

        let bare = Location::parse("http://example.com");
        assert_eq!(bare.pathname, "/");
    }

    #[test]
    fn test_parse_url_inside_query() {
        let location = Location::parse("/login?next=https://idp.example.com/cb");
        assert_eq!(location.pathname, "/login");
        assert_eq!(location.search, "?next=https://idp.example.com/cb");
        assert_eq!(location.hash, "");

        let rule = ActiveRule::from("/login").normalize().unwrap();
        assert!(rule.matches(&location));

        let in_hash = Location::parse("/app#/redirect?to=http://x.test/y");
        assert_eq!(in_hash.pathname, "/app");
        assert_eq!(in_hash.hash, "#/redirect?to=http://x.test/y");
    }

    #[test]
    fn test_with_hash() {
        let location = Location::parse("/a?x=1").with_hash("top");
        assert_eq!(location.to_string(), "/a?x=1#top");
    }

    #[test]
    fn test_path_rule_matches_pathname() {
        let rule = ActiveRule::from("/foo").normalize().unwrap();
        assert!(rule.matches(&Location::parse("/foo")));
        assert!(rule.matches(&Location::parse("/foo?q=1#x")));
        assert!(!rule.matches(&Location::parse("/bar")));
        assert!(!rule.matches(&Location::parse("/foo/bar")));
    }

    #[test]
    fn test_empty_path_rule_rejected() {
        assert!(ActiveRule::from("  ").normalize().is_err());
    }

    #[test]
    fn test_predicate_rule() {
        let rule = ActiveRule::predicate(|l| l.hash.starts_with("#/react"))
            .normalize()
            .unwrap();
        assert!(rule.matches(&Location::parse("/#/react/home")));
        assert!(!rule.matches(&Location::parse("/#/vue")));
    }

    proptest! {
        #[test]
        fn property_path_rule_is_exact_match(a in "/[a-z]{1,8}", b in "/[a-z]{1,8}") {
            let rule = ActiveRule::from(a.as_str()).normalize().unwrap();
            prop_assert_eq!(rule.matches(&Location::parse(&b)), a == b);
        }
    }
}
