//! Which endpoints are public, and what that implies.
//!
//! Public endpoints are called without the bearer credential and, for reads,
//! may be served from the short-lived response cache. Everything not listed
//! is private: credential attached, never cached.

use crate::domain::Method;
use std::borrow::Cow;

/// Which methods a public rule covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicScope {
    /// Only GET is public; writes to the same path stay private.
    ReadOnly,
    AllMethods,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRule {
    pub prefix: String,
    pub scope: PublicScope,
    pub cacheable: bool,
}

impl EndpointRule {
    pub fn new(prefix: impl Into<String>, scope: PublicScope, cacheable: bool) -> Self {
        Self {
            prefix: prefix.into(),
            scope,
            cacheable,
        }
    }

    fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || self.prefix.ends_with('/'),
            None => false,
        }
    }

    fn covers(&self, method: Method) -> bool {
        match self.scope {
            PublicScope::ReadOnly => method.is_read(),
            PublicScope::AllMethods => true,
        }
    }
}

/// Resolved treatment for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointPolicy {
    pub attach_credentials: bool,
    pub cacheable: bool,
}

impl EndpointPolicy {
    pub const PRIVATE: EndpointPolicy = EndpointPolicy {
        attach_credentials: true,
        cacheable: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    rules: Vec<EndpointRule>,
}

impl PolicyTable {
    pub fn new(rules: Vec<EndpointRule>) -> Self {
        Self { rules }
    }

    /// Every endpoint private.
    pub fn private_only() -> Self {
        Self::new(Vec::new())
    }

    /// The registry's public surface: site listings, statistics and public
    /// education content are cacheable reads; sign-in is public but never cached.
    pub fn heritage_defaults() -> Self {
        Self::new(vec![
            EndpointRule::new("/api/heritage-sites", PublicScope::ReadOnly, true),
            EndpointRule::new("/api/statistics", PublicScope::ReadOnly, true),
            EndpointRule::new("/api/education/public", PublicScope::ReadOnly, true),
            EndpointRule::new("/api/public", PublicScope::ReadOnly, true),
            EndpointRule::new("/api/auth/login", PublicScope::AllMethods, false),
            EndpointRule::new("/api/auth/register", PublicScope::AllMethods, false),
        ])
    }

    pub fn rules(&self) -> &[EndpointRule] {
        &self.rules
    }

    pub fn with_rule(mut self, rule: EndpointRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Longest matching prefix wins.
    pub fn resolve(&self, method: Method, url: &str) -> EndpointPolicy {
        let url = canonical_path(url);
        let path = path_of(&url);
        let rule = self
            .rules
            .iter()
            .filter(|rule| rule.matches(path))
            .max_by_key(|rule| rule.prefix.len());

        match rule {
            Some(rule) if rule.covers(method) => EndpointPolicy {
                attach_credentials: false,
                cacheable: rule.cacheable && method.is_read(),
            },
            _ => EndpointPolicy::PRIVATE,
        }
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::heritage_defaults()
    }
}

/// The one spelling of a request target: absolute URLs as given, relative
/// paths with a leading `/`. `api/x` and `/api/x` name the same endpoint.
pub fn canonical_path(url: &str) -> Cow<'_, str> {
    if url.starts_with('/') || url.starts_with("http://") || url.starts_with("https://") {
        Cow::Borrowed(url)
    } else {
        Cow::Owned(format!("/{}", url))
    }
}

/// Path part of a relative or absolute URL, without query or fragment.
pub fn path_of(url: &str) -> &str {
    let without_scheme = match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "/",
            }
        }
        None => url,
    };
    let end = without_scheme
        .find(['?', '#'])
        .unwrap_or(without_scheme.len());
    &without_scheme[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_contents() {
        let table = PolicyTable::heritage_defaults();
        let cacheable: Vec<&str> = table
            .rules()
            .iter()
            .filter(|r| r.cacheable)
            .map(|r| r.prefix.as_str())
            .collect();
        assert_eq!(
            cacheable,
            vec!["/api/heritage-sites", "/api/statistics", "/api/education/public", "/api/public"]
        );
    }

    #[test]
    fn test_public_reads_skip_credentials_and_cache() {
        let table = PolicyTable::heritage_defaults();
        for path in [
            "/api/heritage-sites",
            "/api/heritage-sites/filter-options",
            "/api/heritage-sites?page=0",
            "/api/statistics/summary",
        ] {
            assert_eq!(
                table.resolve(Method::Get, path),
                EndpointPolicy {
                    attach_credentials: false,
                    cacheable: true
                },
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_writes_to_read_only_public_paths_are_private() {
        let table = PolicyTable::heritage_defaults();
        assert_eq!(
            table.resolve(Method::Post, "/api/heritage-sites"),
            EndpointPolicy::PRIVATE
        );
        assert_eq!(
            table.resolve(Method::Delete, "/api/heritage-sites/12"),
            EndpointPolicy::PRIVATE
        );
    }

    #[test]
    fn test_login_is_public_but_not_cached() {
        let table = PolicyTable::heritage_defaults();
        assert_eq!(
            table.resolve(Method::Post, "/api/auth/login"),
            EndpointPolicy {
                attach_credentials: false,
                cacheable: false
            }
        );
    }

    #[test]
    fn test_prefix_respects_segment_boundaries() {
        let table = PolicyTable::heritage_defaults();
        assert_eq!(
            table.resolve(Method::Get, "/api/heritage-sites-admin"),
            EndpointPolicy::PRIVATE
        );
        assert_eq!(table.resolve(Method::Get, "/api/users"), EndpointPolicy::PRIVATE);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = PolicyTable::heritage_defaults().with_rule(EndpointRule::new(
            "/api/heritage-sites/drafts",
            PublicScope::ReadOnly,
            false,
        ));
        assert_eq!(
            table.resolve(Method::Get, "/api/heritage-sites/drafts/4"),
            EndpointPolicy {
                attach_credentials: false,
                cacheable: false
            }
        );
    }

    #[test]
    fn test_relative_spelling_resolves_like_rooted() {
        let table = PolicyTable::heritage_defaults();
        assert_eq!(
            table.resolve(Method::Get, "api/heritage-sites"),
            table.resolve(Method::Get, "/api/heritage-sites")
        );
        assert_eq!(
            table.resolve(Method::Get, "api/users"),
            EndpointPolicy::PRIVATE
        );
        assert_eq!(canonical_path("api/statistics"), "/api/statistics");
        assert_eq!(canonical_path("/api/statistics"), "/api/statistics");
        assert_eq!(canonical_path("https://host/api/x"), "https://host/api/x");
    }

    #[test]
    fn test_path_of() {
        assert_eq!(path_of("https://registry.example.org/api/x?y=1"), "/api/x");
        assert_eq!(path_of("http://host"), "/");
        assert_eq!(path_of("/api/x#frag"), "/api/x");
    }
}
