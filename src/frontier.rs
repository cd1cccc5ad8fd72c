//! URL normalization and the admission gate in front of the scheduler.

use crate::tables::{EXCLUDED_EXTENSIONS, RELEVANT_EXTENSIONS};
use crate::types::{NpmjackError, Result};
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

/// Why a target was not admitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("invalid target {0}")]
    Invalid(String),

    #[error("already admitted {0}")]
    Duplicate(String),

    #[error("excluded extension {0}")]
    ExcludedExtension(String),
}

/// Canonicalize a target URL.
///
/// Lowercases scheme and host, drops default ports and the fragment,
/// resolves dot segments, collapses empty path segments, sorts the query
/// and strips the trailing slash. Targets without a scheme get `https://`.
/// Only `http` and `https` are accepted.
pub fn normalize_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let mut url = Url::parse(&with_scheme)?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(NpmjackError::UnsupportedUrl(raw.to_string()));
    }

    url.set_fragment(None);

    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
    let path = format!("/{}", segments.join("/"));
    url.set_path(&path);

    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        pairs.sort();
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    let mut normalized = url.to_string();
    if url.query().is_none() && normalized.ends_with('/') {
        normalized.pop();
    }
    Ok(normalized)
}

/// Drop the query string, if any.
pub fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Dedup key of a normalized URL: query removed, then the trailing slash the
/// root path keeps while a query is attached.
fn visit_key(normalized: &str) -> String {
    let base = strip_query(normalized);
    base.strip_suffix('/').unwrap_or(base).to_string()
}

/// Lowercased extension of the last path segment.
fn last_segment_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.last()?;
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() && ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn is_excluded(url: &str) -> Option<String> {
    let ext = last_segment_extension(url)?;
    let excluded = EXCLUDED_EXTENSIONS.contains(&ext.as_str())
        && !RELEVANT_EXTENSIONS.contains(&ext.as_str());
    excluded.then_some(ext)
}

/// Visited set for one run. Single writer: only the dispatch loop admits.
#[derive(Debug, Default)]
pub struct Frontier {
    visited: HashMap<String, bool>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `raw`, mark it visited and decide whether it may be dispatched.
    ///
    /// Returns the query-stripped normalized URL on success.
    pub fn admit(&mut self, raw: &str) -> std::result::Result<String, Rejection> {
        let normalized =
            normalize_url(raw).map_err(|e| Rejection::Invalid(format!("{}: {}", raw, e)))?;
        let key = visit_key(&normalized);

        if self.visited.contains_key(&key) {
            return Err(Rejection::Duplicate(key));
        }
        self.visited.insert(key.clone(), true);

        if let Some(ext) = is_excluded(&key) {
            return Err(Rejection::ExcludedExtension(ext));
        }

        Ok(key)
    }

    /// Whether a normalized URL has already gone through `admit`.
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.get(url).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("HTTPS://Example.COM:443/a//b/./c/../d/").unwrap(),
            "https://example.com/a/b/d"
        );
        assert_eq!(
            normalize_url("http://example.com:80/app.js#frag").unwrap(),
            "http://example.com/app.js"
        );
        assert_eq!(
            normalize_url("example.com/package.json").unwrap(),
            "https://example.com/package.json"
        );
        assert_eq!(
            normalize_url("https://example.com/x?b=2&a=1").unwrap(),
            "https://example.com/x?a=1&b=2"
        );
        assert_eq!(normalize_url("https://example.com/").unwrap(), "https://example.com");
        assert_eq!(
            normalize_url("https://example.com:8443/x?").unwrap(),
            "https://example.com:8443/x"
        );
    }

    #[test]
    fn test_normalize_rejects_unsupported() {
        assert!(normalize_url("ftp://example.com/file").is_err());
        assert!(normalize_url("http://").is_err());
        assert!(normalize_url("https://exa mple.com").is_err());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "HTTPS://Example.COM:443/a//b/./c/../d/",
            "example.com",
            "http://example.com/search?q=hello world&a=%2F",
            "https://example.com/?z=1&y=2",
            "https://[::1]:8080/index.html",
            "https://example.com/%7Euser/app.js",
            "https://example.com/a/b/?",
        ] {
            let once = normalize_url(raw).unwrap();
            let twice = normalize_url(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", raw);
        }
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("https://a.com/x?a=1"), "https://a.com/x");
        assert_eq!(strip_query("https://a.com/x"), "https://a.com/x");
    }

    #[test]
    fn test_admit_deduplicates_equivalent_targets() {
        let mut frontier = Frontier::new();
        assert_eq!(
            frontier.admit("https://Example.com/app.js?v=1"),
            Ok("https://example.com/app.js".to_string())
        );
        assert!(matches!(
            frontier.admit("https://example.COM//app.js?v=2"),
            Err(Rejection::Duplicate(_))
        ));
        assert!(frontier.is_visited("https://example.com/app.js"));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_admit_root_with_query_is_duplicate() {
        let mut frontier = Frontier::new();
        assert_eq!(frontier.admit("https://example.com"), Ok("https://example.com".to_string()));
        assert!(matches!(
            frontier.admit("https://example.com/?a=1"),
            Err(Rejection::Duplicate(_))
        ));
        assert!(matches!(
            frontier.admit("HTTPS://EXAMPLE.COM:443/?utm=1#top"),
            Err(Rejection::Duplicate(_))
        ));

        let mut frontier = Frontier::new();
        let key = frontier.admit("https://example.com/?a=1").unwrap();
        assert_eq!(key, "https://example.com");
        assert_eq!(normalize_url(&key).unwrap(), key);
    }

    #[test]
    fn test_admit_excluded_extension() {
        let mut frontier = Frontier::new();
        assert_eq!(
            frontier.admit("https://example.com/logo.PNG"),
            Err(Rejection::ExcludedExtension("png".to_string()))
        );
        assert!(frontier.is_visited("https://example.com/logo.PNG"));
        assert!(frontier.admit("https://example.com/fonts/a.woff2").is_err());
        assert!(frontier.admit("https://example.com/app.js.map").is_ok());
        assert!(frontier.admit("https://example.com/yarn.lock").is_ok());
        assert!(frontier.admit("https://example.com/Dockerfile").is_ok());
        assert!(frontier.admit("https://cdn.png/index").is_ok());
    }

    #[test]
    fn test_admit_invalid() {
        let mut frontier = Frontier::new();
        assert!(matches!(frontier.admit("ftp://example.com/pub"), Err(Rejection::Invalid(_))));
        assert!(matches!(frontier.admit("http://"), Err(Rejection::Invalid(_))));
        assert!(frontier.is_empty());
    }
}
