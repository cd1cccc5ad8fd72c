//! Source map parsing: package names from `sources` paths and embedded sources.

use crate::parser::javascript::{extract_javascript, first_groups};
use crate::parser::{push_candidates, Extractor};
use crate::types::Package;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

static WEBPACK_NODE_MODULES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"webpack://[^/]*/(?:\.?/)?node_modules/(@?[^/]+(?:/[^/@]+)?)").expect("valid regex")
});
static WRAPPED_SCOPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(@[a-zA-Z0-9_.-]+/[a-zA-Z0-9_.-]+)/").expect("valid regex"));
static NODE_MODULES_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"node_modules/(@[a-zA-Z0-9_.-]+/[a-zA-Z0-9_.-]+|[a-zA-Z0-9_.-]+)/")
        .expect("valid regex")
});

/// The only source map fields we read. Mappings are never decoded, and
/// null entries are legal in both lists.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
    #[serde(default)]
    sources: Vec<Option<String>>,
    #[serde(default)]
    sources_content: Vec<Option<String>>,
}

/// Extractor for `.map` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceMapExtractor;

impl Extractor for SourceMapExtractor {
    fn name(&self) -> &'static str {
        "sourcemap"
    }

    fn extract(&self, content: &str) -> Vec<Package> {
        let map: RawSourceMap = match serde_json::from_str(content) {
            Ok(map) => map,
            Err(e) => {
                debug!("not a source map: {}", e);
                return Vec::new();
            }
        };

        let mut packages = Vec::new();

        for source in map.sources.iter().flatten() {
            for pattern in [&*WEBPACK_NODE_MODULES, &*WRAPPED_SCOPE, &*NODE_MODULES_SEGMENT] {
                push_candidates(&mut packages, first_groups(pattern, source));
            }
        }

        for embedded in map.sources_content.iter().flatten() {
            if !embedded.is_empty() {
                packages.extend(extract_javascript(embedded));
            }
        }

        packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(content: &str) -> Vec<String> {
        SourceMapExtractor.extract(content).into_iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_sources_paths() {
        let found = names(
            r#"{
              "version": 3,
              "sources": [
                "webpack://my-app/./node_modules/lodash/lodash.js",
                "webpack:///node_modules/@babel/runtime/helpers/esm/defineProperty.js",
                "../node_modules/outer-dep/node_modules/nested-map-dep/index.js",
                "webpack://my-app/./packages/@internal/design-system/src/Button.tsx",
                "webpack://my-app/./src/App.tsx",
                null
              ],
              "mappings": ""
            }"#,
        );
        for expected in ["lodash", "@babel/runtime", "outer-dep", "nested-map-dep", "@internal/design-system"] {
            assert!(found.iter().any(|n| n == expected), "missing {}", expected);
        }
        assert!(!found.iter().any(|n| n == "App.tsx" || n == "src"));
    }

    #[test]
    fn test_sources_content_runs_javascript() {
        let found = names(
            r#"{
              "version": 3,
              "sources": ["src/index.js", "src/empty.js", "src/missing.js"],
              "sourcesContent": ["import api from '@corp/api-client';\nconst x = require('leftpad-internal');", "", null],
              "mappings": "AAAA"
            }"#,
        );
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|n| n == "@corp/api-client"));
        assert!(found.iter().any(|n| n == "leftpad-internal"));
    }

    #[test]
    fn test_missing_fields_and_invalid_json() {
        assert!(names(r#"{"version": 3}"#).is_empty());
        assert!(names("//# sourceMappingURL=app.js.map").is_empty());
    }
}
