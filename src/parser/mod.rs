//! Package extraction parsers.
//!
//! This module handles extracting package names from:
//! - JavaScript sources and bundles (imports, AMD, UMD, CDN URLs, externals)
//! - Manifests and lockfiles (package.json, package-lock.json, yarn.lock)
//! - Build tool configuration (webpack, babel, tsconfig, eslint)
//! - CI/CD scripts (workflows, Dockerfiles, Makefiles)
//! - Documentation (README install instructions)
//! - Source maps (sources paths and embedded sources)
//!
//! Every extractor is failure tolerant: content that does not parse as the
//! attempted grammar yields no packages.

pub mod cicd;
pub mod config_files;
pub mod docs;
pub mod filters;
pub mod javascript;
pub mod manifest;
pub mod sourcemap;

pub use cicd::CicdExtractor;
pub use config_files::ConfigExtractor;
pub use docs::DocExtractor;
pub use javascript::JavaScriptExtractor;
pub use manifest::JsonExtractor;
pub use sourcemap::SourceMapExtractor;

use crate::tables::{
    CICD_EXTENSIONS, CICD_MARKERS, CONFIG_MARKERS, DOC_EXTENSIONS, JSON_MARKERS,
    SOURCEMAP_EXTENSIONS,
};
use crate::types::Package;
use tracing::trace;

/// A single grammar that turns raw content into candidate packages.
pub trait Extractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Extract candidate packages. Never fails; unparseable input yields nothing.
    fn extract(&self, content: &str) -> Vec<Package>;
}

/// Content classes derived from a target URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentClass {
    Json,
    Config,
    Cicd,
    Doc,
    SourceMap,
}

/// Classify a URL by filename and extension. A URL may match several classes.
pub fn classify(url: &str) -> Vec<ContentClass> {
    let lower = url.to_lowercase();
    let mut classes = Vec::new();

    if lower.ends_with(".json") || JSON_MARKERS.iter().any(|m| lower.contains(m)) {
        classes.push(ContentClass::Json);
    }

    if CONFIG_MARKERS.iter().any(|m| lower.contains(m)) {
        classes.push(ContentClass::Config);
    }

    if CICD_MARKERS.iter().any(|m| lower.contains(m))
        || CICD_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    {
        classes.push(ContentClass::Cicd);
    }

    if DOC_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        classes.push(ContentClass::Doc);
    }

    if SOURCEMAP_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        classes.push(ContentClass::SourceMap);
    }

    classes
}

/// Dispatches content to the extractors implied by its URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionEngine;

impl ExtractionEngine {
    /// Create a new extraction engine.
    pub fn new() -> Self {
        Self
    }

    /// Run every applicable extractor, JavaScript last, and concatenate.
    ///
    /// Duplicates are left in place; the caller deduplicates by name.
    pub fn extract(&self, url: &str, content: &str) -> Vec<Package> {
        let mut packages = Vec::new();

        for class in classify(url) {
            let extractor = extractor_for(class);
            let found = extractor.extract(content);
            trace!("{} extractor: {} candidates from {}", extractor.name(), found.len(), url);
            packages.extend(found);
        }

        packages.extend(JavaScriptExtractor.extract(content));
        packages
    }
}

fn extractor_for(class: ContentClass) -> &'static dyn Extractor {
    match class {
        ContentClass::Json => &JsonExtractor,
        ContentClass::Config => &ConfigExtractor,
        ContentClass::Cicd => &CicdExtractor,
        ContentClass::Doc => &DocExtractor,
        ContentClass::SourceMap => &SourceMapExtractor,
    }
}

/// Deduplicate by name, first occurrence wins, order preserved.
pub fn dedupe_packages(packages: Vec<Package>) -> Vec<Package> {
    let mut seen = std::collections::HashSet::new();
    packages
        .into_iter()
        .filter(|p| seen.insert(p.name.clone()))
        .collect()
}

/// Reduce a raw reference (import specifier, path, install argument) to a
/// package name.
///
/// Strips quotes, subpaths and version suffixes; rejects relative paths,
/// URLs and names with characters npm does not allow. Scoped names are kept
/// whole as `@scope/name`.
pub fn normalize_package_name(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
        .trim();

    if trimmed.is_empty()
        || trimmed.starts_with(['.', '/', '~', '-', '#', '$'])
        || trimmed.contains("://")
        || trimmed.starts_with("data:")
        || trimmed.starts_with("git+")
        || trimmed.starts_with("node:")
    {
        return None;
    }

    let name = if let Some(rest) = trimmed.strip_prefix('@') {
        let mut parts = rest.splitn(3, '/');
        let scope = parts.next()?;
        let package = parts.next()?.split('@').next()?;
        if scope.is_empty() || scope.contains('@') || package.is_empty() {
            return None;
        }
        format!("@{}/{}", scope, package.trim_end_matches('.'))
    } else {
        let first = trimmed.split('/').next()?.split('@').next()?;
        first.trim_end_matches('.').to_string()
    };

    if name.is_empty()
        || name.ends_with('/')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '@' | '/' | '-'))
    {
        return None;
    }

    Some(name)
}

/// Turn a raw reference into a package if it survives both name filters.
pub fn candidate(raw: &str) -> Option<Package> {
    let name = normalize_package_name(raw)?;
    if filters::is_builtin_module(&name) || !filters::looks_like_package_name(&name) {
        return None;
    }
    Some(Package::new(name))
}

/// Push every surviving candidate from `raws` onto `out`.
pub(crate) fn push_candidates<'a>(out: &mut Vec<Package>, raws: impl IntoIterator<Item = &'a str>) {
    out.extend(raws.into_iter().filter_map(candidate));
}
