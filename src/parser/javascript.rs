//! JavaScript pattern extraction.
//!
//! Regex heuristics over source files and bundles. No AST: minified and
//! partially broken bundles must still yield their module references.

use crate::parser::{candidate, dedupe_packages, push_candidates, Extractor};
use crate::tables::GLOBAL_PROPERTIES;
use crate::types::Package;
use once_cell::sync::Lazy;
use regex::Regex;

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

// module specifiers
static IMPORT_CALL: Lazy<Regex> =
    Lazy::new(|| regex(r#"\b(?:require|import)\s*\(?\s*['"]([^'"\n]+)['"]\s*\)?"#));
static FROM_CLAUSE: Lazy<Regex> = Lazy::new(|| regex(r#"\bfrom\s+['"]([^'"\n]+)['"]"#));
static REQUIRE_RESOLVE: Lazy<Regex> =
    Lazy::new(|| regex(r#"\brequire\.resolve\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#));
static DYNAMIC_IMPORT: Lazy<Regex> =
    Lazy::new(|| regex(r#"\bimport\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#));

// AMD / RequireJS
static AMD_DEFINE: Lazy<Regex> =
    Lazy::new(|| regex(r#"\bdefine\s*\(\s*(?:['"][^'"]*['"]\s*,\s*)?\[([^\]]*)\]"#));
static AMD_REQUIRE: Lazy<Regex> =
    Lazy::new(|| regex(r#"\b(?:require|requirejs)\s*\(\s*\[([^\]]*)\]"#));
static REQUIREJS_PATHS: Lazy<Regex> = Lazy::new(|| regex(r#"\bpaths\s*:\s*\{([^}]+)\}"#));
static PATHS_KEY: Lazy<Regex> =
    Lazy::new(|| regex(r#"['"]([^'"]+)['"]\s*:\s*['"][^'"]+['"]"#));

// CDN and import maps
static SCRIPT_SRC: Lazy<Regex> =
    Lazy::new(|| regex(r#"(?i)<script[^>]+src\s*=\s*['"]([^'"]+)['"]"#));
static CDN_PATH: Lazy<Regex> = Lazy::new(|| {
    regex(r#"(?:unpkg\.com|cdn\.jsdelivr\.net/npm|cdnjs\.cloudflare\.com/ajax/libs)/(@?[a-zA-Z0-9_.-]+(?:/[a-zA-Z0-9_.-]+)?)"#)
});
static IMPORT_MAP_ENTRY: Lazy<Regex> =
    Lazy::new(|| regex(r#""(@?[a-zA-Z0-9/._-]+)"\s*:\s*['"]https?://[^'"]+['"]"#));

// bundler output
static EXTERNALS: Lazy<Regex> = Lazy::new(|| regex(r#"\bexternals\s*:\s*\{([^}]+)\}"#));
static OBJECT_KEY: Lazy<Regex> =
    Lazy::new(|| regex(r#"(?m)(?:^|[,{])\s*['"]?(@?[a-zA-Z0-9/._-]+)['"]?\s*:"#));
static UMD_INDEX_ASSIGN: Lazy<Regex> = Lazy::new(|| {
    regex(r#"\b(?:window|global|globalThis|self)\[\s*['"](@?[a-zA-Z0-9/._-]+)['"]\s*\]\s*=(?:[^=]|$)"#)
});
static UMD_FACTORY_CALL: Lazy<Regex> =
    Lazy::new(|| regex(r#"\bfactory\s*\(((?:[^()]|\([^()]*\))*)\)"#));
static GLOBAL_ASSIGN: Lazy<Regex> =
    Lazy::new(|| regex(r#"\b(?:window|global)\.([A-Za-z][A-Za-z0-9_$]*)\s*=(?:[^=]|$)"#));
static MINIFIED_CALL: Lazy<Regex> =
    Lazy::new(|| regex(r#"\b[a-z]\(\s*['"](@?[a-zA-Z0-9/._-]+)['"]"#));
static PARCEL_REQUIRE: Lazy<Regex> =
    Lazy::new(|| regex(r#"parcel\$require\(\s*['"]([^'"]+)['"]\s*\)"#));
static WEBPACK_CHUNK: Lazy<Regex> =
    Lazy::new(|| regex(r#"/\*\*\* WEBPACK CHUNK: (@?[a-zA-Z0-9/._-]+) \*\*\*/"#));

// install commands left in comments
static INLINE_NPM_INSTALL: Lazy<Regex> = Lazy::new(|| {
    regex(r#"\bnpm\s+(?:install|i)\s+(?:-{1,2}[a-zA-Z-]+\s+)*([a-zA-Z0-9@/._-]+)"#)
});
static INLINE_YARN_ADD: Lazy<Regex> = Lazy::new(|| {
    regex(r#"\byarn\s+add\s+(?:-{1,2}[a-zA-Z-]+\s+)*([a-zA-Z0-9@/._-]+)"#)
});

static QUOTED: Lazy<Regex> = Lazy::new(|| regex(r#"['"]([^'"]+)['"]"#));

/// Extractor applied to every fetched body regardless of class.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScriptExtractor;

impl Extractor for JavaScriptExtractor {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn extract(&self, content: &str) -> Vec<Package> {
        extract_javascript(content)
    }
}

/// Run every JavaScript heuristic over `content`.
pub fn extract_javascript(content: &str) -> Vec<Package> {
    let mut packages = Vec::new();

    for pattern in [
        &*IMPORT_CALL,
        &*FROM_CLAUSE,
        &*REQUIRE_RESOLVE,
        &*DYNAMIC_IMPORT,
        &*PARCEL_REQUIRE,
        &*WEBPACK_CHUNK,
        &*INLINE_NPM_INSTALL,
        &*INLINE_YARN_ADD,
        &*IMPORT_MAP_ENTRY,
        &*UMD_INDEX_ASSIGN,
        &*MINIFIED_CALL,
    ] {
        push_candidates(&mut packages, first_groups(pattern, content));
    }

    for pattern in [&*AMD_DEFINE, &*AMD_REQUIRE] {
        for deps in first_groups(pattern, content) {
            push_candidates(&mut packages, amd_elements(deps));
        }
    }

    for block in first_groups(&REQUIREJS_PATHS, content) {
        push_candidates(&mut packages, first_groups(&PATHS_KEY, block));
    }

    for src in first_groups(&SCRIPT_SRC, content) {
        push_candidates(&mut packages, first_groups(&CDN_PATH, src));
    }
    push_candidates(&mut packages, first_groups(&CDN_PATH, content));

    for block in first_groups(&EXTERNALS, content) {
        push_candidates(&mut packages, first_groups(&OBJECT_KEY, block));
    }

    for args in first_groups(&UMD_FACTORY_CALL, content) {
        push_candidates(&mut packages, first_groups(&QUOTED, args));
    }

    for global in first_groups(&GLOBAL_ASSIGN, content) {
        let lower = global.to_lowercase();
        if !GLOBAL_PROPERTIES.contains(&lower.as_str()) {
            packages.extend(candidate(&lower));
        }
    }

    dedupe_packages(packages)
}

/// Capture group 1 of every match.
pub(crate) fn first_groups<'a>(
    pattern: &'a Regex,
    content: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    pattern
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Quoted elements of an AMD dependency array. Bare identifiers are skipped.
fn amd_elements(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').filter_map(|element| {
        let element = element.trim();
        let quoted = element.len() >= 2
            && ((element.starts_with('\'') && element.ends_with('\''))
                || (element.starts_with('"') && element.ends_with('"')));
        quoted.then(|| &element[1..element.len() - 1])
    })
}
