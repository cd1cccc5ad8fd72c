//! Documentation: README install instructions and examples.

use crate::parser::cicd::CicdExtractor;
use crate::parser::javascript::{extract_javascript, first_groups};
use crate::parser::{candidate, push_candidates, Extractor};
use crate::tables::PROSE_STOPWORDS;
use crate::types::Package;
use once_cell::sync::Lazy;
use regex::Regex;

static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[a-zA-Z0-9_-]*\n(.*?)\n```").expect("valid regex"));
static PROSE_NPM_INSTALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnpm\s+(?:install|i)(?:[ \t]|$)([^\n]*)").expect("valid regex"));
static PROSE_YARN_ADD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\byarn\s+(?:global\s+)?add(?:[ \t]|$)([^\n]*)").expect("valid regex"));
static PROSE_PNPM_ADD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bpnpm\s+(?:add|install|i)(?:[ \t]|$)([^\n]*)").expect("valid regex"));
static PROSE_NPX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnpx\s+([a-zA-Z0-9@/._-]+)").expect("valid regex"));
static PROSE_CREATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:yarn|npm)\s+create\s+([a-zA-Z0-9@/._-]+)").expect("valid regex")
});
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([a-zA-Z0-9@/._-]+)`").expect("valid regex"));
static VERSION_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([a-zA-Z0-9@/._-]+)":\s*"[\^~]?\d[\d.]*[^"]*""#).expect("valid regex")
});

/// Extractor for markdown, reStructuredText and plain text docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocExtractor;

impl Extractor for DocExtractor {
    fn name(&self) -> &'static str {
        "docs"
    }

    fn extract(&self, content: &str) -> Vec<Package> {
        let mut packages = Vec::new();

        for block in first_groups(&CODE_BLOCK, content) {
            packages.extend(extract_javascript(block));
            packages.extend(CicdExtractor.extract(block));
        }

        let prose = CODE_BLOCK.replace_all(content, "");
        for pattern in [&*PROSE_NPM_INSTALL, &*PROSE_YARN_ADD, &*PROSE_PNPM_ADD] {
            for args in first_groups(pattern, &prose) {
                packages.extend(prose_arguments(args));
            }
        }
        push_candidates(&mut packages, first_groups(&PROSE_NPX, &prose));
        push_candidates(&mut packages, first_groups(&PROSE_CREATE, &prose));
        push_candidates(&mut packages, first_groups(&INLINE_CODE, &prose));

        push_candidates(&mut packages, first_groups(&VERSION_PAIR, &prose));

        packages
    }
}

/// Package arguments of an install command written in a sentence. Stops at
/// the first word that reads as prose again ("... and then run ...").
fn prose_arguments(args: &str) -> Vec<Package> {
    let mut packages = Vec::new();

    let punctuation = |c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')');
    for token in args.split_whitespace() {
        let token = token
            .trim_end_matches(punctuation)
            .trim_matches(|c| matches!(c, '`' | '"' | '\''))
            .trim_end_matches(punctuation);
        if token.is_empty() || token.starts_with('-') {
            continue;
        }
        if PROSE_STOPWORDS.contains(&token.to_lowercase().as_str()) {
            break;
        }
        packages.extend(candidate(token));
    }

    packages
}
