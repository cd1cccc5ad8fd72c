//! CI/CD scripts: workflows, Dockerfiles, Makefiles, shell scripts.

use crate::parser::{candidate, Extractor};
use crate::tables::MAKE_MACROS;
use crate::types::Package;
use once_cell::sync::Lazy;
use regex::Regex;

static COMMAND_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&&|\|\||;|\|").expect("valid regex"));
static NPM_INSTALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnpm\s+(?:install|i|add)(?:\s|$)(.*)").expect("valid regex"));
static YARN_ADD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\byarn\s+(?:global\s+)?add(?:\s|$)(.*)").expect("valid regex"));
static PNPM_ADD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bpnpm\s+(?:install|add|i)(?:\s|$)(.*)").expect("valid regex"));
static NPX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnpx(?:\s|$)(.*)").expect("valid regex"));

/// Extractor for install commands in build and deploy scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CicdExtractor;

impl Extractor for CicdExtractor {
    fn name(&self) -> &'static str {
        "cicd"
    }

    fn extract(&self, content: &str) -> Vec<Package> {
        let mut packages = Vec::new();
        for line in content.lines() {
            extract_line(line, &mut packages);
        }
        packages
    }
}

fn extract_line(line: &str, packages: &mut Vec<Package>) {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return;
    }

    // container build step
    if let Some(command) = line.strip_prefix("RUN ") {
        extract_line(command, packages);
        return;
    }

    if MAKE_MACROS.iter().any(|(macro_name, _)| line.contains(macro_name)) {
        let expanded = MAKE_MACROS
            .iter()
            .fold(line.to_string(), |acc, (macro_name, command)| acc.replace(macro_name, command));
        extract_line(&expanded, packages);
        return;
    }

    for segment in COMMAND_SEPARATOR.split(line) {
        extract_segment(segment, packages);
    }
}

fn extract_segment(segment: &str, packages: &mut Vec<Package>) {
    for pattern in [&*NPM_INSTALL, &*YARN_ADD, &*PNPM_ADD] {
        if let Some(args) = pattern.captures(segment).and_then(|caps| caps.get(1)) {
            packages.extend(
                args.as_str()
                    .split_whitespace()
                    .filter(|token| !token.starts_with('-'))
                    .filter_map(candidate),
            );
            return;
        }
    }

    if let Some(args) = NPX.captures(segment).and_then(|caps| caps.get(1)) {
        let tool = args.as_str().split_whitespace().find(|token| !token.starts_with('-'));
        packages.extend(tool.and_then(candidate));
    }
}
