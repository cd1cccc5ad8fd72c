//! Name filters applied to every raw candidate.
//!
//! Two gates: the builtin-module table and a plausibility check that rejects
//! tokens which only look like package names by accident.

use crate::tables::{BUILTIN_MODULES, NON_PACKAGE_TOKENS};

/// Check if a name is a Node.js core module.
pub fn is_builtin_module(name: &str) -> bool {
    let base = name.strip_prefix("node:").unwrap_or(name);
    BUILTIN_MODULES.contains(&base)
}

/// Check if a name could plausibly be a registry package.
///
/// Requires at least two characters, at least one letter, and rejects the
/// common non-package tokens (`name`, `version`, `main`, ...).
pub fn looks_like_package_name(name: &str) -> bool {
    if name.len() < 2 {
        return false;
    }

    let lower = name.to_ascii_lowercase();
    if NON_PACKAGE_TOKENS.contains(&lower.as_str()) {
        return false;
    }

    name.chars().any(|c| c.is_ascii_alphabetic())
}
