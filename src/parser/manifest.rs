//! Manifest and lockfile parsing: package.json, package-lock.json, yarn.lock.

use crate::parser::{candidate, Extractor};
use crate::types::Package;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Dependency maps of a package.json whose keys are package names.
const DEPENDENCY_FIELDS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// Both spellings npm accepts for the bundled list.
const BUNDLED_FIELDS: &[&str] = &["bundledDependencies", "bundleDependencies"];

/// Metadata keys inside a yarn.lock entry.
const YARN_METADATA: &[&str] = &["version", "resolved", "dependencies", "integrity"];

static YARN_SCOPED_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"(@[^/"]+/[^@"]+)(?:@[^"]*)?"(?:,.*)?:$"#).expect("valid regex"));
static YARN_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"([^@"]+)(?:@[^"]*)?"(?:,.*)?:$"#).expect("valid regex"));
static YARN_BARE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(@?[a-zA-Z0-9._-]+(?:/[a-zA-Z0-9._-]+)?)@[^\s,:]+(?:,.*)?:$"#).expect("valid regex")
});
static YARN_DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s{4}"?(@?[a-zA-Z0-9/@._-]+)"?\s+"([^"]+)""#).expect("valid regex")
});

/// Extractor for JSON manifests and lockfiles (yarn.lock included).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl Extractor for JsonExtractor {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extract(&self, content: &str) -> Vec<Package> {
        let mut packages = Vec::new();

        if let Ok(Value::Object(root)) = serde_json::from_str::<Value>(content) {
            packages.extend(from_package_json(&root));
            packages.extend(from_package_lock(&root));
        }

        packages.extend(extract_yarn_lock(content));
        packages
    }
}

/// Parse package.json content. Returns nothing if it is not a JSON object.
pub fn extract_package_json(content: &str) -> Vec<Package> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(root)) => from_package_json(&root),
        _ => Vec::new(),
    }
}

/// Parse package-lock.json content. Returns nothing if it is not a JSON object.
pub fn extract_package_lock(content: &str) -> Vec<Package> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(root)) => from_package_lock(&root),
        _ => Vec::new(),
    }
}

fn from_package_json(root: &Map<String, Value>) -> Vec<Package> {
    let mut packages = Vec::new();

    for field in DEPENDENCY_FIELDS {
        if let Some(Value::Object(deps)) = root.get(*field) {
            packages.extend(deps.keys().filter_map(|name| candidate(name)));
        }
    }

    // `bundleDependencies: true` is legal and names nothing.
    for field in BUNDLED_FIELDS {
        if let Some(Value::Array(names)) = root.get(*field) {
            packages.extend(names.iter().filter_map(Value::as_str).filter_map(candidate));
        }
    }

    packages
}

fn from_package_lock(root: &Map<String, Value>) -> Vec<Package> {
    let mut packages = Vec::new();

    if let Some(Value::Object(entries)) = root.get("packages") {
        for (install_path, entry) in entries {
            if let Some((_, name)) = install_path.rsplit_once("node_modules/") {
                packages.extend(candidate(name));
            }
            if let Some(Value::Object(deps)) = entry.get("dependencies") {
                packages.extend(deps.keys().filter_map(|name| candidate(name)));
            }
        }
    }

    // lockfile v1: nested `dependencies` trees with `requires` maps
    if root.contains_key("lockfileVersion") {
        if let Some(Value::Object(tree)) = root.get("dependencies") {
            walk_v1_tree(tree, &mut packages);
        }
    }

    packages
}

fn walk_v1_tree(tree: &Map<String, Value>, packages: &mut Vec<Package>) {
    for (name, entry) in tree {
        packages.extend(candidate(name));
        if let Some(Value::Object(requires)) = entry.get("requires") {
            packages.extend(requires.keys().filter_map(|dep| candidate(dep)));
        }
        if let Some(Value::Object(nested)) = entry.get("dependencies") {
            walk_v1_tree(nested, packages);
        }
    }
}

/// Line-oriented yarn.lock scan.
pub fn extract_yarn_lock(content: &str) -> Vec<Package> {
    let mut packages = Vec::new();

    for original in content.lines() {
        let line = original.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if !original.starts_with(' ') {
            let header = YARN_SCOPED_HEADER
                .captures(line)
                .or_else(|| YARN_HEADER.captures(line))
                .or_else(|| YARN_BARE_HEADER.captures(line));
            if let Some(name) = header.and_then(|caps| caps.get(1)) {
                packages.extend(candidate(name.as_str()));
                continue;
            }
        }

        if original.starts_with("    ") && !YARN_METADATA.iter().any(|m| line.starts_with(m)) {
            if let Some(name) = YARN_DEPENDENCY.captures(original).and_then(|caps| caps.get(1)) {
                packages.extend(candidate(name.as_str()));
            }
        }
    }

    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(packages: &[Package]) -> Vec<&str> {
        packages.iter().map(|p| p.name.as_str()).collect()
    }

    const PACKAGE_JSON: &str = r#"{
        "name": "my-app",
        "version": "1.0.0",
        "dependencies": {
            "express": "^4.0.0",
            "@company/private-pkg": "1.2.3",
            "unclaimed-package-123": "*"
        },
        "devDependencies": { "webpack": "^5.0.0", "@babel/core": "^7.0.0" },
        "peerDependencies": { "react-dom": ">=17" },
        "optionalDependencies": { "fsevents": "^2.3.0" },
        "bundledDependencies": ["vulnerable-lib"]
    }"#;

    #[test]
    fn test_package_json_dependency_maps() {
        let packages = extract_package_json(PACKAGE_JSON);
        let found = names(&packages);
        for expected in [
            "express",
            "@company/private-pkg",
            "unclaimed-package-123",
            "webpack",
            "@babel/core",
            "react-dom",
            "fsevents",
            "vulnerable-lib",
        ] {
            assert!(found.contains(&expected), "missing {}", expected);
        }
        assert!(!found.contains(&"my-app"));
    }

    #[test]
    fn test_package_json_bundle_flag_tolerated() {
        let content = r#"{"dependencies": {"express": "^4.0.0"}, "bundleDependencies": true}"#;
        assert_eq!(names(&extract_package_json(content)), vec!["express"]);
    }

    #[test]
    fn test_not_json_yields_nothing() {
        assert!(extract_package_json("module.exports = {}").is_empty());
        assert!(extract_package_lock("[1, 2, 3]").is_empty());
    }

    #[test]
    fn test_package_lock_paths_and_nested_dependencies() {
        let content = r#"{
            "name": "my-app",
            "lockfileVersion": 3,
            "packages": {
                "": { "dependencies": { "express": "^4.18.2" } },
                "node_modules/express": {
                    "version": "4.18.2",
                    "dependencies": { "body-parser": "1.20.1", "transitive-unclaimed": "^1.0.0" }
                },
                "node_modules/express/node_modules/hidden-dependency": { "version": "1.0.0" },
                "node_modules/@scope/nested-missing-pkg": { "version": "0.1.0" }
            }
        }"#;

        let packages = extract_package_lock(content);
        let found = names(&packages);
        for expected in [
            "express",
            "body-parser",
            "transitive-unclaimed",
            "hidden-dependency",
            "@scope/nested-missing-pkg",
        ] {
            assert!(found.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_package_lock_v1_tree() {
        let content = r#"{
            "lockfileVersion": 1,
            "dependencies": {
                "express": {
                    "version": "4.17.1",
                    "requires": { "cookie": "0.4.0" },
                    "dependencies": { "deep-nested-unclaimed": { "version": "1.0.0" } }
                }
            }
        }"#;

        let packages = extract_package_lock(content);
        let found = names(&packages);
        assert!(found.contains(&"express"));
        assert!(found.contains(&"cookie"));
        assert!(found.contains(&"deep-nested-unclaimed"));
    }

    #[test]
    fn test_yarn_lock_scoped_header() {
        let packages = extract_yarn_lock("\"@babel/core@^7.0.0\":\n  version \"7.22.0\"\n");
        assert_eq!(names(&packages), vec!["@babel/core"]);
    }

    #[test]
    fn test_yarn_lock_full() {
        let content = r#"# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.
# yarn lockfile v1


"@babel/core@^7.0.0", "@babel/core@^7.12.3":
  version "7.22.0"
  resolved "https://registry.yarnpkg.com/@babel/core/-/core-7.22.0.tgz"
  dependencies:
    "@babel/generator" "^7.22.0"
    yarn-specific-missing "^1.0.0"

"express@^4.18.2":
  version "4.18.2"
  dependencies:
    body-parser "1.20.1"
    cookie "0.5.0"

lodash@^4.17.21:
  version "4.17.21"
"#;

        let packages = extract_yarn_lock(content);
        let found = names(&packages);
        for expected in [
            "@babel/core",
            "@babel/generator",
            "yarn-specific-missing",
            "express",
            "body-parser",
            "cookie",
            "lodash",
        ] {
            assert!(found.contains(&expected), "missing {}", expected);
        }
        assert!(!found.contains(&"version"));
        assert!(!found.contains(&"resolved"));
    }

    #[test]
    fn test_json_extractor_surfaces_both_formats() {
        let extractor = JsonExtractor;
        let found = extractor.extract(PACKAGE_JSON);
        assert!(found.iter().any(|p| p.name == "express"));

        let lock = r#"{"lockfileVersion": 2, "packages": {"node_modules/body-parser": {}}}"#;
        let found = extractor.extract(lock);
        assert!(found.iter().any(|p| p.name == "body-parser"));
    }
}
