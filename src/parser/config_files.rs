//! Build tool configuration: webpack, babel, eslint, tsconfig and friends.

use crate::parser::javascript::{extract_javascript, first_groups};
use crate::parser::{push_candidates, Extractor, JsonExtractor};
use crate::types::Package;
use once_cell::sync::Lazy;
use regex::Regex;

static LOADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bloader\s*:\s*['"]([^'"]+)['"]"#).expect("valid regex"));
static USE_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\buse\s*:\s*\[([^\]]+)\]"#).expect("valid regex"));
static PLUGIN_ARRAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"['"]?(?:presets?|plugins?|extends)['"]?\s*:\s*\[([^\]]+)\]"#).expect("valid regex")
});
static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"['"](@?[a-zA-Z0-9/_-]+(?:@[a-zA-Z0-9/_-]+)?/[a-zA-Z0-9/_-]+|[a-zA-Z0-9-]+(?:-[a-zA-Z0-9]+)*)['"]"#)
        .expect("valid regex")
});
static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).expect("valid regex"));

/// Extractor for build, lint and type-checker configuration files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigExtractor;

impl Extractor for ConfigExtractor {
    fn name(&self) -> &'static str {
        "config"
    }

    fn extract(&self, content: &str) -> Vec<Package> {
        let mut packages = Vec::new();

        if content.contains('{') && content.contains('}') {
            packages.extend(JsonExtractor.extract(content));
        }
        packages.extend(extract_javascript(content));

        push_candidates(&mut packages, first_groups(&LOADER, content));
        push_candidates(&mut packages, first_groups(&STRING_LITERAL, content));

        for pattern in [&*USE_ARRAY, &*PLUGIN_ARRAY] {
            for array in first_groups(pattern, content) {
                push_candidates(&mut packages, first_groups(&QUOTED, array));
            }
        }

        packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(content: &str) -> Vec<String> {
        ConfigExtractor.extract(content).into_iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_webpack_config() {
        let found = names(
            r#"
            const HtmlWebpackPlugin = require('html-webpack-plugin');
            module.exports = {
              module: {
                rules: [
                  { test: /\.js$/, loader: 'babel-loader' },
                  { test: /\.css$/, use: ['style-loader', "css-loader"] },
                ],
              },
              plugins: [new HtmlWebpackPlugin()],
            };
            "#,
        );
        for expected in ["html-webpack-plugin", "babel-loader", "style-loader", "css-loader"] {
            assert!(found.iter().any(|n| n == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_babelrc_presets_and_plugins() {
        let found = names(
            r#"{
              "presets": ["@babel/preset-env", "@company/babel-preset-internal"],
              "plugins": [["babel-plugin-private-transform", { "loose": true }]]
            }"#,
        );
        assert!(found.iter().any(|n| n == "@babel/preset-env"));
        assert!(found.iter().any(|n| n == "@company/babel-preset-internal"));
        assert!(found.iter().any(|n| n == "babel-plugin-private-transform"));
    }

    #[test]
    fn test_eslintrc_extends() {
        let found = names(r#"{ "extends": ["airbnb-base", "plugin:prettier/recommended"] }"#);
        assert!(found.iter().any(|n| n == "airbnb-base"));
    }

    #[test]
    fn test_tsconfig_runs_json_path() {
        let found = names(
            r#"{ "compilerOptions": { "types": ["node"] }, "dependencies": { "typescript-private-types": "1.0.0" } }"#,
        );
        assert!(found.iter().any(|n| n == "typescript-private-types"));
    }
}
