//! Core types and errors for the scanner.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use thiserror::Error;

/// Errors that can occur during scanning.
#[derive(Error, Debug)]
pub enum NpmjackError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("DNS resolution failed: {0}")]
    DnsError(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No targets supplied")]
    NoTargets,
}

pub type Result<T> = std::result::Result<T, NpmjackError>;

/// A candidate package reference found in scanned content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Package {
    /// Package name, scope included (e.g. "@company/pkg" or "lodash").
    pub name: String,
    /// Reserved; always empty. Scoped names stay intact in `name`.
    pub namespace: String,
    /// Whether the name is registered on the public registry.
    pub claimed: bool,
}

impl Package {
    /// Create an unclaimed package reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
            claimed: false,
        }
    }

    /// Whether this is a scoped (`@scope/name`) package.
    pub fn is_scoped(&self) -> bool {
        self.name.starts_with('@') && self.name.contains('/')
    }
}

/// Outcome of one scanned target, pushed onto the result stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Normalized URL that was requested.
    pub request_url: String,
    /// HTTP status code (0 when the fetch failed).
    pub status_code: u16,
    /// DNS path that served the request ("system" or a resolver address).
    pub resolver: String,
    /// Fetch error, if any.
    pub error: Option<String>,
    /// Deduplicated, claim-annotated packages.
    pub packages: Vec<Package>,
}

impl ScanResult {
    /// Result for a target whose fetch failed.
    pub fn failed(request_url: String, resolver: String, error: &NpmjackError) -> Self {
        Self {
            request_url,
            status_code: 0,
            resolver,
            error: Some(error.to_string()),
            packages: Vec::new(),
        }
    }

    /// Packages not registered on the public registry.
    pub fn unclaimed(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().filter(|p| !p.claimed)
    }
}

/// Outcome of resolving one hostname.
#[derive(Debug)]
pub struct ResolutionResult {
    /// Resolved addresses or the last failure.
    pub addrs: Result<Vec<IpAddr>>,
    /// "system" or the address of the custom resolver that answered.
    pub resolver: String,
}

/// Tag used for the platform resolver.
pub const SYSTEM_RESOLVER: &str = "system";
