//! Scan options and command-line configuration.

use clap::Parser;
use std::io::{BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default public registry endpoint.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Options for one scan run. Copied into the runner at construction.
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum in-flight targets. Zero is treated as one.
    pub concurrency: usize,
    /// Per-target deadline in seconds; also the HTTP client and DNS timeout.
    pub timeout: u64,
    /// Pause between dispatches, in milliseconds.
    pub delay: u64,
    /// Upper bound (exclusive) of the random extra pause, in milliseconds.
    pub delay_jitter: u64,
    /// Sent on every target request when non-empty.
    pub user_agent: String,
    /// Upstream HTTP proxy as `host:port`.
    pub proxy: Option<String>,
    /// Custom DNS servers as `host[:port]`, tried in order.
    pub resolvers: Vec<String>,
    pub verbose: bool,
    pub silence: bool,
    /// Registry base URL for claim checks.
    pub registry_url: String,
    /// Claim checks per second.
    pub registry_rate_limit: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: 30,
            delay: 0,
            delay_jitter: 0,
            user_agent: "npmjack".to_string(),
            proxy: None,
            resolvers: Vec::new(),
            verbose: false,
            silence: false,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            registry_rate_limit: 20,
        }
    }
}

/// Find npm package names referenced by web-exposed files and report the
/// ones nobody has registered.
#[derive(Parser, Debug, Clone)]
#[command(name = "npmjack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Target URL(s), comma separated
    #[arg(short = 'u', long = "url", value_delimiter = ',')]
    pub urls: Vec<String>,

    /// File containing target URLs (one per line)
    #[arg(short = 'i', long = "infile")]
    pub infile: Option<PathBuf>,

    /// Number of targets scanned concurrently
    #[arg(short = 'c', long, default_value = "10")]
    pub concurrency: usize,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "30")]
    pub timeout: u64,

    /// Delay between requests in milliseconds
    #[arg(short = 'd', long, default_value = "0")]
    pub delay: u64,

    /// Maximum random jitter added to the delay, in milliseconds
    #[arg(long = "dj", alias = "delay-jitter", default_value = "0")]
    pub delay_jitter: u64,

    /// User-Agent header for target requests
    #[arg(long = "ua", alias = "user-agent", default_value = "npmjack")]
    pub user_agent: String,

    /// HTTP proxy (host:port)
    #[arg(short = 'p', long)]
    pub proxy: Option<String>,

    /// File containing DNS resolvers (one per line, host[:port])
    #[arg(short = 'r', long)]
    pub resolvers: Option<PathBuf>,

    /// Write results to this file
    #[arg(short = 'o', long = "outfile")]
    pub outfile: Option<PathBuf>,

    /// Only show unclaimed packages
    #[arg(long = "hc", alias = "hide-claimed")]
    pub hide_claimed: bool,

    /// Write results as JSON
    #[arg(long)]
    pub json: bool,

    /// Only print results
    #[arg(short = 's', long)]
    pub silence: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Registry base URL used for claim checks
    #[arg(long, default_value = DEFAULT_REGISTRY_URL)]
    pub registry: String,

    /// Registry requests per second
    #[arg(long, default_value = "20")]
    pub registry_rate: u32,
}

impl Cli {
    /// Build run options. An unreadable resolver file degrades to system DNS.
    pub fn options(&self) -> Options {
        let resolvers = match &self.resolvers {
            Some(path) => read_lines(path).unwrap_or_else(|e| {
                warn!("Could not read resolvers from {}: {}; using system DNS", path.display(), e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        Options {
            concurrency: self.concurrency,
            timeout: self.timeout,
            delay: self.delay,
            delay_jitter: self.delay_jitter,
            user_agent: self.user_agent.clone(),
            proxy: self.proxy.clone(),
            resolvers,
            verbose: self.verbose,
            silence: self.silence,
            registry_url: self.registry.clone(),
            registry_rate_limit: self.registry_rate,
        }
    }

    /// Collect targets from `--url`, `--infile` and piped stdin, in that order.
    pub fn load_targets(&self) -> crate::types::Result<Vec<String>> {
        let mut targets: Vec<String> = self
            .urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect();

        if let Some(path) = &self.infile {
            targets.extend(read_lines(path)?);
        }

        let stdin = std::io::stdin();
        if !stdin.is_terminal() && self.infile.is_none() {
            targets.extend(parse_lines(stdin.lock())?);
        }

        Ok(targets)
    }
}

/// Read a list file: one entry per line, blanks and `#` comments skipped.
pub fn read_lines(path: &Path) -> crate::types::Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    parse_lines(std::io::BufReader::new(file))
}

fn parse_lines(reader: impl BufRead) -> crate::types::Result<Vec<String>> {
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            entries.push(trimmed.to_string());
        }
    }
    Ok(entries)
}
