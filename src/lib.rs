//! npmjack - dependency confusion scanner for exposed web assets.
//!
//! This library scans content reachable at a set of URLs for npm package
//! references and checks each name against the public registry:
//! - Normalizes and deduplicates targets before dispatch
//! - Fetches under a concurrency bound, optionally through custom DNS resolvers
//! - Extracts package names from JavaScript, manifests, lockfiles, build
//!   configs, CI/CD scripts, docs and source maps
//! - Marks every name as claimed or unclaimed on the registry
//!
//! Results are delivered on a stream as each target finishes. The library
//! logs through `tracing` and never installs a subscriber.
//!
//! # Example
//!
//! ```no_run
//! use npmjack::{Options, Runner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = Runner::new(Options::default()).unwrap();
//!     let (mut stream, handle) = runner.start(vec!["https://example.com/package.json".into()]);
//!     while let Some(result) = stream.recv().await {
//!         for package in result.unclaimed() {
//!             println!("{} is unclaimed ({})", package.name, result.request_url);
//!         }
//!     }
//!     handle.await.unwrap().unwrap();
//! }
//! ```

pub mod config;
pub mod frontier;
pub mod notify;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod tables;
pub mod transport;
pub mod types;

pub use config::{Cli, Options};
pub use frontier::{normalize_url, Frontier, Rejection};
pub use parser::{ExtractionEngine, Extractor};
pub use registry::ClaimChecker;
pub use scanner::{ResultStream, Runner, TargetState};
pub use transport::{Resolver, Transport};
pub use types::{NpmjackError, Package, ResolutionResult, Result, ScanResult};
