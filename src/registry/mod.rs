//! npm registry claim checking.
//!
//! Answers "is this name registered?" with one HEAD request per unique name,
//! memoized for the run.

mod cache;
pub mod npm;

pub use cache::ClaimCache;
pub use npm::ClaimChecker;
