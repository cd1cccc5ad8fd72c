//! In-memory memo of claim checks for one run.

use dashmap::DashMap;

/// Thread-safe map from package name to claimed flag.
#[derive(Debug, Default)]
pub struct ClaimCache {
    entries: DashMap<String, bool>,
}

impl ClaimCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached claim status, if this name was checked already.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.get(name).map(|entry| *entry.value())
    }

    pub fn set(&self, name: &str, claimed: bool) {
        self.entries.insert(name.to_string(), claimed);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
