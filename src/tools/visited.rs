//! VisitedState - session-scoped dedup sets
//!
//! One instance per exploration run, shared by every step of that run. A
//! file read in step 1 stays visited in step 5; a fresh run starts empty.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Counts of recorded visits, used in dedup guidance messages
#[derive(Debug, Clone, Copy, Default)]
pub struct VisitedCounts {
    pub files: usize,
    pub directories: usize,
    pub patterns: usize,
}

/// Tracks what the current run has already looked at
///
/// Three sets: file paths that were read, directory-listing signatures
/// (path plus every listing parameter), and find_files search signatures.
/// Clone shares the underlying sets.
#[derive(Clone, Default)]
pub struct VisitedState {
    files: Arc<Mutex<HashSet<String>>>,
    directories: Arc<Mutex<HashSet<String>>>,
    patterns: Arc<Mutex<HashSet<String>>>,
}

impl VisitedState {
    pub fn new() -> Self {
        debug!("VisitedState::new: called");
        Self::default()
    }

    /// Record a file read; returns false if it was already recorded
    pub async fn mark_file(&self, path: &str) -> bool {
        debug!(%path, "VisitedState::mark_file: called");
        self.files.lock().await.insert(path.to_string())
    }

    /// Check whether a file was read earlier in this run
    pub async fn was_file_read(&self, path: &str) -> bool {
        let result = self.files.lock().await.contains(path);
        debug!(%path, %result, "VisitedState::was_file_read: returning");
        result
    }

    /// Record a directory-listing signature; returns false if already seen
    pub async fn mark_directory(&self, signature: &str) -> bool {
        debug!(%signature, "VisitedState::mark_directory: called");
        self.directories.lock().await.insert(signature.to_string())
    }

    /// Check whether this exact directory listing already ran
    pub async fn was_directory_listed(&self, signature: &str) -> bool {
        let result = self.directories.lock().await.contains(signature);
        debug!(%signature, %result, "VisitedState::was_directory_listed: returning");
        result
    }

    /// Record a find_files signature (bookkeeping only, searches always run)
    pub async fn mark_pattern(&self, signature: &str) {
        debug!(%signature, "VisitedState::mark_pattern: called");
        self.patterns.lock().await.insert(signature.to_string());
    }

    /// Snapshot of visit counts for guidance messages
    pub async fn counts(&self) -> VisitedCounts {
        VisitedCounts {
            files: self.files.lock().await.len(),
            directories: self.directories.lock().await.len(),
            patterns: self.patterns.lock().await.len(),
        }
    }
}

impl std::fmt::Debug for VisitedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitedState").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_marking_round_trip() {
        let visited = VisitedState::new();

        assert!(!visited.was_file_read("src/main.rs").await);
        assert!(visited.mark_file("src/main.rs").await);
        assert!(visited.was_file_read("src/main.rs").await);

        // Second mark reports the duplicate
        assert!(!visited.mark_file("src/main.rs").await);
    }

    #[tokio::test]
    async fn test_directory_signatures_are_exact() {
        let visited = VisitedState::new();

        visited.mark_directory("src:false:3:false").await;

        assert!(visited.was_directory_listed("src:false:3:false").await);
        // Different parameters are a different listing
        assert!(!visited.was_directory_listed("src:true:3:false").await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let visited = VisitedState::new();
        let shared = visited.clone();

        visited.mark_file("lib.rs").await;
        assert!(shared.was_file_read("lib.rs").await);
    }

    #[tokio::test]
    async fn test_counts() {
        let visited = VisitedState::new();
        visited.mark_file("a").await;
        visited.mark_file("b").await;
        visited.mark_directory("d:false:3:false").await;
        visited.mark_pattern("*.rs:.:name").await;

        let counts = visited.counts().await;
        assert_eq!(counts.files, 2);
        assert_eq!(counts.directories, 1);
        assert_eq!(counts.patterns, 1);
    }
}
