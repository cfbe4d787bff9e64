//! ToolContext - execution context for tools
//!
//! One context per exploration run. All file operations are scoped to the
//! exploration root; tools cannot escape it unless sandboxing is
//! explicitly disabled.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::cache::FileCache;

use super::ToolError;
use super::visited::VisitedState;

/// Execution context for tools - scoped to a single exploration run
#[derive(Clone)]
pub struct ToolContext {
    /// Exploration root - all file ops constrained here
    pub root: PathBuf,

    /// Run ID (appears in logs and results)
    pub run_id: String,

    /// Dedup state shared across all steps of the run
    pub visited: VisitedState,

    /// Index over the root's file tree
    pub cache: Arc<FileCache>,

    /// Whether sandbox mode is enabled (default: true)
    pub sandbox_enabled: bool,
}

impl ToolContext {
    /// Create a new tool context
    pub fn new(root: PathBuf, run_id: String, cache: Arc<FileCache>) -> Self {
        debug!(?root, %run_id, "ToolContext::new: called");
        Self {
            root,
            run_id,
            visited: VisitedState::new(),
            cache,
            sandbox_enabled: true,
        }
    }

    /// Create a context with sandbox disabled (for testing)
    pub fn new_unsandboxed(root: PathBuf, run_id: String, cache: Arc<FileCache>) -> Self {
        debug!(?root, %run_id, "ToolContext::new_unsandboxed: called");
        Self {
            root,
            run_id,
            visited: VisitedState::new(),
            cache,
            sandbox_enabled: false,
        }
    }

    /// Normalize a path relative to the root
    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Validate path is within the root (sandbox enforcement)
    pub fn validate_path(&self, path: &Path) -> Result<PathBuf, ToolError> {
        debug!(?path, "ToolContext::validate_path: called");
        let normalized = self.normalize_path(path);

        if !self.sandbox_enabled {
            debug!("ToolContext::validate_path: sandbox disabled, returning normalized path");
            return Ok(normalized);
        }

        // Canonicalize existing paths to resolve symlinks before the
        // prefix check; nonexistent paths are checked as normalized
        let canonical = if normalized.exists() {
            normalized.canonicalize().unwrap_or_else(|_| normalized.clone())
        } else {
            normalized.clone()
        };

        let root_canonical = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());

        if canonical.starts_with(&root_canonical) {
            debug!("ToolContext::validate_path: path is within root");
            Ok(canonical)
        } else {
            debug!("ToolContext::validate_path: sandbox violation detected");
            Err(ToolError::SandboxViolation {
                path: path.to_path_buf(),
                root: self.root.clone(),
            })
        }
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("root", &self.root)
            .field("run_id", &self.run_id)
            .field("sandbox_enabled", &self.sandbox_enabled)
            .finish()
    }
}
