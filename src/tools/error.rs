//! Tool error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during tool dispatch
///
/// All of these are call-scoped: they surface as error results in the
/// conversation and never abort the exploration step.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Path {path} escapes exploration root {root}")]
    SandboxViolation { path: PathBuf, root: PathBuf },
}

impl ToolError {
    /// Invalid-arguments constructor used at the dispatch boundary
    pub fn invalid_arguments(tool: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::InvalidArguments {
            tool: tool.into(),
            message: message.into(),
        }
    }
}
