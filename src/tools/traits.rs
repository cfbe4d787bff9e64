//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::args::ToolArgs;
use super::context::ToolContext;

/// A tool that can be called by the LLM
///
/// Arguments arrive pre-validated: the dispatcher parses the raw JSON into
/// the tool's typed struct before execute is called, so implementations
/// never see malformed input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches LLM tool_use name)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool
    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> ToolResult;
}

/// Result of a tool execution
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Into<String>) -> Self {
        debug!("ToolResult::success: called");
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(content: impl Into<String>) -> Self {
        debug!("ToolResult::error: called");
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("Found 3 items in src:");
        assert!(!result.is_error);
        assert_eq!(result.content, "Found 3 items in src:");
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("File not found");
        assert!(result.is_error);
        assert_eq!(result.content, "File not found");
    }
}
