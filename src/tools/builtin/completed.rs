//! completed tool - step termination signal

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::tools::args::ToolArgs;
use crate::tools::{Tool, ToolContext, ToolResult};

/// Prefix on the tool's result content; the step loop strips it back off
/// to recover the bare summary.
pub const COMPLETION_PREFIX: &str = "Exploration step completed. Summary: ";

/// Marks the current exploration step finished
///
/// The dispatcher flags the outcome with task_completed when this tool
/// runs; the step loop exits on that flag.
pub struct CompletedTool;

#[async_trait]
impl Tool for CompletedTool {
    fn name(&self) -> &'static str {
        "completed"
    }

    fn description(&self) -> &'static str {
        "Mark this step as completed with a summary.\n\n\
         CALL THIS WHEN:\n\
         - You have gathered sufficient information for this step\n\
         - You've read relevant files and understand the structure\n\
         - Further exploration would be redundant\n\
         - You can answer the step's question\n\n\
         DO NOT explore endlessly. Call completed() to progress to the next step."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "A concise summary of findings for this step (2-4 sentences)"
                }
            },
            "required": ["summary"]
        })
    }

    async fn execute(&self, args: ToolArgs, _ctx: &ToolContext) -> ToolResult {
        let ToolArgs::Completed(args) = args else {
            return ToolResult::error("completed: argument type mismatch");
        };
        debug!(summary = %args.summary, "CompletedTool::execute: called");

        ToolResult::success(format!("{COMPLETION_PREFIX}{}", args.summary))
    }
}
