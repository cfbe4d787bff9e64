//! read_file tool - read file contents

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::tools::args::ToolArgs;
use crate::tools::{Tool, ToolContext, ToolResult};

/// Content longer than this is cut before it reaches the conversation
const MAX_CONTENT_CHARS: usize = 5000;

/// Read the contents of a file
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read contents of a file. Large files are truncated."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path to read"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> ToolResult {
        let ToolArgs::ReadFile(args) = args else {
            return ToolResult::error("read_file: argument type mismatch");
        };
        debug!(?args, "ReadFileTool::execute: called");

        let full_path = match ctx.validate_path(Path::new(&args.path)) {
            Ok(p) => {
                debug!(?p, "ReadFileTool::execute: path validated");
                p
            }
            Err(e) => {
                debug!(%e, "ReadFileTool::execute: path validation failed");
                return ToolResult::error(e.to_string());
            }
        };

        if !full_path.exists() {
            debug!("ReadFileTool::execute: file not found");
            return ToolResult::error(format!("File not found: {}", args.path));
        }
        if !full_path.is_file() {
            debug!("ReadFileTool::execute: path is not a file");
            return ToolResult::error(format!("Path is not a file: {}", args.path));
        }

        let bytes = match tokio::fs::read(&full_path).await {
            Ok(b) => {
                debug!(len = %b.len(), "ReadFileTool::execute: file read");
                b
            }
            Err(e) => {
                debug!(%e, "ReadFileTool::execute: read failed");
                return ToolResult::error(format!("Error reading file: {}", e));
            }
        };

        let content = String::from_utf8_lossy(&bytes);
        let content = truncate_chars(&content, MAX_CONTENT_CHARS);

        ToolResult::success(format!("Content of {}:\n{}", args.path, content))
    }
}

/// Keep the first `max` characters, appending a marker when anything was cut
fn truncate_chars(content: &str, max: usize) -> String {
    match content.char_indices().nth(max) {
        Some((boundary, _)) => {
            debug!(%max, "truncate_chars: content truncated");
            format!("{}\n... (truncated)", &content[..boundary])
        }
        None => content.to_string(),
    }
}
