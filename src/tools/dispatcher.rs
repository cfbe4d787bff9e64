//! ToolDispatcher - routes and executes tool calls for the exploration loop
//!
//! Every tool call passes through the same pipeline: typed argument parse,
//! registry lookup, dedup check against the run's VisitedState, execution,
//! and output compression for oversized results.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::compress::ContextCompressor;
use crate::llm::{ToolCall, ToolDefinition};

use super::args::ToolArgs;
use super::builtin::{
    CompletedTool, DetectLanguagesTool, FileTreeTool, FindFilesTool, GrepTool, ListDirectoryTool, ReadFileTool,
};
use super::{Tool, ToolContext};

/// Outcome content longer than this goes through the compressor
const OUTPUT_COMPRESS_THRESHOLD: usize = 3000;

/// Fallback truncation length when compression fails
const OUTPUT_FALLBACK_TRUNCATE: usize = 2000;

/// Result of dispatching one tool call
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Tool name as requested by the model
    pub tool: String,
    /// Raw arguments as requested by the model
    pub args: Value,
    /// Whether the call succeeded (dedup skips count as success)
    pub success: bool,
    /// Content for the tool_result block and the findings list
    pub content: String,
    /// Set when the completed tool ran, ends the step
    pub task_completed: bool,
}

impl ToolOutcome {
    fn success(tool: &str, args: Value, content: String) -> Self {
        Self {
            tool: tool.to_string(),
            args,
            success: true,
            content,
            task_completed: false,
        }
    }

    fn error(tool: &str, args: Value, content: String) -> Self {
        Self {
            tool: tool.to_string(),
            args,
            success: false,
            content,
            task_completed: false,
        }
    }
}

/// Routes tool calls to the builtin registry
pub struct ToolDispatcher {
    tools: HashMap<String, Box<dyn Tool>>,
    compressor: Arc<dyn ContextCompressor>,
}

impl ToolDispatcher {
    /// Create a dispatcher with the standard exploration tools
    pub fn standard(compressor: Arc<dyn ContextCompressor>) -> Self {
        let mut tools: HashMap<String, Box<dyn Tool>> = HashMap::new();

        // Navigation
        tools.insert("list_directory".into(), Box::new(ListDirectoryTool));
        tools.insert("get_file_tree".into(), Box::new(FileTreeTool));

        // Content
        tools.insert("read_file".into(), Box::new(ReadFileTool));
        tools.insert("grep".into(), Box::new(GrepTool));

        // Index-backed lookups
        tools.insert("find_files".into(), Box::new(FindFilesTool));
        tools.insert("detect_languages".into(), Box::new(DetectLanguagesTool));

        // Step completion
        tools.insert("completed".into(), Box::new(CompletedTool));

        Self { tools, compressor }
    }

    /// Create an empty dispatcher (for testing)
    pub fn empty(compressor: Arc<dyn ContextCompressor>) -> Self {
        Self {
            tools: HashMap::new(),
            compressor,
        }
    }

    /// Add a tool to the dispatcher
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get tool definitions for LLM requests, sorted by name for a stable order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Execute a single tool call
    ///
    /// Never returns Err: every failure mode becomes an error outcome so the
    /// step can report it to the model and keep going.
    pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> ToolOutcome {
        debug!(tool = %call.name, "ToolDispatcher::execute: called");

        let args = match ToolArgs::parse(&call.name, &call.input) {
            Ok(args) => args,
            Err(e) => {
                debug!(tool = %call.name, error = %e, "ToolDispatcher::execute: argument parse failed");
                return ToolOutcome::error(&call.name, call.input.clone(), e.to_string());
            }
        };

        let Some(tool) = self.tools.get(&call.name) else {
            return ToolOutcome::error(&call.name, call.input.clone(), format!("Unknown tool: {}", call.name));
        };

        if let Some(outcome) = self.check_dedup(&args, call, ctx).await {
            debug!(tool = %call.name, "ToolDispatcher::execute: dedup hit, skipping execution");
            return outcome;
        }

        let result = tool.execute(args.clone(), ctx).await;

        if !result.is_error {
            self.record_visit(&args, ctx).await;
        }

        let content = if result.content.chars().count() > OUTPUT_COMPRESS_THRESHOLD {
            debug!(tool = %call.name, len = %result.content.len(), "ToolDispatcher::execute: compressing oversized output");
            match self.compressor.compress_tool_output(&call.name, &result.content).await {
                Ok(compressed) => compressed,
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Tool output compression failed, truncating instead");
                    truncate_chars(&result.content, OUTPUT_FALLBACK_TRUNCATE)
                }
            }
        } else {
            result.content
        };

        ToolOutcome {
            tool: call.name.clone(),
            args: call.input.clone(),
            success: !result.is_error,
            content,
            task_completed: matches!(args, ToolArgs::Completed(_)) && !result.is_error,
        }
    }

    /// Execute multiple tool calls in order, correlated by call id
    pub async fn execute_all(&self, calls: &[ToolCall], ctx: &ToolContext) -> Vec<(String, ToolOutcome)> {
        let mut outcomes = Vec::with_capacity(calls.len());

        for call in calls {
            let outcome = self.execute(call, ctx).await;
            outcomes.push((call.id.clone(), outcome));
        }

        outcomes
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get registered tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Dedup policy: repeated file reads and identical directory listings
    /// are answered from guidance text instead of re-running
    async fn check_dedup(&self, args: &ToolArgs, call: &ToolCall, ctx: &ToolContext) -> Option<ToolOutcome> {
        match args {
            ToolArgs::ListDirectory(list_args) => {
                let signature = list_args.signature();
                if ctx.visited.was_directory_listed(&signature).await {
                    let counts = ctx.visited.counts().await;
                    return Some(ToolOutcome::success(
                        &call.name,
                        call.input.clone(),
                        already_listed_message(&list_args.path, counts.files, counts.directories),
                    ));
                }
            }
            ToolArgs::ReadFile(read_args) => {
                if ctx.visited.was_file_read(&read_args.path).await {
                    return Some(ToolOutcome::success(
                        &call.name,
                        call.input.clone(),
                        already_read_message(&read_args.path),
                    ));
                }
            }
            _ => {}
        }
        None
    }

    /// Record visited signatures after a successful execution
    async fn record_visit(&self, args: &ToolArgs, ctx: &ToolContext) {
        match args {
            ToolArgs::ListDirectory(list_args) => {
                ctx.visited.mark_directory(&list_args.signature()).await;
            }
            ToolArgs::ReadFile(read_args) => {
                ctx.visited.mark_file(&read_args.path).await;
            }
            ToolArgs::FindFiles(find_args) => {
                ctx.visited.mark_pattern(&find_args.signature()).await;
            }
            _ => {}
        }
    }
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::standard(Arc::new(crate::compress::NoopCompressor))
    }
}

/// Guidance returned instead of re-running an identical directory listing
fn already_listed_message(path: &str, files_analyzed: usize, directories_explored: usize) -> String {
    format!(
        "Directory '{path}' was already explored with these parameters.\n\n\
         Exploration history:\n\
         - Files analyzed so far: {files_analyzed}\n\
         - Directories explored: {directories_explored}\n\
         - This specific listing was already done\n\n\
         Recommendations:\n\
         - Try reading specific files from this directory\n\
         - Use find_files with different patterns\n\
         - Use grep to search for content within files\n\
         - Explore subdirectories individually"
    )
}

/// Guidance returned instead of re-reading a file
fn already_read_message(path: &str) -> String {
    let filename = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());

    format!(
        "File '{filename}' was already read in a previous iteration.\n\n\
         Key points about this file:\n\
         - Path: {path}\n\
         - Status: Previously analyzed and content collected\n\
         - Recommendation: Try exploring related files or use grep to search for specific patterns\n\n\
         Instead of re-reading this file, consider:\n\
         - Reading related files in the same directory\n\
         - Using grep to search for specific patterns across files\n\
         - Calling completed() if you have enough information"
    )
}

/// Truncate to at most `max` chars plus a marker, on a char boundary
fn truncate_chars(content: &str, max: usize) -> String {
    match content.char_indices().nth(max) {
        Some((idx, _)) => format!("{}\n... (truncated)", &content[..idx]),
        None => content.to_string(),
    }
}
