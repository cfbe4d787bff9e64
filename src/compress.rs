//! Context compression for the exploration loop
//!
//! Long-running steps accumulate tool output faster than a model can
//! usefully attend to it. The compressor squeezes oversized tool results
//! and the accumulated findings list through an extra LLM call so the
//! conversation stays within budget.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::PromptLoader;

/// Compress accumulated context every N iterations
pub const COMPRESS_EVERY_N: usize = 3;

/// Compress accumulated context once it exceeds this many chars
pub const CONTEXT_SIZE_LIMIT: usize = 10_000;

/// Compress accumulated context on every iteration past this one
pub const LATE_ITERATION: usize = 8;

/// Only the most recent findings feed into context compression
const FINDINGS_WINDOW: usize = 20;

/// Tool output is capped before being sent for compression
const OUTPUT_INPUT_CAP: usize = 50_000;

/// Snapshot of a step's accumulated state, taken when compression triggers
#[derive(Debug, Clone)]
pub struct CompressionSnapshot {
    pub findings: Vec<String>,
    pub files_explored: usize,
    pub directories_explored: usize,
    pub iteration: usize,
    pub max_iterations: usize,
}

/// Compresses tool output and accumulated step context
///
/// `should_compress` is consulted once per iteration by the step executor;
/// `compress_tool_output` is invoked by the dispatcher for oversized
/// results regardless of the trigger. Both LLM paths return `Err` on
/// failure and leave the fallback policy to the caller.
#[async_trait]
pub trait ContextCompressor: Send + Sync {
    /// Whether accumulated context should be compressed this iteration
    fn should_compress(&self, iteration: usize, context_size: usize) -> bool;

    /// Compress one oversized tool output into a short technical summary
    async fn compress_tool_output(&self, tool: &str, output: &str) -> Result<String, LlmError>;

    /// Compress the step's accumulated findings into a strategic summary
    async fn compress_context(&self, snapshot: &CompressionSnapshot) -> Result<String, LlmError>;
}

/// Template context for the tool-output mode of compress.pmt
#[derive(Debug, Serialize)]
struct ToolOutputContext<'a> {
    is_tool_output: bool,
    llm_response: String,
    tool_use: String,
    tool_output: &'a str,
}

/// Template context for the accumulated-context mode of compress.pmt
#[derive(Debug, Serialize)]
struct AccumulatedContext {
    is_tool_output: bool,
    iteration: usize,
    max_iterations: usize,
    files_explored: usize,
    directories_explored: usize,
    findings: String,
}

/// LLM-backed compressor used for real exploration runs
pub struct LlmCompressor {
    client: Arc<dyn LlmClient>,
    loader: PromptLoader,
    max_tokens: u32,
}

impl LlmCompressor {
    pub fn new(client: Arc<dyn LlmClient>, loader: PromptLoader, max_tokens: u32) -> Self {
        debug!(%max_tokens, "LlmCompressor::new: called");
        Self {
            client,
            loader,
            max_tokens,
        }
    }

    async fn call(&self, system_prompt: String, instruction: &str) -> Result<String, LlmError> {
        debug!(system_len = %system_prompt.len(), "LlmCompressor::call: called");
        let request = CompletionRequest {
            system_prompt,
            messages: vec![Message::user(instruction)],
            tools: vec![],
            max_tokens: self.max_tokens,
        };

        let response = self.client.complete(request).await?;
        response
            .content
            .ok_or_else(|| LlmError::InvalidResponse("Compression response had no text content".to_string()))
    }
}

#[async_trait]
impl ContextCompressor for LlmCompressor {
    fn should_compress(&self, iteration: usize, context_size: usize) -> bool {
        let due = iteration % COMPRESS_EVERY_N == 0;
        let oversized = context_size > CONTEXT_SIZE_LIMIT;
        let late = iteration > LATE_ITERATION;
        debug!(%iteration, %context_size, %due, %oversized, %late, "LlmCompressor::should_compress: called");
        due || oversized || late
    }

    async fn compress_tool_output(&self, tool: &str, output: &str) -> Result<String, LlmError> {
        debug!(%tool, output_len = %output.len(), "LlmCompressor::compress_tool_output: called");

        let ctx = ToolOutputContext {
            is_tool_output: true,
            llm_response: format!("Used {}", tool),
            tool_use: format!("Tool: {}", tool),
            tool_output: cap_chars(output, OUTPUT_INPUT_CAP),
        };
        let system = self
            .loader
            .render("compress", &ctx)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to render compress template: {}", e)))?;

        self.call(system, "Compress this tool interaction.").await
    }

    async fn compress_context(&self, snapshot: &CompressionSnapshot) -> Result<String, LlmError> {
        debug!(
            iteration = %snapshot.iteration,
            finding_count = %snapshot.findings.len(),
            "LlmCompressor::compress_context: called"
        );

        let findings = if snapshot.findings.is_empty() {
            "No findings yet".to_string()
        } else {
            let start = snapshot.findings.len().saturating_sub(FINDINGS_WINDOW);
            snapshot.findings[start..].join("\n")
        };

        let ctx = AccumulatedContext {
            is_tool_output: false,
            iteration: snapshot.iteration,
            max_iterations: snapshot.max_iterations,
            files_explored: snapshot.files_explored,
            directories_explored: snapshot.directories_explored,
            findings,
        };
        let system = self
            .loader
            .render("compress", &ctx)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to render compress template: {}", e)))?;

        self.call(system, "Compress the accumulated exploration context.").await
    }
}

/// Compressor that never triggers and passes tool output through unchanged
///
/// Used for plan-only runs and tests, where there is no LLM budget to spend
/// on compression.
pub struct NoopCompressor;

#[async_trait]
impl ContextCompressor for NoopCompressor {
    fn should_compress(&self, _iteration: usize, _context_size: usize) -> bool {
        false
    }

    async fn compress_tool_output(&self, _tool: &str, output: &str) -> Result<String, LlmError> {
        debug!("NoopCompressor::compress_tool_output: passing through");
        Ok(output.to_string())
    }

    async fn compress_context(&self, _snapshot: &CompressionSnapshot) -> Result<String, LlmError> {
        debug!("NoopCompressor::compress_context: passing through");
        Ok(String::new())
    }
}

/// Truncate to at most `max` chars on a char boundary
fn cap_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
