//! Inner LLM+tool loop for a single plan step
//!
//! One executor instance drives one step: it alternates model turns and
//! tool dispatch until the step completes or the iteration budget runs
//! out. Completion is checked in a fixed priority order per iteration:
//! plain-text final answer, `completed()` call, stagnation guard, then
//! the findings cap.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::compress::{CompressionSnapshot, ContextCompressor};
use crate::llm::{CompletionRequest, ContentBlock, LlmClient, Message};
use crate::tools::builtin::COMPLETION_PREFIX;
use crate::tools::{ToolContext, ToolDispatcher};

use super::context::{LlmFailure, StepCompletion, StepContext, MAX_STEP_FINDINGS};
use super::guard::LoopGuard;

pub struct StepExecutor {
    client: Arc<dyn LlmClient>,
    dispatcher: Arc<ToolDispatcher>,
    compressor: Arc<dyn ContextCompressor>,
    system_prompt: String,
    model: String,
    max_tokens: u32,
    /// Effective bound: the smaller of the per-step cap and the global cap
    max_iterations: usize,
}

impl StepExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Arc<dyn LlmClient>,
        dispatcher: Arc<ToolDispatcher>,
        compressor: Arc<dyn ContextCompressor>,
        system_prompt: String,
        model: String,
        max_tokens: u32,
        step_max_iterations: usize,
        global_max_iterations: usize,
    ) -> Self {
        Self {
            client,
            dispatcher,
            compressor,
            system_prompt,
            model,
            max_tokens,
            max_iterations: step_max_iterations.min(global_max_iterations),
        }
    }

    /// Run the loop, mutating `step` and `conversation` in place
    ///
    /// Never fails: an LLM transport error is recorded on the step and the
    /// loop aborts, leaving classification to the caller.
    pub async fn run(&self, step: &mut StepContext, conversation: &mut Vec<Message>, ctx: &ToolContext) {
        let mut guard = LoopGuard::new();

        for iteration in 1..=self.max_iterations {
            step.iterations = iteration;
            debug!(step = %step.step_number, %iteration, "StepExecutor::run: iteration start");

            if self.compressor.should_compress(iteration, step.context_size()) {
                let counts = ctx.visited.counts().await;
                let snapshot = CompressionSnapshot {
                    findings: step.findings.clone(),
                    files_explored: counts.files,
                    directories_explored: counts.directories,
                    iteration,
                    max_iterations: self.max_iterations,
                };
                match self.compressor.compress_context(&snapshot).await {
                    Ok(compressed) => {
                        debug!(step = %step.step_number, chars = %compressed.len(), "StepExecutor::run: context compressed");
                        step.compressed_context = Some(compressed);
                    }
                    Err(e) => {
                        warn!(error = %e, "Context compression failed, continuing uncompressed");
                    }
                }
            }

            if iteration > 1 {
                conversation.push(Message::user(format!(
                    "Iteration {iteration}. Continue exploring or call completed() if you have gathered sufficient information."
                )));
            }

            let request = CompletionRequest {
                system_prompt: self.system_prompt.clone(),
                messages: conversation.clone(),
                tools: self.dispatcher.definitions(),
                max_tokens: self.max_tokens,
            };

            let response = match self.client.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(step = %step.step_number, %iteration, error = %e, "LLM call failed, aborting step");
                    step.llm_error = Some(LlmFailure {
                        error: e.to_string(),
                        step: step.step_number,
                        iteration,
                        model: self.model.clone(),
                        timestamp: Utc::now(),
                    });
                    break;
                }
            };

            let mut blocks = Vec::new();
            if let Some(text) = &response.content {
                if !text.is_empty() {
                    blocks.push(ContentBlock::text(text.clone()));
                }
            }
            for call in &response.tool_calls {
                blocks.push(ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.input.clone(),
                });
            }
            conversation.push(Message::assistant_blocks(blocks));

            if response.tool_calls.is_empty() {
                step.summary = response.content.unwrap_or_default();
                step.complete(StepCompletion::FinalAnswer);
                info!(step = %step.step_number, %iteration, "Step answered in text without tool calls");
                break;
            }

            let outcomes = self.dispatcher.execute_all(&response.tool_calls, ctx).await;

            let mut result_blocks = Vec::with_capacity(outcomes.len());
            let mut done_summary: Option<String> = None;
            for (call_id, outcome) in outcomes {
                result_blocks.push(ContentBlock::tool_result(call_id, outcome.content.clone(), !outcome.success));
                if !outcome.success {
                    step.tool_errors.push(format!("{}: {}", outcome.tool, outcome.content));
                }
                if outcome.task_completed {
                    done_summary = Some(outcome.content.trim_start_matches(COMPLETION_PREFIX).to_string());
                }
                step.findings.push(outcome.content.clone());
                step.tool_results.push(outcome);
            }
            conversation.push(Message::user_blocks(result_blocks));

            let signature = LoopGuard::signature(&response.tool_calls);
            step.search_history.push(signature.clone());
            let looping = guard.record(signature);

            if let Some(summary) = done_summary {
                step.summary = summary;
                step.complete(StepCompletion::DoneTool);
                info!(step = %step.step_number, %iteration, "Step completed via completed()");
                break;
            }

            if looping {
                warn!(step = %step.step_number, %iteration, "Redundant tool-call loop detected, auto-completing step");
                step.summary = "Auto-completed: detected redundant loop of identical tool calls".to_string();
                step.complete(StepCompletion::RedundantLoop);
                break;
            }

            if step.findings.len() > MAX_STEP_FINDINGS {
                warn!(step = %step.step_number, findings = %step.findings.len(), "Findings cap reached, auto-completing step");
                step.summary = format!("Explored step with {} findings", step.findings.len());
                step.complete(StepCompletion::FindingsCap);
                break;
            }
        }

        // A step always ends marked completed, even after an aborted loop
        if !step.completed {
            if step.llm_error.is_none() {
                step.complete(StepCompletion::IterationCap);
            } else {
                step.completed = true;
            }
            if step.summary.is_empty() {
                step.summary = format!("Completed step after {} iterations", self.max_iterations);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::cache::FileCache;
    use crate::compress::{LlmCompressor, NoopCompressor};
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, StopReason, TokenUsage, ToolCall};
    use crate::prompts::PromptLoader;

    fn ctx_for(temp: &TempDir) -> ToolContext {
        let root = temp.path().to_path_buf();
        let cache = Arc::new(FileCache::new(root.clone()));
        ToolContext::new(root, "test".to_string(), cache)
    }

    fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            content: Some(text.to_string()),
            tool_calls: vec![],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    fn tool_response(calls: Vec<(&str, serde_json::Value)>) -> CompletionResponse {
        let tool_calls = calls
            .into_iter()
            .enumerate()
            .map(|(i, (name, input))| ToolCall {
                id: format!("toolu_{i:03}"),
                name: name.to_string(),
                input,
            })
            .collect();
        CompletionResponse {
            content: None,
            tool_calls,
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
        }
    }

    fn executor(responses: Vec<CompletionResponse>, step_max: usize) -> StepExecutor {
        StepExecutor::new(
            Arc::new(MockLlmClient::new(responses)),
            Arc::new(ToolDispatcher::standard(Arc::new(NoopCompressor))),
            Arc::new(NoopCompressor),
            "You explore codebases.".to_string(),
            "test-model".to_string(),
            4096,
            step_max,
            25,
        )
    }

    fn conversation() -> Vec<Message> {
        vec![Message::user(
            "Step 1/1: Find the entry point\n\nPlease explore this step and call completed() when you have sufficient information.",
        )]
    }

    #[tokio::test]
    async fn test_text_without_tools_is_final_answer() {
        let temp = TempDir::new().unwrap();
        let exec = executor(vec![text_response("The entry point is src/main.rs.")], 10);

        let mut step = StepContext::new(1, "Find the entry point");
        let mut conv = conversation();
        exec.run(&mut step, &mut conv, &ctx_for(&temp)).await;

        assert!(step.completed);
        assert_eq!(step.completion, Some(StepCompletion::FinalAnswer));
        assert_eq!(step.summary, "The entry point is src/main.rs.");
        assert_eq!(step.iterations, 1);
        // initial user message plus the assistant turn
        assert_eq!(conv.len(), 2);
    }

    #[tokio::test]
    async fn test_completed_tool_ends_step_with_summary() {
        let temp = TempDir::new().unwrap();
        let exec = executor(
            vec![tool_response(vec![(
                "completed",
                json!({"summary": "found it in src/main.rs"}),
            )])],
            10,
        );

        let mut step = StepContext::new(1, "Find the entry point");
        let mut conv = conversation();
        exec.run(&mut step, &mut conv, &ctx_for(&temp)).await;

        assert_eq!(step.completion, Some(StepCompletion::DoneTool));
        assert_eq!(step.summary, "found it in src/main.rs");
        assert_eq!(step.iterations, 1);
        assert_eq!(step.findings.len(), 1);
        assert!(step.tool_errors.is_empty());
        // initial user, assistant tool use, user tool results
        assert_eq!(conv.len(), 3);
    }

    #[tokio::test]
    async fn test_redundant_loop_trips_on_third_identical_iteration() {
        let temp = TempDir::new().unwrap();
        let same = || tool_response(vec![("list_directory", json!({"path": "."}))]);
        let exec = executor(vec![same(), same(), same()], 10);

        let mut step = StepContext::new(1, "Look around");
        let mut conv = conversation();
        exec.run(&mut step, &mut conv, &ctx_for(&temp)).await;

        assert_eq!(step.completion, Some(StepCompletion::RedundantLoop));
        assert_eq!(step.iterations, 3);
        assert_eq!(
            step.summary,
            "Auto-completed: detected redundant loop of identical tool calls"
        );
        assert_eq!(step.search_history.len(), 3);
        assert_eq!(step.search_history[0], step.search_history[2]);
    }

    #[tokio::test]
    async fn test_iteration_cap_closes_step() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("main.rs"), "fn main() {}\n").unwrap();
        let exec = executor(
            vec![
                tool_response(vec![("find_files", json!({"pattern": "*.rs"}))]),
                tool_response(vec![("find_files", json!({"pattern": "*.toml"}))]),
            ],
            2,
        );

        let mut step = StepContext::new(1, "Inventory the sources");
        let mut conv = conversation();
        exec.run(&mut step, &mut conv, &ctx_for(&temp)).await;

        assert_eq!(step.completion, Some(StepCompletion::IterationCap));
        assert_eq!(step.iterations, 2);
        assert_eq!(step.summary, "Completed step after 2 iterations");
        assert_eq!(step.findings.len(), 2);
    }

    #[tokio::test]
    async fn test_llm_failure_records_error_and_force_completes() {
        let temp = TempDir::new().unwrap();
        let exec = executor(vec![], 10);

        let mut step = StepContext::new(3, "Doomed step");
        let mut conv = conversation();
        exec.run(&mut step, &mut conv, &ctx_for(&temp)).await;

        let failure = step.llm_error.as_ref().unwrap();
        assert_eq!(failure.step, 3);
        assert_eq!(failure.iteration, 1);
        assert_eq!(failure.model, "test-model");
        assert!(failure.error.contains("No more mock responses"));

        assert!(step.completed);
        assert_eq!(step.completion, None);
        assert_eq!(step.summary, "Completed step after 10 iterations");
    }

    #[tokio::test]
    async fn test_findings_cap_auto_completes() {
        let temp = TempDir::new().unwrap();
        let calls: Vec<(&str, serde_json::Value)> = (0..31)
            .map(|i| ("find_files", json!({"pattern": format!("*.{i}")})))
            .collect();
        let exec = executor(vec![tool_response(calls)], 10);

        let mut step = StepContext::new(1, "Exhaustive sweep");
        let mut conv = conversation();
        exec.run(&mut step, &mut conv, &ctx_for(&temp)).await;

        assert_eq!(step.completion, Some(StepCompletion::FindingsCap));
        assert_eq!(step.iterations, 1);
        assert_eq!(step.findings.len(), 31);
        assert_eq!(step.summary, "Explored step with 31 findings");
    }

    #[tokio::test]
    async fn test_failed_tool_call_is_recorded_and_loop_continues() {
        let temp = TempDir::new().unwrap();
        let exec = executor(
            vec![
                tool_response(vec![("read_file", json!({"path": "missing.rs"}))]),
                tool_response(vec![("completed", json!({"summary": "nothing to read"}))]),
            ],
            10,
        );

        let mut step = StepContext::new(1, "Read the config");
        let mut conv = conversation();
        exec.run(&mut step, &mut conv, &ctx_for(&temp)).await;

        assert_eq!(step.completion, Some(StepCompletion::DoneTool));
        assert_eq!(step.tool_errors.len(), 1);
        assert!(step.tool_errors[0].starts_with("read_file: "));
        assert_eq!(step.iterations, 2);
    }

    #[tokio::test]
    async fn test_context_compression_stores_compressed_state() {
        let temp = TempDir::new().unwrap();
        let compressor = LlmCompressor::new(
            Arc::new(MockLlmClient::new(vec![text_response(
                "Compressed: swept three file patterns",
            )])),
            PromptLoader::embedded_only(),
            1000,
        );
        let exec = StepExecutor::new(
            Arc::new(MockLlmClient::new(vec![
                tool_response(vec![("find_files", json!({"pattern": "*.rs"}))]),
                tool_response(vec![("find_files", json!({"pattern": "*.toml"}))]),
                tool_response(vec![("find_files", json!({"pattern": "*.md"}))]),
            ])),
            Arc::new(ToolDispatcher::standard(Arc::new(NoopCompressor))),
            Arc::new(compressor),
            "You explore codebases.".to_string(),
            "test-model".to_string(),
            4096,
            3,
            25,
        );

        let mut step = StepContext::new(1, "Inventory the sources");
        let mut conv = conversation();
        exec.run(&mut step, &mut conv, &ctx_for(&temp)).await;

        // trigger fires on the third iteration
        assert_eq!(
            step.compressed_context.as_deref(),
            Some("Compressed: swept three file patterns")
        );
        assert_eq!(step.completion, Some(StepCompletion::IterationCap));
    }

    #[tokio::test]
    async fn test_continuation_nudge_added_after_first_iteration() {
        let temp = TempDir::new().unwrap();
        let exec = executor(
            vec![
                tool_response(vec![("find_files", json!({"pattern": "*.rs"}))]),
                text_response("Nothing else to see."),
            ],
            10,
        );

        let mut step = StepContext::new(1, "Look around");
        let mut conv = conversation();
        exec.run(&mut step, &mut conv, &ctx_for(&temp)).await;

        let nudges: Vec<&Message> = conv
            .iter()
            .filter(|m| matches!(&m.content, crate::llm::MessageContent::Text(t) if t.starts_with("Iteration 2.")))
            .collect();
        assert_eq!(nudges.len(), 1);
        assert_eq!(step.completion, Some(StepCompletion::FinalAnswer));
        assert_eq!(step.iterations, 2);
    }
}
