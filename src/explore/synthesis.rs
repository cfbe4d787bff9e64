//! Final synthesis over all completed steps

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::llm::{CompletionRequest, LlmClient, Message, StreamChunk};

use super::context::StepContext;

/// Combines per-step summaries into one narrative answer
///
/// Synthesis is best-effort: any failure falls back to a deterministic
/// concatenation of the step summaries so a run always produces output.
pub struct Synthesizer {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
    live_output: Option<mpsc::Sender<StreamChunk>>,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self {
            client,
            max_tokens,
            live_output: None,
        }
    }

    /// Stream synthesis chunks to the given channel as they arrive
    pub fn with_live_output(mut self, chunk_tx: mpsc::Sender<StreamChunk>) -> Self {
        self.live_output = Some(chunk_tx);
        self
    }

    pub async fn synthesize(
        &self,
        query: &str,
        system_prompt: String,
        steps: &[StepContext],
        total_findings: usize,
    ) -> String {
        debug!(steps = %steps.len(), %total_findings, "Synthesizer::synthesize: called");

        let mut content = format!(
            "Please synthesize the results from this multi-step exploration:\n\nORIGINAL QUERY: {query}\n\nEXPLORATION STEPS COMPLETED:\n"
        );
        for step in steps {
            content.push_str(&format!(
                "\nStep {}: {}\n- Summary: {}\n- Findings: {} items\n",
                step.step_number,
                step.description,
                step.summary,
                step.findings.len()
            ));
        }
        content.push_str(&format!(
            "\nTOTAL FINDINGS ACROSS ALL STEPS: {total_findings}\n\nPlease provide a comprehensive synthesis that addresses the original query."
        ));

        let request = CompletionRequest {
            system_prompt,
            messages: vec![Message::user(content)],
            tools: vec![],
            max_tokens: self.max_tokens,
        };

        let result = match &self.live_output {
            Some(chunk_tx) => self.client.stream(request, chunk_tx.clone()).await,
            None => self.client.complete(request).await,
        };

        match result {
            Ok(response) => response
                .content
                .unwrap_or_else(|| "Failed to synthesize results".to_string()),
            Err(e) => {
                warn!(error = %e, "Synthesis call failed, falling back to step summaries");
                fallback_synthesis(steps)
            }
        }
    }
}

/// Plain concatenation of step summaries, used when the LLM call fails
fn fallback_synthesis(steps: &[StepContext]) -> String {
    let mut text = format!("Based on {} exploration steps:\n\n", steps.len());
    for step in steps {
        text.push_str(&format!("Step {}: {}\n\n", step.step_number, step.summary));
    }
    text
}
