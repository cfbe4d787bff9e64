//! Outer exploration loop
//!
//! Drives the whole run: renders the system prompts once, executes each
//! plan step with a fresh [`StepExecutor`], then synthesizes the answer
//! and classifies how the run ended.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::compress::ContextCompressor;
use crate::llm::{LlmClient, Message, StreamChunk};
use crate::planner::ExplorationPlan;
use crate::prompts::{FingerprintContext, PromptLoader, embedded};
use crate::scan::Fingerprint;
use crate::tools::{ToolContext, ToolDispatcher};

use super::context::{ExplorationResult, GlobalContext, PhaseRecord, StepContext, TerminationReason};
use super::error::ExploreError;
use super::step::StepExecutor;
use super::synthesis::Synthesizer;

/// Tunables for one exploration run
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Model identifier recorded in error reports
    pub model: String,
    pub max_tokens: u32,
    /// Global iteration budget across all steps
    pub max_iterations: usize,
    /// Iteration budget for any single step
    pub step_max_iterations: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 16384,
            max_iterations: 25,
            step_max_iterations: 10,
        }
    }
}

pub struct ExplorationOrchestrator {
    client: Arc<dyn LlmClient>,
    dispatcher: Arc<ToolDispatcher>,
    compressor: Arc<dyn ContextCompressor>,
    prompts: PromptLoader,
    config: OrchestratorConfig,
    live_output: Option<mpsc::Sender<StreamChunk>>,
}

impl ExplorationOrchestrator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        dispatcher: Arc<ToolDispatcher>,
        compressor: Arc<dyn ContextCompressor>,
        prompts: PromptLoader,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            client,
            dispatcher,
            compressor,
            prompts,
            config,
            live_output: None,
        }
    }

    /// Stream the synthesis answer to the given channel as it generates
    pub fn with_live_output(mut self, chunk_tx: mpsc::Sender<StreamChunk>) -> Self {
        self.live_output = Some(chunk_tx);
        self
    }

    /// Execute every plan step, then synthesize and classify the run
    ///
    /// `prior_phases` carries timing records from phases that ran before
    /// the orchestrator (fingerprinting, planning); exploration and
    /// synthesis records are appended to them.
    pub async fn run(
        &self,
        query: &str,
        plan: &ExplorationPlan,
        fingerprint: &Fingerprint,
        ctx: &ToolContext,
        prior_phases: Vec<PhaseRecord>,
    ) -> Result<ExplorationResult, ExploreError> {
        if plan.steps.is_empty() {
            return Err(ExploreError::EmptyPlan);
        }

        let fingerprint_json =
            serde_json::to_string_pretty(fingerprint).unwrap_or_else(|_| "{}".to_string());

        let system_prompt = match self
            .prompts
            .render("explore", &FingerprintContext::new(fingerprint_json.clone()))
        {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Failed to render exploration prompt, using embedded text");
                embedded::EXPLORE.to_string()
            }
        };

        let mut global = GlobalContext::new(query, plan.steps.clone());
        let mut phases = prior_phases;

        let exploration_start = Instant::now();
        for (idx, description) in plan.steps.iter().enumerate() {
            let step_number = idx + 1;
            info!(step = %step_number, total = %global.total_steps, %description, "Starting exploration step");

            let executor = StepExecutor::new(
                self.client.clone(),
                self.dispatcher.clone(),
                self.compressor.clone(),
                system_prompt.clone(),
                self.config.model.clone(),
                self.config.max_tokens,
                self.config.step_max_iterations,
                self.config.max_iterations,
            );

            let mut step = StepContext::new(step_number, description.clone());
            let mut conversation = vec![Message::user(format!(
                "Step {step_number}/{total}: {description}\n\nPlease explore this step and call completed() when you have sufficient information.",
                total = global.total_steps
            ))];

            let step_start = Instant::now();
            executor.run(&mut step, &mut conversation, ctx).await;
            step.duration = step_start.elapsed().as_secs_f64();

            info!(
                step = %step_number,
                iterations = %step.iterations,
                findings = %step.findings.len(),
                "Step finished"
            );

            global.total_iterations += step.iterations;
            global.step_contexts.push(step);
            global.completed_steps += 1;

            // Brief pause between steps
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        phases.push(PhaseRecord::new("exploration", exploration_start.elapsed()));

        let synthesis_system = match self
            .prompts
            .render("synthesis", &FingerprintContext::new(fingerprint_json))
        {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Failed to render synthesis prompt, using embedded text");
                embedded::SYNTHESIS.to_string()
            }
        };

        let mut synthesizer = Synthesizer::new(self.client.clone(), self.config.max_tokens);
        if let Some(chunk_tx) = &self.live_output {
            synthesizer = synthesizer.with_live_output(chunk_tx.clone());
        }

        let synthesis_start = Instant::now();
        let architecture = synthesizer
            .synthesize(query, synthesis_system, &global.step_contexts, global.total_findings())
            .await;
        phases.push(PhaseRecord::new("synthesis", synthesis_start.elapsed()));

        let termination_reason = TerminationReason::classify(&global, self.config.max_iterations);
        info!(
            reason = %termination_reason.as_str(),
            steps = %global.completed_steps,
            iterations = %global.total_iterations,
            "Exploration finished"
        );

        Ok(ExplorationResult {
            query: query.to_string(),
            fingerprint: fingerprint.clone(),
            architecture,
            execution_time: global.start.elapsed().as_secs_f64(),
            phases_executed: phases,
            termination_reason,
            error: global.first_llm_error().map(|f| {
                format!(
                    "LLM call failed in step {}, iteration {}: {}",
                    f.step, f.iteration, f.error
                )
            }),
            tool_errors: global.all_tool_errors(),
        })
    }
}
