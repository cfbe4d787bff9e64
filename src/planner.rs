//! LLM-driven exploration planning
//!
//! Turns a user query plus the codebase fingerprint into an ordered list
//! of exploration steps. The model replies with JSON, usually inside a
//! markdown fence; anything that does not parse yields an empty plan
//! rather than an error, since a missing plan is recoverable and a dead
//! LLM connection is not.

use std::sync::Arc;

use eyre::{Result, eyre};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::prompts::{PlanContext, PromptLoader};

/// Ordered exploration steps for one query
#[derive(Debug, Clone)]
pub struct ExplorationPlan {
    pub steps: Vec<String>,
}

/// LLM output schema for a plan
#[derive(Debug, Deserialize)]
struct PlanOutput {
    #[serde(default)]
    steps: Vec<String>,
}

pub struct Planner {
    client: Arc<dyn LlmClient>,
    loader: PromptLoader,
    max_tokens: u32,
}

impl Planner {
    pub fn new(client: Arc<dyn LlmClient>, loader: PromptLoader, max_tokens: u32) -> Self {
        Self {
            client,
            loader,
            max_tokens,
        }
    }

    /// Ask the model for an exploration plan
    ///
    /// Transport failures are fatal. An unparseable response returns an
    /// empty step list for the caller to reject.
    pub async fn plan(&self, query: &str, fingerprint_json: &str) -> Result<ExplorationPlan> {
        info!(%query, "Planning exploration");

        let context = PlanContext {
            query: query.to_string(),
            fingerprint: fingerprint_json.to_string(),
        };
        let system_prompt = self.loader.render("plan", &context)?;

        let request = CompletionRequest {
            system_prompt,
            messages: vec![Message::user(
                "Create an exploration plan to answer the user's query based on the provided context.",
            )],
            tools: vec![],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| eyre!("Planning LLM call failed: {e}"))?;

        let content = response.content.unwrap_or_default();
        let steps = parse_plan_steps(&content);
        if steps.is_empty() {
            warn!("Planner response did not contain parseable steps");
        } else {
            debug!(steps = %steps.len(), "Planner::plan: parsed steps");
        }

        Ok(ExplorationPlan { steps })
    }
}

/// Pull the step list out of the model's reply
///
/// Accepts a fenced ```json block, a bare fenced block, or raw JSON.
fn parse_plan_steps(content: &str) -> Vec<String> {
    let candidate = Regex::new(r"(?si)```(?:json)?\s*(.*?)\s*```")
        .ok()
        .and_then(|fence| {
            fence
                .captures(content)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
        .unwrap_or_else(|| content.trim().to_string());

    match serde_json::from_str::<PlanOutput>(&candidate) {
        Ok(output) => output.steps,
        Err(e) => {
            debug!(error = %e, "parse_plan_steps: response was not plan JSON");
            Vec::new()
        }
    }
}
