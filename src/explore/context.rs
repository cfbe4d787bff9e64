//! Per-step and cross-step exploration state
//!
//! A `StepContext` accumulates everything one plan step produced: tool
//! outcomes, findings, errors, and how the step ended. `GlobalContext`
//! aggregates the finished steps so termination can be classified over
//! the whole run rather than any single step.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scan::Fingerprint;
use crate::tools::ToolOutcome;

/// A step auto-completes once it has collected more findings than this.
pub const MAX_STEP_FINDINGS: usize = 30;

/// A run terminates early once findings across all steps exceed this.
pub const MAX_RUN_FINDINGS: usize = 50;

/// How a single plan step reached completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCompletion {
    /// The model answered in plain text without requesting any tools
    FinalAnswer,
    /// The model called `completed()` with a summary
    DoneTool,
    /// The stagnation guard tripped on repeated identical tool calls
    RedundantLoop,
    /// The step exceeded [`MAX_STEP_FINDINGS`]
    FindingsCap,
    /// The inner loop ran out of iterations
    IterationCap,
}

/// Record of an LLM transport failure during a step
#[derive(Debug, Clone, Serialize)]
pub struct LlmFailure {
    pub error: String,
    pub step: usize,
    pub iteration: usize,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// Accumulated state for one plan step
#[derive(Debug)]
pub struct StepContext {
    pub step_number: usize,
    pub description: String,
    pub tool_results: Vec<ToolOutcome>,
    pub findings: Vec<String>,
    /// Tool-call signatures in issue order, one per iteration
    pub search_history: Vec<String>,
    pub iterations: usize,
    pub completed: bool,
    /// `None` when the step was force-closed after an LLM failure
    pub completion: Option<StepCompletion>,
    pub summary: String,
    pub duration: f64,
    pub llm_error: Option<LlmFailure>,
    pub tool_errors: Vec<String>,
    pub compressed_context: Option<String>,
}

impl StepContext {
    pub fn new(step_number: usize, description: impl Into<String>) -> Self {
        Self {
            step_number,
            description: description.into(),
            tool_results: Vec::new(),
            findings: Vec::new(),
            search_history: Vec::new(),
            iterations: 0,
            completed: false,
            completion: None,
            summary: String::new(),
            duration: 0.0,
            llm_error: None,
            tool_errors: Vec::new(),
            compressed_context: None,
        }
    }

    /// Mark the step finished with the given completion kind
    pub fn complete(&mut self, completion: StepCompletion) {
        self.completed = true;
        self.completion = Some(completion);
    }

    /// Rough size of the accumulated context, used to decide when to compress
    pub fn context_size(&self) -> usize {
        format!("{:?}", self.findings).len() + format!("{:?}", self.tool_results).len()
    }
}

/// State spanning all steps of one exploration run
#[derive(Debug)]
pub struct GlobalContext {
    pub query: String,
    pub steps: Vec<String>,
    pub step_contexts: Vec<StepContext>,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub total_iterations: usize,
    pub start: Instant,
}

impl GlobalContext {
    pub fn new(query: impl Into<String>, steps: Vec<String>) -> Self {
        let total_steps = steps.len();
        Self {
            query: query.into(),
            steps,
            step_contexts: Vec::new(),
            total_steps,
            completed_steps: 0,
            total_iterations: 0,
            start: Instant::now(),
        }
    }

    /// Findings summed over every finished step
    pub fn total_findings(&self) -> usize {
        self.step_contexts.iter().map(|s| s.findings.len()).sum()
    }

    /// The earliest recorded LLM failure, if any step hit one
    pub fn first_llm_error(&self) -> Option<&LlmFailure> {
        self.step_contexts.iter().find_map(|s| s.llm_error.as_ref())
    }

    /// Tool errors from every step, in step order
    pub fn all_tool_errors(&self) -> Vec<String> {
        self.step_contexts
            .iter()
            .flat_map(|s| s.tool_errors.iter().cloned())
            .collect()
    }
}

/// Why the run ended, classified over all step contexts
///
/// Classification checks error conditions before success conditions, so a
/// run that called `completed()` in every step but also hit a tool error
/// reports `ToolErrors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    LlmError,
    ToolErrors,
    AutoTerminateTooManyFindings,
    MaxIterationsReached,
    DoneToolCalled,
}

impl TerminationReason {
    /// Classify a finished run, most severe condition first
    pub fn classify(ctx: &GlobalContext, max_iterations: usize) -> Self {
        if ctx.first_llm_error().is_some() {
            Self::LlmError
        } else if ctx.step_contexts.iter().any(|s| !s.tool_errors.is_empty()) {
            Self::ToolErrors
        } else if ctx.total_findings() > MAX_RUN_FINDINGS {
            Self::AutoTerminateTooManyFindings
        } else if ctx.total_iterations >= max_iterations {
            Self::MaxIterationsReached
        } else {
            Self::DoneToolCalled
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LlmError => "llm_error",
            Self::ToolErrors => "tool_errors",
            Self::AutoTerminateTooManyFindings => "auto_terminate_too_many_findings",
            Self::MaxIterationsReached => "max_iterations_reached",
            Self::DoneToolCalled => "done_tool_called",
        }
    }
}

/// Wall-clock duration of one named phase of the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub name: String,
    pub duration: f64,
}

impl PhaseRecord {
    pub fn new(name: impl Into<String>, duration: std::time::Duration) -> Self {
        Self {
            name: name.into(),
            duration: duration.as_secs_f64(),
        }
    }
}

/// Final output of an exploration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationResult {
    pub query: String,
    pub fingerprint: Fingerprint,
    /// Synthesized narrative answer to the query
    pub architecture: String,
    pub execution_time: f64,
    pub phases_executed: Vec<PhaseRecord>,
    pub termination_reason: TerminationReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tool_errors: Vec<String>,
}
