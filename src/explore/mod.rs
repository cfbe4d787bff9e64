//! Exploration engine
//!
//! The outer loop walks the plan step by step; each step runs a bounded
//! inner loop of model turns and tool dispatch. A stagnation guard and
//! findings caps keep both loops from wandering, and a final synthesis
//! pass turns the step summaries into one answer.

mod context;
mod error;
mod guard;
mod orchestrator;
mod step;
mod synthesis;

pub use context::{
    ExplorationResult, GlobalContext, LlmFailure, PhaseRecord, StepCompletion, StepContext,
    TerminationReason, MAX_RUN_FINDINGS, MAX_STEP_FINDINGS,
};
pub use error::ExploreError;
pub use guard::LoopGuard;
pub use orchestrator::{ExplorationOrchestrator, OrchestratorConfig};
pub use step::StepExecutor;
pub use synthesis::Synthesizer;
