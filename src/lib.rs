//! codescout - LLM-driven codebase exploration
//!
//! codescout answers natural-language questions about a codebase by running
//! a planned, bounded exploration: fingerprint the repository, ask an LLM
//! for a step-by-step plan, execute each step with read-only tools, and
//! synthesize the findings into one answer.
//!
//! # Core Concepts
//!
//! - **Plan Then Explore**: A planning call turns the query into ordered steps
//! - **Bounded Loops**: Per-step and global iteration budgets cap every run
//! - **Session Dedup**: Repeated reads and listings short-circuit with cached notices
//! - **Context Compression**: Oversized tool output and accumulated findings fold down via LLM calls
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait with Anthropic and OpenAI implementations
//! - [`scan`] - Codebase fingerprinting
//! - [`cache`] - Shared file index backing the tools
//! - [`planner`] - Query to exploration plan
//! - [`explore`] - Exploration engine and termination classification
//! - [`tools`] - Read-only exploration tools and dispatch
//! - [`compress`] - Context compression
//! - [`prompts`] - Prompt template loading
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cache;
pub mod cli;
pub mod compress;
pub mod config;
pub mod explore;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod scan;
pub mod tools;

// Re-export commonly used types
pub use cache::{CacheError, FileCache};
pub use compress::{CompressionSnapshot, ContextCompressor, LlmCompressor, NoopCompressor};
pub use config::{Config, ExploreConfig, LlmConfig};
pub use explore::{
    ExplorationOrchestrator, ExplorationResult, ExploreError, LoopGuard, OrchestratorConfig, PhaseRecord,
    StepCompletion, StepContext, Synthesizer, TerminationReason,
};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient};
pub use planner::{ExplorationPlan, Planner};
pub use prompts::{FingerprintContext, PlanContext, PromptLoader};
pub use scan::Fingerprint;
pub use tools::{Tool, ToolContext, ToolDispatcher, ToolError, ToolOutcome, ToolResult};
