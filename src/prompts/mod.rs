//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the exploration,
//! planning, synthesis, and compression LLM calls.
//!
//! Template loading chain:
//! 1. `.codescout/prompts/{name}.pmt` in the explored repo (user override)
//! 2. Embedded fallback compiled in from `prompts/*.pmt`
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{FingerprintContext, PlanContext, PromptLoader};
