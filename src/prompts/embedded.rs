//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System prompt anchoring the per-step exploration loop
pub const EXPLORE: &str = include_str!("../../prompts/explore.pmt");

/// Planning prompt that turns a query and fingerprint into exploration steps
pub const PLAN: &str = include_str!("../../prompts/plan.pmt");

/// Synthesis prompt combining step summaries into a single answer
pub const SYNTHESIS: &str = include_str!("../../prompts/synthesis.pmt");

/// Dual-mode compression prompt (tool output or accumulated context)
pub const COMPRESS: &str = include_str!("../../prompts/compress.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "explore" => {
            debug!("get_embedded: matched explore");
            Some(EXPLORE)
        }
        "plan" => {
            debug!("get_embedded: matched plan");
            Some(PLAN)
        }
        "synthesis" => {
            debug!("get_embedded: matched synthesis");
            Some(SYNTHESIS)
        }
        "compress" => {
            debug!("get_embedded: matched compress");
            Some(COMPRESS)
        }
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
