//! Stagnation guard for the inner exploration loop
//!
//! Detects a model that keeps issuing the same batch of tool calls and
//! auto-completes the step instead of burning iterations on it.

use tracing::debug;

use crate::llm::ToolCall;

/// Consecutive identical iterations that count as a stuck loop.
const REDUNDANT_STREAK: usize = 3;

/// Tracks consecutive identical tool-call batches across iterations
#[derive(Debug, Default)]
pub struct LoopGuard {
    last_signature: Option<String>,
    streak: usize,
}

impl LoopGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical signature for one iteration's batch of tool calls
    ///
    /// Call order within the batch does not matter; JSON object keys are
    /// already emitted in sorted order, so equal inputs render equally.
    pub fn signature(calls: &[ToolCall]) -> String {
        let mut parts: Vec<String> = calls
            .iter()
            .map(|call| format!("{}:{}", call.name, call.input))
            .collect();
        parts.sort();
        format!("{parts:?}")
    }

    /// Record one iteration's signature; returns true when the streak of
    /// identical iterations reaches [`REDUNDANT_STREAK`].
    pub fn record(&mut self, signature: String) -> bool {
        if self.last_signature.as_deref() == Some(signature.as_str()) {
            self.streak += 1;
            debug!("LoopGuard::record: repeat signature, streak {}", self.streak);
        } else {
            self.last_signature = Some(signature);
            self.streak = 1;
        }
        self.streak >= REDUNDANT_STREAK
    }
}
