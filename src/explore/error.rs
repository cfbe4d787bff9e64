//! Exploration error types

use thiserror::Error;

/// Errors that abort an exploration run before it produces a result
///
/// Step-level failures (LLM errors, tool errors) never surface here; they
/// are recorded in the result's termination fields instead. The only fatal
/// condition is a plan that cannot run at all.
#[derive(Debug, Error)]
pub enum ExploreError {
    #[error("Exploration plan is empty: no steps to run")]
    EmptyPlan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_plan_message() {
        let err = ExploreError::EmptyPlan;
        assert_eq!(err.to_string(), "Exploration plan is empty: no steps to run");
    }
}
