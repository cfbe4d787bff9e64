//! Tool system for codebase exploration
//!
//! The model drives exploration through a fixed registry of read-only
//! filesystem tools. The dispatcher owns argument validation, the dedup
//! policy against VisitedState, and output compression; individual tools
//! only look at the filesystem.

pub mod args;
pub mod builtin;
mod context;
mod dispatcher;
mod error;
mod traits;
pub mod visited;

pub use args::ToolArgs;
pub use context::ToolContext;
pub use dispatcher::{ToolDispatcher, ToolOutcome};
pub use error::ToolError;
pub use traits::{Tool, ToolResult};
pub use visited::{VisitedCounts, VisitedState};
