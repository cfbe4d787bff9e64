//! Built-in exploration tools
//!
//! All read-only: the exploration loop observes a codebase, it never
//! mutates one.

mod completed;
mod detect_languages;
mod file_tree;
mod find_files;
mod grep;
mod list_directory;
mod read_file;

pub use completed::{CompletedTool, COMPLETION_PREFIX};
pub use detect_languages::DetectLanguagesTool;
pub use file_tree::FileTreeTool;
pub use find_files::FindFilesTool;
pub use grep::GrepTool;
pub use list_directory::ListDirectoryTool;
pub use read_file::ReadFileTool;
