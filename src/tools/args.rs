//! Typed tool arguments
//!
//! The dispatcher parses raw tool_use JSON into these structs before any
//! tool runs. A parse failure becomes a structured error result naming the
//! tool and the offending field; it is never silently replaced with
//! defaults.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::error::ToolError;

fn default_path() -> String {
    ".".to_string()
}

fn default_list_depth() -> usize {
    3
}

fn default_tree_depth() -> usize {
    3
}

fn default_context_lines() -> usize {
    2
}

fn default_max_results() -> usize {
    20
}

/// Arguments for list_directory
#[derive(Debug, Clone, Deserialize)]
pub struct ListDirectoryArgs {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default = "default_list_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub show_hidden: bool,
}

impl ListDirectoryArgs {
    /// Dedup signature: one listing per exact parameter combination
    pub fn signature(&self) -> String {
        format!("{}:{}:{}:{}", self.path, self.recursive, self.max_depth, self.show_hidden)
    }
}

/// Arguments for read_file
#[derive(Debug, Clone, Deserialize)]
pub struct ReadFileArgs {
    pub path: String,
}

/// How find_files interprets its pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileMatchKind {
    /// Glob against the file name
    #[default]
    Name,
    /// Substring of the relative path
    Path,
    /// Extension equality
    Extension,
}

impl std::fmt::Display for FileMatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Path => write!(f, "path"),
            Self::Extension => write!(f, "extension"),
        }
    }
}

/// Arguments for find_files
#[derive(Debug, Clone, Deserialize)]
pub struct FindFilesArgs {
    pub pattern: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub file_type: FileMatchKind,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl FindFilesArgs {
    /// Search-history signature, recorded for bookkeeping (never skipped)
    pub fn signature(&self) -> String {
        format!("{}:{}:{}", self.pattern, self.path, self.file_type)
    }
}

/// Arguments for grep
#[derive(Debug, Clone, Deserialize)]
pub struct GrepArgs {
    pub pattern: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub file_patterns: Vec<String>,
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

/// Arguments for get_file_tree
#[derive(Debug, Clone, Deserialize)]
pub struct FileTreeArgs {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_tree_depth")]
    pub max_depth: usize,
}

/// Arguments for detect_languages
#[derive(Debug, Clone, Deserialize)]
pub struct DetectLanguagesArgs {
    #[serde(default = "default_path")]
    pub path: String,
}

/// Arguments for completed
#[derive(Debug, Clone, Deserialize)]
pub struct CompletedArgs {
    pub summary: String,
}

/// Parsed, validated arguments for one tool call
#[derive(Debug, Clone)]
pub enum ToolArgs {
    ListDirectory(ListDirectoryArgs),
    ReadFile(ReadFileArgs),
    FindFiles(FindFilesArgs),
    Grep(GrepArgs),
    FileTree(FileTreeArgs),
    DetectLanguages(DetectLanguagesArgs),
    Completed(CompletedArgs),
}

impl ToolArgs {
    /// Parse raw tool_use input into the named tool's typed arguments
    pub fn parse(tool: &str, input: &Value) -> Result<Self, ToolError> {
        debug!(%tool, "ToolArgs::parse: called");
        let parsed = match tool {
            "list_directory" => ToolArgs::ListDirectory(Self::from_value(tool, input)?),
            "read_file" => ToolArgs::ReadFile(Self::from_value(tool, input)?),
            "find_files" => ToolArgs::FindFiles(Self::from_value(tool, input)?),
            "grep" => ToolArgs::Grep(Self::from_value(tool, input)?),
            "get_file_tree" => ToolArgs::FileTree(Self::from_value(tool, input)?),
            "detect_languages" => ToolArgs::DetectLanguages(Self::from_value(tool, input)?),
            "completed" => ToolArgs::Completed(Self::from_value(tool, input)?),
            other => {
                debug!(tool = %other, "ToolArgs::parse: unknown tool");
                return Err(ToolError::UnknownTool { name: other.to_string() });
            }
        };
        Ok(parsed)
    }

    fn from_value<T: serde::de::DeserializeOwned>(tool: &str, input: &Value) -> Result<T, ToolError> {
        serde_json::from_value(input.clone()).map_err(|e| {
            debug!(%tool, error = %e, "ToolArgs::from_value: parse failed");
            ToolError::invalid_arguments(tool, e.to_string())
        })
    }

    /// Name of the tool these arguments belong to
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolArgs::ListDirectory(_) => "list_directory",
            ToolArgs::ReadFile(_) => "read_file",
            ToolArgs::FindFiles(_) => "find_files",
            ToolArgs::Grep(_) => "grep",
            ToolArgs::FileTree(_) => "get_file_tree",
            ToolArgs::DetectLanguages(_) => "detect_languages",
            ToolArgs::Completed(_) => "completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_directory_defaults() {
        let args = ToolArgs::parse("list_directory", &json!({})).unwrap();
        let ToolArgs::ListDirectory(args) = args else {
            panic!("wrong variant");
        };
        assert_eq!(args.path, ".");
        assert!(!args.recursive);
        assert_eq!(args.max_depth, 3);
        assert!(!args.show_hidden);
    }

    #[test]
    fn test_list_directory_signature_varies_with_every_field() {
        let base = ListDirectoryArgs {
            path: "src".to_string(),
            recursive: false,
            max_depth: 3,
            show_hidden: false,
        };
        let mut recursive = base.clone();
        recursive.recursive = true;
        let mut deeper = base.clone();
        deeper.max_depth = 5;

        assert_eq!(base.signature(), "src:false:3:false");
        assert_ne!(base.signature(), recursive.signature());
        assert_ne!(base.signature(), deeper.signature());
    }

    #[test]
    fn test_read_file_requires_path() {
        let err = ToolArgs::parse("read_file", &json!({})).unwrap_err();
        let ToolError::InvalidArguments { tool, message } = err else {
            panic!("expected InvalidArguments");
        };
        assert_eq!(tool, "read_file");
        assert!(message.contains("path"));
    }

    #[test]
    fn test_find_files_file_type_is_validated() {
        let args = ToolArgs::parse("find_files", &json!({"pattern": "*.rs", "file_type": "extension"})).unwrap();
        let ToolArgs::FindFiles(args) = args else {
            panic!("wrong variant");
        };
        assert_eq!(args.file_type, FileMatchKind::Extension);
        assert_eq!(args.signature(), "*.rs:.:extension");

        let err = ToolArgs::parse("find_files", &json!({"pattern": "x", "file_type": "regex"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn test_grep_defaults() {
        let args = ToolArgs::parse("grep", &json!({"pattern": "fn main"})).unwrap();
        let ToolArgs::Grep(args) = args else {
            panic!("wrong variant");
        };
        assert_eq!(args.path, ".");
        assert!(args.file_patterns.is_empty());
        assert_eq!(args.context_lines, 2);
        assert_eq!(args.max_results, 20);
        assert!(!args.case_insensitive);
    }

    #[test]
    fn test_grep_requires_pattern() {
        let err = ToolArgs::parse("grep", &json!({"path": "src"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn test_completed_requires_summary() {
        let err = ToolArgs::parse("completed", &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));

        let args = ToolArgs::parse("completed", &json!({"summary": "found it"})).unwrap();
        assert_eq!(args.tool_name(), "completed");
    }

    #[test]
    fn test_unknown_tool() {
        let err = ToolArgs::parse("write_file", &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool { .. }));
    }

    #[test]
    fn test_extra_fields_are_tolerated() {
        // Models sometimes add stray keys; those must not fail the call
        let args = ToolArgs::parse("read_file", &json!({"path": "a.rs", "reason": "looks relevant"}));
        assert!(args.is_ok());
    }
}
