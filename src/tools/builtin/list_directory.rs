//! list_directory tool - list files and directories

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::tools::args::{ListDirectoryArgs, ToolArgs};
use crate::tools::{Tool, ToolContext, ToolResult};

/// How many entries the result shows; the header always carries the full count
const DISPLAY_CAP: usize = 20;

/// List files and directories in a path
pub struct ListDirectoryTool;

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &'static str {
        "list_directory"
    }

    fn description(&self) -> &'static str {
        "List files and directories in a given path with various options."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path to list (default: current directory)"
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Whether to list files recursively"
                },
                "max_depth": {
                    "type": "integer",
                    "description": "Maximum depth for recursive listing (default: 3)"
                },
                "show_hidden": {
                    "type": "boolean",
                    "description": "Whether to show hidden files and directories"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> ToolResult {
        let ToolArgs::ListDirectory(args) = args else {
            return ToolResult::error("list_directory: argument type mismatch");
        };
        debug!(?args, "ListDirectoryTool::execute: called");

        let full_path = match ctx.validate_path(Path::new(&args.path)) {
            Ok(p) => {
                debug!(?p, "ListDirectoryTool::execute: path validated");
                p
            }
            Err(e) => {
                debug!(%e, "ListDirectoryTool::execute: path validation failed");
                return ToolResult::error(e.to_string());
            }
        };

        let mut entries = if args.recursive {
            collect_recursive(&full_path, &args)
        } else {
            match collect_flat(&full_path, &args).await {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(%e, "ListDirectoryTool::execute: failed to read directory");
                    return ToolResult::error(format!("Failed to read directory: {}", e));
                }
            }
        };

        entries.sort();
        debug!(entries_count = %entries.len(), "ListDirectoryTool::execute: entries collected");

        let shown: Vec<&str> = entries.iter().take(DISPLAY_CAP).map(String::as_str).collect();
        ToolResult::success(format!(
            "Found {} items in {}:\n{}",
            entries.len(),
            args.path,
            shown.join("\n")
        ))
    }
}

/// Immediate children of the directory, directories marked with a `/` suffix
async fn collect_flat(
    full_path: &Path,
    args: &ListDirectoryArgs,
) -> Result<Vec<String>, std::io::Error> {
    let mut entries = Vec::new();
    let mut dir = tokio::fs::read_dir(full_path).await?;

    while let Ok(Some(entry)) = dir.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        if !args.show_hidden && name.starts_with('.') {
            continue;
        }
        let is_dir = entry
            .metadata()
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        let suffix = if is_dir { "/" } else { "" };
        entries.push(format!("{}{}", name, suffix));
    }
    Ok(entries)
}

/// Paths relative to the listed directory, down to max_depth
fn collect_recursive(full_path: &Path, args: &ListDirectoryArgs) -> Vec<String> {
    let show_hidden = args.show_hidden;
    WalkDir::new(full_path)
        .min_depth(1)
        .max_depth(args.max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| {
            if show_hidden {
                return true;
            }
            e.file_name().to_str().map(|s| !s.starts_with('.')).unwrap_or(true)
        })
        .filter_map(|e| e.ok())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(full_path)
                .unwrap_or(e.path())
                .to_string_lossy()
                .to_string();
            let suffix = if e.file_type().is_dir() { "/" } else { "" };
            format!("{}{}", rel, suffix)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileCache;
    use serde_json::json;
    use std::fs;
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};

    fn ctx_for(temp: &TempDir) -> ToolContext {
        let root = temp.path().to_path_buf();
        let cache = Arc::new(FileCache::new(root.clone()));
        ToolContext::new(root, "test".to_string(), cache)
    }

    fn parse(input: Value) -> ToolArgs {
        ToolArgs::parse("list_directory", &input).unwrap()
    }

    #[tokio::test]
    async fn test_list_directory_basic() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("file1.txt"), "").unwrap();
        fs::write(temp.path().join("file2.txt"), "").unwrap();
        fs::create_dir(temp.path().join("subdir")).unwrap();

        let tool = ListDirectoryTool;
        let result = tool.execute(parse(json!({})), &ctx_for(&temp)).await;

        assert!(!result.is_error);
        assert!(result.content.starts_with("Found 3 items in .:"));
        assert!(result.content.contains("file1.txt"));
        assert!(result.content.contains("subdir/"));
    }

    #[tokio::test]
    async fn test_list_directory_hides_dotfiles() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("visible.txt"), "").unwrap();
        fs::write(temp.path().join(".hidden"), "").unwrap();

        let tool = ListDirectoryTool;

        let result = tool.execute(parse(json!({})), &ctx_for(&temp)).await;
        assert!(result.content.starts_with("Found 1 items"));
        assert!(!result.content.contains(".hidden"));

        let result = tool
            .execute(parse(json!({"show_hidden": true})), &ctx_for(&temp))
            .await;
        assert!(result.content.contains(".hidden"));
    }

    #[tokio::test]
    async fn test_list_directory_recursive() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("a/b/deep.txt"), "").unwrap();

        let tool = ListDirectoryTool;
        let result = tool
            .execute(parse(json!({"recursive": true})), &ctx_for(&temp))
            .await;

        assert!(!result.is_error);
        assert!(result.content.contains("a/"));
        assert!(result.content.contains("a/b/"));
        assert!(result.content.contains("a/b/deep.txt"));
    }

    #[tokio::test]
    async fn test_list_directory_recursive_respects_depth() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("a/b/c")).unwrap();
        fs::write(temp.path().join("a/b/c/deep.txt"), "").unwrap();

        let tool = ListDirectoryTool;
        let result = tool
            .execute(
                parse(json!({"recursive": true, "max_depth": 2})),
                &ctx_for(&temp),
            )
            .await;

        assert!(result.content.contains("a/b/"));
        assert!(!result.content.contains("deep.txt"));
    }

    #[tokio::test]
    async fn test_list_directory_caps_display_at_twenty() {
        let temp = tempdir().unwrap();
        for i in 0..25 {
            fs::write(temp.path().join(format!("file{:02}.txt", i)), "").unwrap();
        }

        let tool = ListDirectoryTool;
        let result = tool.execute(parse(json!({})), &ctx_for(&temp)).await;

        assert!(result.content.starts_with("Found 25 items"));
        // Header line plus twenty entries
        assert_eq!(result.content.lines().count(), 21);
    }

    #[tokio::test]
    async fn test_list_directory_not_found() {
        let temp = tempdir().unwrap();

        let tool = ListDirectoryTool;
        let result = tool
            .execute(parse(json!({"path": "nonexistent"})), &ctx_for(&temp))
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("Failed to read directory"));
    }
}
