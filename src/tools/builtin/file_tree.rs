//! get_file_tree tool - indented directory tree

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::tools::args::ToolArgs;
use crate::tools::{Tool, ToolContext, ToolResult};

const MAX_TREE_LINES: usize = 200;

/// Render a depth-limited tree of files and directories
pub struct FileTreeTool;

#[async_trait]
impl Tool for FileTreeTool {
    fn name(&self) -> &'static str {
        "get_file_tree"
    }

    fn description(&self) -> &'static str {
        "Get a structured tree representation of files and directories."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path to analyze (default: current directory)"
                },
                "max_depth": {
                    "type": "integer",
                    "description": "Maximum depth to traverse (default: 3)"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> ToolResult {
        let ToolArgs::FileTree(args) = args else {
            return ToolResult::error("get_file_tree: argument type mismatch");
        };
        debug!(?args, "FileTreeTool::execute: called");

        let full_path = match ctx.validate_path(Path::new(&args.path)) {
            Ok(p) => {
                debug!(?p, "FileTreeTool::execute: path validated");
                p
            }
            Err(e) => {
                debug!(%e, "FileTreeTool::execute: path validation failed");
                return ToolResult::error(e.to_string());
            }
        };

        // A file argument renders its parent directory instead
        let (display_path, tree_root) = if full_path.is_file() {
            let parent = full_path.parent().unwrap_or(&ctx.root).to_path_buf();
            // Named to avoid colliding with `tracing::field::display` inside the macro
            let parent_display = parent
                .strip_prefix(&ctx.root)
                .ok()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|| ".".to_string());
            debug!(display = %parent_display, "FileTreeTool::execute: file path given, using parent");
            (parent_display, parent)
        } else {
            (args.path.clone(), full_path)
        };

        let mut lines = Vec::new();
        let walker = WalkDir::new(&tree_root)
            .min_depth(1)
            .max_depth(args.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.file_name().to_str().map(|s| !s.starts_with('.')).unwrap_or(true)
            });

        for entry in walker.filter_map(|e| e.ok()) {
            if lines.len() >= MAX_TREE_LINES {
                debug!("FileTreeTool::execute: line cap reached");
                break;
            }
            let indent = "  ".repeat(entry.depth().saturating_sub(1));
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() {
                lines.push(format!("{}{}/", indent, name));
            } else {
                lines.push(format!("{}{} (file)", indent, name));
            }
        }
        debug!(line_count = %lines.len(), "FileTreeTool::execute: tree rendered");

        ToolResult::success(format!(
            "File tree for {} (max depth {}):\n{}",
            display_path,
            args.max_depth,
            lines.join("\n")
        ))
    }
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
        ToolArgs::parse("get_file_tree", &input).unwrap()
    }

    #[tokio::test]
    async fn test_file_tree_basic() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/main.rs"), "").unwrap();
        fs::write(temp.path().join("README.md"), "").unwrap();

        let tool = FileTreeTool;
        let result = tool.execute(parse(json!({})), &ctx_for(&temp)).await;

        assert!(!result.is_error);
        assert!(result.content.starts_with("File tree for . (max depth 3):"));
        assert!(result.content.contains("README.md (file)"));
        assert!(result.content.contains("src/"));
        assert!(result.content.contains("  main.rs (file)"));
    }

    #[tokio::test]
    async fn test_file_tree_respects_max_depth() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("a/b/c")).unwrap();
        fs::write(temp.path().join("a/b/c/deep.txt"), "").unwrap();

        let tool = FileTreeTool;
        let result = tool
            .execute(parse(json!({"max_depth": 2})), &ctx_for(&temp))
            .await;

        assert!(result.content.contains("File tree for . (max depth 2):"));
        assert!(result.content.contains("b/"));
        assert!(!result.content.contains("c/"));
        assert!(!result.content.contains("deep.txt"));
    }

    #[tokio::test]
    async fn test_file_tree_skips_hidden() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join(".git/config"), "").unwrap();
        fs::write(temp.path().join("visible.txt"), "").unwrap();

        let tool = FileTreeTool;
        let result = tool.execute(parse(json!({})), &ctx_for(&temp)).await;

        assert!(result.content.contains("visible.txt"));
        assert!(!result.content.contains(".git"));
    }

    #[tokio::test]
    async fn test_file_tree_for_file_uses_parent() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/lib.rs"), "").unwrap();
        fs::write(temp.path().join("src/main.rs"), "").unwrap();

        let tool = FileTreeTool;
        let result = tool
            .execute(parse(json!({"path": "src/lib.rs"})), &ctx_for(&temp))
            .await;

        assert!(result.content.starts_with("File tree for src"));
        assert!(result.content.contains("lib.rs (file)"));
        assert!(result.content.contains("main.rs (file)"));
    }

    #[tokio::test]
    async fn test_file_tree_caps_lines() {
        let temp = tempdir().unwrap();
        for i in 0..250 {
            fs::write(temp.path().join(format!("f{:03}.txt", i)), "").unwrap();
        }

        let tool = FileTreeTool;
        let result = tool.execute(parse(json!({})), &ctx_for(&temp)).await;

        // Header plus at most MAX_TREE_LINES entries
        assert_eq!(result.content.lines().count(), MAX_TREE_LINES + 1);
    }
}
