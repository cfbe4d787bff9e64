//! find_files tool - locate files by name, path, or extension

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cache::CacheError;
use crate::tools::args::{FileMatchKind, FindFilesArgs, ToolArgs};
use crate::tools::{Tool, ToolContext, ToolResult};

/// How many matches the result shows; the header carries the full count
const DISPLAY_CAP: usize = 30;

/// Find files matching a pattern, answered from the file index
pub struct FindFilesTool;

#[async_trait]
impl Tool for FindFilesTool {
    fn name(&self) -> &'static str {
        "find_files"
    }

    fn description(&self) -> &'static str {
        "Find files matching a pattern or criteria."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Pattern to search for (supports wildcards)"
                },
                "path": {
                    "type": "string",
                    "description": "Directory path to search in (default: current directory)"
                },
                "file_type": {
                    "type": "string",
                    "enum": ["name", "path", "extension"],
                    "description": "Type of pattern matching: 'name' for filename, 'path' for path contains, 'extension' for file extension"
                },
                "exclude_patterns": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of patterns to exclude from results"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> ToolResult {
        let ToolArgs::FindFiles(args) = args else {
            return ToolResult::error("find_files: argument type mismatch");
        };
        debug!(?args, "FindFilesTool::execute: called");

        let matches = match collect_matches(&args, ctx).await {
            Ok(m) => m,
            Err(e) => {
                debug!(%e, "FindFilesTool::execute: index lookup failed");
                return ToolResult::error(e.to_string());
            }
        };
        debug!(matches_count = %matches.len(), "FindFilesTool::execute: matches collected");

        let shown: Vec<&str> = matches.iter().take(DISPLAY_CAP).map(String::as_str).collect();
        ToolResult::success(format!(
            "Found {} files matching '{}' in {}:\n{}",
            matches.len(),
            args.pattern,
            args.path,
            shown.join("\n")
        ))
    }
}

/// Candidates from the index, narrowed by scope and exclusions, sorted
///
/// An invalid glob yields no matches rather than an error, matching how a
/// shell glob with a bad bracket simply fails to expand.
async fn collect_matches(args: &FindFilesArgs, ctx: &ToolContext) -> Result<Vec<String>, CacheError> {
    let candidates: Vec<PathBuf> = match args.file_type {
        FileMatchKind::Extension => ctx.cache.files_by_extension(&args.pattern).await?,
        FileMatchKind::Path => {
            let needle = &args.pattern;
            ctx.cache
                .all_files()
                .await?
                .into_iter()
                .filter(|p| p.to_string_lossy().contains(needle.as_str()))
                .collect()
        }
        FileMatchKind::Name => {
            if args.pattern.contains(['*', '?', '[']) {
                let glob = match glob::Pattern::new(&args.pattern) {
                    Ok(g) => g,
                    Err(e) => {
                        debug!(%e, "collect_matches: invalid glob, returning no matches");
                        return Ok(Vec::new());
                    }
                };
                ctx.cache
                    .all_files()
                    .await?
                    .into_iter()
                    .filter(|p| {
                        p.file_name()
                            .map(|n| glob.matches(&n.to_string_lossy()))
                            .unwrap_or(false)
                    })
                    .collect()
            } else {
                ctx.cache.files_by_name(&args.pattern).await?
            }
        }
    };

    let scope = scope_path(&args.path);
    let mut matches: Vec<String> = candidates
        .into_iter()
        .filter(|p| scope.as_ref().map(|s| p.starts_with(s)).unwrap_or(true))
        .map(|p| p.to_string_lossy().to_string())
        .filter(|p| !args.exclude_patterns.iter().any(|ex| p.contains(ex)))
        .collect();
    matches.sort();
    Ok(matches)
}

/// None means the whole root
fn scope_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches("./");
    if trimmed.is_empty() || trimmed == "." {
        None
    } else {
        Some(Path::new(trimmed).to_path_buf())
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

    fn sample_tree() -> TempDir {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::create_dir_all(temp.path().join("tests")).unwrap();
        fs::write(temp.path().join("main.py"), "").unwrap();
        fs::write(temp.path().join("src/app.py"), "").unwrap();
        fs::write(temp.path().join("src/util.js"), "").unwrap();
        fs::write(temp.path().join("tests/test_app.py"), "").unwrap();
        temp
    }

    fn ctx_for(temp: &TempDir) -> ToolContext {
        let root = temp.path().to_path_buf();
        let cache = Arc::new(FileCache::new(root.clone()));
        ToolContext::new(root, "test".to_string(), cache)
    }

    fn parse(input: Value) -> ToolArgs {
        ToolArgs::parse("find_files", &input).unwrap()
    }

    #[tokio::test]
    async fn test_find_files_by_name_glob() {
        let temp = sample_tree();
        let tool = FindFilesTool;

        let result = tool
            .execute(parse(json!({"pattern": "*.py"})), &ctx_for(&temp))
            .await;

        assert!(!result.is_error);
        assert!(result.content.starts_with("Found 3 files matching '*.py' in .:"));
        assert!(result.content.contains("main.py"));
        assert!(result.content.contains("src/app.py"));
        assert!(result.content.contains("tests/test_app.py"));
        assert!(!result.content.contains("util.js"));
    }

    #[tokio::test]
    async fn test_find_files_by_literal_name() {
        let temp = sample_tree();
        let tool = FindFilesTool;

        let result = tool
            .execute(parse(json!({"pattern": "app.py"})), &ctx_for(&temp))
            .await;

        assert!(result.content.starts_with("Found 1 files matching 'app.py'"));
        assert!(result.content.contains("src/app.py"));
    }

    #[tokio::test]
    async fn test_find_files_by_extension() {
        let temp = sample_tree();
        let tool = FindFilesTool;

        let result = tool
            .execute(
                parse(json!({"pattern": "js", "file_type": "extension"})),
                &ctx_for(&temp),
            )
            .await;

        assert!(result.content.starts_with("Found 1 files matching 'js'"));
        assert!(result.content.contains("src/util.js"));
    }

    #[tokio::test]
    async fn test_find_files_by_path_substring() {
        let temp = sample_tree();
        let tool = FindFilesTool;

        let result = tool
            .execute(
                parse(json!({"pattern": "test", "file_type": "path"})),
                &ctx_for(&temp),
            )
            .await;

        assert!(result.content.contains("tests/test_app.py"));
        assert!(!result.content.contains("src/app.py"));
    }

    #[tokio::test]
    async fn test_find_files_scoped_to_path() {
        let temp = sample_tree();
        let tool = FindFilesTool;

        let result = tool
            .execute(
                parse(json!({"pattern": "*.py", "path": "src"})),
                &ctx_for(&temp),
            )
            .await;

        assert!(result.content.starts_with("Found 1 files matching '*.py' in src:"));
        assert!(result.content.contains("src/app.py"));
        assert!(!result.content.contains("main.py\n"));
    }

    #[tokio::test]
    async fn test_find_files_exclude_patterns() {
        let temp = sample_tree();
        let tool = FindFilesTool;

        let result = tool
            .execute(
                parse(json!({"pattern": "*.py", "exclude_patterns": ["tests/"]})),
                &ctx_for(&temp),
            )
            .await;

        assert!(result.content.starts_with("Found 2 files"));
        assert!(!result.content.contains("test_app.py"));
    }

    #[tokio::test]
    async fn test_find_files_invalid_glob_finds_nothing() {
        let temp = sample_tree();
        let tool = FindFilesTool;

        let result = tool
            .execute(parse(json!({"pattern": "[bad"})), &ctx_for(&temp))
            .await;

        assert!(!result.is_error);
        assert!(result.content.starts_with("Found 0 files"));
    }

    #[tokio::test]
    async fn test_find_files_caps_display_at_thirty() {
        let temp = tempdir().unwrap();
        for i in 0..35 {
            fs::write(temp.path().join(format!("file{:02}.rs", i)), "").unwrap();
        }
        let tool = FindFilesTool;

        let result = tool
            .execute(parse(json!({"pattern": "*.rs"})), &ctx_for(&temp))
            .await;

        assert!(result.content.starts_with("Found 35 files"));
        // Header line plus thirty entries
        assert_eq!(result.content.lines().count(), 31);
    }
}
