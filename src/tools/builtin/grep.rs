//! grep tool - search file contents using the ripgrep libraries

use async_trait::async_trait;
use grep_regex::RegexMatcherBuilder;
use grep_searcher::{BinaryDetection, Searcher, SearcherBuilder, Sink, SinkContext, SinkMatch};
use serde_json::Value;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::tools::args::ToolArgs;
use crate::tools::{Tool, ToolContext, ToolResult};

/// Directories never worth searching for source patterns
const SKIP_DIRS: &[&str] = &["node_modules", "target", "dist", "build", "__pycache__"];

/// Search for regex patterns in files
pub struct GrepTool;

#[async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &'static str {
        "grep"
    }

    fn description(&self) -> &'static str {
        "Search for text patterns within files. Returns matching lines with context."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern to search for"
                },
                "path": {
                    "type": "string",
                    "description": "Directory path to search in (default: current directory)"
                },
                "file_patterns": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "File patterns to include in search (e.g., ['*.py', '*.js'])"
                },
                "context_lines": {
                    "type": "integer",
                    "description": "Number of context lines around matches (default: 2)"
                },
                "case_insensitive": {
                    "type": "boolean",
                    "description": "Whether to ignore case in search"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of matching lines to return (default: 20)"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> ToolResult {
        let ToolArgs::Grep(args) = args else {
            return ToolResult::error("grep: argument type mismatch");
        };
        debug!(?args, "GrepTool::execute: called");

        let search_path = match ctx.validate_path(Path::new(&args.path)) {
            Ok(p) => {
                debug!(?p, "GrepTool::execute: search path validated");
                p
            }
            Err(e) => {
                debug!(%e, "GrepTool::execute: path validation failed");
                return ToolResult::error(format!("Invalid path: {}", e));
            }
        };

        let matcher = match RegexMatcherBuilder::new()
            .case_insensitive(args.case_insensitive)
            .build(&args.pattern)
        {
            Ok(m) => {
                debug!("GrepTool::execute: regex matcher built");
                m
            }
            Err(e) => {
                debug!(%e, "GrepTool::execute: invalid regex pattern");
                return ToolResult::error(format!("Invalid regex pattern: {}", e));
            }
        };

        let globs: Vec<glob::Pattern> = args
            .file_patterns
            .iter()
            .filter_map(|fp| glob::Pattern::new(fp).ok())
            .collect();
        debug!(glob_count = %globs.len(), "GrepTool::execute: file pattern globs");

        let files = if search_path.is_file() {
            debug!("GrepTool::execute: searching single file");
            vec![search_path.clone()]
        } else {
            debug!("GrepTool::execute: searching directory");
            WalkDir::new(&search_path)
                .min_depth(1)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !is_skipped_dir(e))
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| {
                    if globs.is_empty() {
                        return true;
                    }
                    e.path()
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(|name| globs.iter().any(|g| g.matches(name)))
                        .unwrap_or(false)
                })
                .map(|e| e.path().to_path_buf())
                .collect()
        };
        debug!(file_count = %files.len(), "GrepTool::execute: files to search");

        let mut searcher_builder = SearcherBuilder::new();
        searcher_builder
            .binary_detection(BinaryDetection::quit(b'\x00'))
            .before_context(args.context_lines)
            .after_context(args.context_lines);

        let mut results: Vec<MatchResult> = Vec::new();
        let mut match_count = 0usize;

        for file_path in files {
            if match_count >= args.max_results {
                debug!("GrepTool::execute: max results reached");
                break;
            }

            let display_path = file_path
                .strip_prefix(&ctx.root)
                .unwrap_or(&file_path)
                .to_string_lossy()
                .to_string();

            let mut sink = CollectSink {
                file: &display_path,
                results: &mut results,
                match_count: &mut match_count,
                max: args.max_results,
            };

            let mut searcher = searcher_builder.build();
            if let Err(e) = searcher.search_path(&matcher, &file_path, &mut sink) {
                // Binary or unreadable files are skipped, not reported
                debug!(?file_path, %e, "GrepTool::execute: skipping file");
            }
        }

        debug!(results_count = %results.len(), %match_count, "GrepTool::execute: search complete");
        ToolResult::success(format_results(&args.pattern, &results, match_count, args.max_results))
    }
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref())
}

#[derive(Debug)]
struct MatchResult {
    file: String,
    line_num: u64,
    line: String,
    is_context: bool,
}

/// Collects matched and context lines until the match cap is reached
struct CollectSink<'a> {
    file: &'a str,
    results: &'a mut Vec<MatchResult>,
    match_count: &'a mut usize,
    max: usize,
}

impl Sink for CollectSink<'_> {
    type Error = std::io::Error;

    fn matched(&mut self, _searcher: &Searcher, mat: &SinkMatch<'_>) -> Result<bool, Self::Error> {
        if *self.match_count >= self.max {
            return Ok(false);
        }
        self.results.push(MatchResult {
            file: self.file.to_string(),
            line_num: mat.line_number().unwrap_or(0),
            line: String::from_utf8_lossy(mat.bytes()).trim_end().to_string(),
            is_context: false,
        });
        *self.match_count += 1;
        Ok(true)
    }

    fn context(&mut self, _searcher: &Searcher, ctx: &SinkContext<'_>) -> Result<bool, Self::Error> {
        if *self.match_count >= self.max {
            return Ok(false);
        }
        self.results.push(MatchResult {
            file: self.file.to_string(),
            line_num: ctx.line_number().unwrap_or(0),
            line: String::from_utf8_lossy(ctx.bytes()).trim_end().to_string(),
            is_context: true,
        });
        Ok(true)
    }
}

/// Match lines render as file:line:content, context lines as file-line-content
fn format_results(
    pattern: &str,
    results: &[MatchResult],
    match_count: usize,
    max_results: usize,
) -> String {
    debug!(results_count = %results.len(), %match_count, "format_results: called");
    let mut output = format!("Found {} matches for '{}':\n", match_count, pattern);

    for result in results {
        let separator = if result.is_context { "-" } else { ":" };
        output.push_str(&format!(
            "  {}{}{}{}{}\n",
            result.file, separator, result.line_num, separator, result.line
        ));
    }

    if match_count >= max_results {
        debug!("format_results: output truncated at max results");
        output.push_str(&format!("... (truncated at {} matches)\n", max_results));
    }

    output.trim_end().to_string()
}
