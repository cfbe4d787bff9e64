//! detect_languages tool - language breakdown by file extension

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::cache::CacheError;
use crate::scan::language_counts;
use crate::tools::args::{DetectLanguagesArgs, ToolArgs};
use crate::tools::{Tool, ToolContext, ToolResult};

/// Count files per programming language under a path
pub struct DetectLanguagesTool;

#[async_trait]
impl Tool for DetectLanguagesTool {
    fn name(&self) -> &'static str {
        "detect_languages"
    }

    fn description(&self) -> &'static str {
        "Detect programming languages used in the codebase by file extensions."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path to analyze (default: current directory)"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> ToolResult {
        let ToolArgs::DetectLanguages(args) = args else {
            return ToolResult::error("detect_languages: argument type mismatch");
        };
        debug!(?args, "DetectLanguagesTool::execute: called");

        let extension_counts = match scoped_extension_counts(&args, ctx).await {
            Ok(counts) => counts,
            Err(e) => {
                debug!(%e, "DetectLanguagesTool::execute: index lookup failed");
                return ToolResult::error(e.to_string());
            }
        };

        let languages = language_counts(&extension_counts);
        debug!(language_count = %languages.len(), "DetectLanguagesTool::execute: languages aggregated");

        // Descending by count, name breaks ties
        let mut ranked: Vec<(&String, &usize)> = languages.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        let mut content = format!("Programming languages detected in {}:\n", args.path);
        for (language, count) in ranked {
            content.push_str(&format!("  {}: {} files\n", language, count));
        }
        ToolResult::success(content.trim_end().to_string())
    }
}

/// Extension counts for the whole root, or for one subtree
async fn scoped_extension_counts(
    args: &DetectLanguagesArgs,
    ctx: &ToolContext,
) -> Result<BTreeMap<String, usize>, CacheError> {
    let trimmed = args.path.trim_start_matches("./");
    if trimmed.is_empty() || trimmed == "." {
        return ctx.cache.extension_counts().await;
    }

    let scope = Path::new(trimmed);
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for file in ctx.cache.all_files().await? {
        if !file.starts_with(scope) {
            continue;
        }
        if let Some(ext) = file.extension().and_then(|e| e.to_str()) {
            *counts.entry(ext.to_lowercase()).or_default() += 1;
        }
    }
    Ok(counts)
}
