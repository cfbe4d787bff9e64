//! Codebase fingerprinting
//!
//! Shallow classification of a repository without reading file contents:
//! language counts by extension, build-tool markers, total file count.
//! Everything is answered from the FileCache indices, so a scan costs one
//! directory walk at most.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

use crate::cache::{CacheError, FileCache};

/// Marker file name -> build tool it indicates
const BUILD_TOOL_MARKERS: &[(&str, &str)] = &[
    ("Makefile", "Make"),
    ("package.json", "Node.js"),
    ("requirements.txt", "Python"),
    ("pyproject.toml", "Python"),
    ("go.mod", "Go Modules"),
    ("Cargo.toml", "Cargo"),
    ("pom.xml", "Maven"),
    ("build.gradle", "Gradle"),
    ("Dockerfile", "Docker"),
    ("docker-compose.yml", "Docker Compose"),
    ("docker-compose.yaml", "Docker Compose"),
    ("tsconfig.json", "TypeScript"),
    ("CMakeLists.txt", "CMake"),
    ("yarn.lock", "Yarn"),
    ("pnpm-lock.yaml", "pnpm"),
    ("poetry.lock", "Poetry"),
    ("Gemfile.lock", "Bundler"),
];

/// Map a lowercased extension (no dot) to a language name
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let language = match ext {
        "py" => "python",
        "js" | "mjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "java" => "java",
        "go" => "go",
        "rs" => "rust",
        "c" | "h" => "c",
        "cpp" | "cxx" | "cc" | "hpp" | "hxx" => "cpp",
        "php" | "phtml" => "php",
        "rb" | "rbw" => "ruby",
        "html" | "htm" => "html",
        "css" | "scss" | "sass" | "less" => "css",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "md" | "markdown" => "markdown",
        "sh" | "bash" | "zsh" | "fish" => "shell",
        "sql" => "sql",
        "xml" | "xsl" | "xslt" => "xml",
        "toml" => "toml",
        "ini" | "cfg" | "conf" => "ini",
        _ => return None,
    };
    Some(language)
}

/// Fold raw extension counts into language counts
///
/// Unrecognized extensions are kept under an `other_{ext}` key so the
/// fingerprint never silently drops a file class.
pub fn language_counts(extension_counts: &BTreeMap<String, usize>) -> BTreeMap<String, usize> {
    debug!(extensions = extension_counts.len(), "language_counts: called");
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for (ext, count) in extension_counts {
        let key = match language_for_extension(ext) {
            Some(language) => language.to_string(),
            None => format!("other_{ext}"),
        };
        *counts.entry(key).or_default() += count;
    }
    counts
}

/// Shallow fingerprint of a codebase, used to seed planning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Absolute path that was scanned
    pub path: String,
    /// Directory name of the root
    pub name: String,
    pub total_files: usize,
    /// language -> file count
    pub languages: BTreeMap<String, usize>,
    pub build_tools: Vec<String>,
    /// Seconds spent scanning
    pub scan_time: f64,
}

/// Fingerprint the cache's root
pub async fn scan(cache: &FileCache) -> Result<Fingerprint, CacheError> {
    debug!(root = ?cache.root(), "scan: called");
    let start = Instant::now();

    let total_files = cache.count_files().await?;
    let languages = language_counts(&cache.extension_counts().await?);

    let mut build_tools = Vec::new();
    for (marker, tool) in BUILD_TOOL_MARKERS {
        if cache.has_file(marker) || !cache.files_by_name(marker).await?.is_empty() {
            let tool = tool.to_string();
            // requirements.txt and pyproject.toml both map to Python
            if !build_tools.contains(&tool) {
                build_tools.push(tool);
            }
        }
    }

    let name = cache
        .root()
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());

    let fingerprint = Fingerprint {
        path: cache.root().display().to_string(),
        name,
        total_files,
        languages,
        build_tools,
        scan_time: start.elapsed().as_secs_f64(),
    };

    info!(
        total_files = fingerprint.total_files,
        languages = fingerprint.languages.len(),
        build_tools = fingerprint.build_tools.len(),
        "scan: fingerprint complete"
    );
    Ok(fingerprint)
}
