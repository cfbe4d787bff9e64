//! FileCache - lazily-built multi-index over the exploration root
//!
//! One recursive walk feeds four indices: file name, lowercased extension,
//! parent directory, and the set of non-hidden directories. The walk runs
//! at most once per instance; every later lookup is a bucket access. A
//! walk failure propagates to the caller and leaves the cache un-built.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::debug;
use walkdir::WalkDir;

/// Cap on files_by_pattern results
pub const PATTERN_RESULT_CAP: usize = 20;

/// Errors from building the file index
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Default)]
struct FileIndex {
    by_name: HashMap<String, Vec<PathBuf>>,
    by_extension: HashMap<String, Vec<PathBuf>>,
    by_dir: HashMap<PathBuf, Vec<PathBuf>>,
    directories: BTreeSet<PathBuf>,
    total_files: usize,
}

/// Multi-index file lookup over one codebase root
pub struct FileCache {
    root: PathBuf,
    index: OnceCell<FileIndex>,
    builds: AtomicUsize,
}

impl FileCache {
    /// Create an unbuilt cache for the given root; no I/O happens here
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!(?root, "FileCache::new: called");
        Self {
            root,
            index: OnceCell::new(),
            builds: AtomicUsize::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of completed index builds (1 after any successful lookup)
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    async fn index(&self) -> Result<&FileIndex, CacheError> {
        self.index.get_or_try_init(|| async { self.build() }).await
    }

    fn build(&self) -> Result<FileIndex, CacheError> {
        debug!(root = ?self.root, "FileCache::build: called");
        if !self.root.is_dir() {
            debug!("FileCache::build: root is not a directory");
            return Err(CacheError::NotADirectory {
                path: self.root.clone(),
            });
        }

        let mut index = FileIndex::default();

        for entry in WalkDir::new(&self.root).follow_links(false).sort_by_file_name() {
            let entry = entry?;
            if entry.path() == self.root {
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_path_buf();

            if entry.file_type().is_dir() {
                // Hidden directories and everything nested under them stay
                // out of the directory set; their contents are still
                // indexed as files
                let hidden = rel
                    .components()
                    .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
                if !hidden {
                    index.directories.insert(rel);
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            index.by_name.entry(name).or_default().push(rel.clone());

            if let Some(ext) = rel.extension().and_then(|e| e.to_str()) {
                index
                    .by_extension
                    .entry(ext.to_lowercase())
                    .or_default()
                    .push(rel.clone());
            }

            let parent = rel.parent().map(Path::to_path_buf).unwrap_or_default();
            index.by_dir.entry(parent).or_default().push(rel);

            index.total_files += 1;
        }

        self.builds.fetch_add(1, Ordering::SeqCst);
        debug!(
            total_files = index.total_files,
            directories = index.directories.len(),
            "FileCache::build: index built"
        );
        Ok(index)
    }

    /// Every indexed file as a root-relative path, sorted
    pub async fn all_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        debug!("FileCache::all_files: called");
        let index = self.index().await?;
        let mut files: Vec<PathBuf> = index.by_name.values().flatten().cloned().collect();
        files.sort();
        Ok(files)
    }

    /// All files with this exact name, as root-relative paths
    pub async fn files_by_name(&self, name: &str) -> Result<Vec<PathBuf>, CacheError> {
        debug!(%name, "FileCache::files_by_name: called");
        Ok(self.index().await?.by_name.get(name).cloned().unwrap_or_default())
    }

    /// All files with this extension; accepts "rs" or ".rs", case-insensitive
    pub async fn files_by_extension(&self, ext: &str) -> Result<Vec<PathBuf>, CacheError> {
        let normalized = ext.trim_start_matches('.').to_lowercase();
        debug!(%ext, %normalized, "FileCache::files_by_extension: called");
        Ok(self
            .index()
            .await?
            .by_extension
            .get(&normalized)
            .cloned()
            .unwrap_or_default())
    }

    /// Files whose relative path matches the glob, capped at PATTERN_RESULT_CAP
    pub async fn files_by_pattern(&self, pattern: &str) -> Result<Vec<PathBuf>, CacheError> {
        debug!(%pattern, "FileCache::files_by_pattern: called");
        let index = self.index().await?;

        let Ok(glob) = glob::Pattern::new(pattern) else {
            debug!(%pattern, "FileCache::files_by_pattern: invalid glob, no matches");
            return Ok(Vec::new());
        };

        let mut matches = Vec::new();
        'outer: for bucket in index.by_dir.values() {
            for path in bucket {
                if glob.matches(&path.to_string_lossy()) {
                    matches.push(path.clone());
                    if matches.len() >= PATTERN_RESULT_CAP {
                        break 'outer;
                    }
                }
            }
        }
        matches.sort();
        Ok(matches)
    }

    /// All non-hidden directories, sorted
    pub async fn directories(&self) -> Result<Vec<PathBuf>, CacheError> {
        debug!("FileCache::directories: called");
        Ok(self.index().await?.directories.iter().cloned().collect())
    }

    /// Files directly inside the given directory ("." or "" for the root)
    pub async fn files_in_dir(&self, dir: &str) -> Result<Vec<PathBuf>, CacheError> {
        debug!(%dir, "FileCache::files_in_dir: called");
        let key = if dir == "." || dir.is_empty() {
            PathBuf::new()
        } else {
            PathBuf::from(dir)
        };
        Ok(self.index().await?.by_dir.get(&key).cloned().unwrap_or_default())
    }

    /// Whether the path exists under the root (direct filesystem check)
    pub fn has_file(&self, path: &str) -> bool {
        let result = self.root.join(path).exists();
        debug!(%path, %result, "FileCache::has_file: returning");
        result
    }

    /// Total number of indexed files
    pub async fn count_files(&self) -> Result<usize, CacheError> {
        Ok(self.index().await?.total_files)
    }

    /// Extension -> file count, sorted by extension
    pub async fn extension_counts(&self) -> Result<BTreeMap<String, usize>, CacheError> {
        debug!("FileCache::extension_counts: called");
        Ok(self
            .index()
            .await?
            .by_extension
            .iter()
            .map(|(ext, files)| (ext.clone(), files.len()))
            .collect())
    }
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCache")
            .field("root", &self.root)
            .field("built", &self.index.initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample_tree() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src/api")).unwrap();
        fs::create_dir_all(temp.path().join(".git/objects")).unwrap();
        fs::write(temp.path().join("main.py"), "print('hi')").unwrap();
        fs::write(temp.path().join("README.md"), "# readme").unwrap();
        fs::write(temp.path().join("src/app.py"), "app = 1").unwrap();
        fs::write(temp.path().join("src/api/routes.PY"), "routes = 1").unwrap();
        fs::write(temp.path().join(".git/config"), "[core]").unwrap();
        temp
    }

    #[tokio::test]
    async fn test_count_files_matches_tree() {
        let temp = sample_tree();
        let cache = FileCache::new(temp.path());

        // main.py, README.md, src/app.py, src/api/routes.PY, .git/config
        assert_eq!(cache.count_files().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_builds_exactly_once() {
        let temp = sample_tree();
        let cache = FileCache::new(temp.path());

        assert_eq!(cache.build_count(), 0);
        cache.files_by_name("main.py").await.unwrap();
        cache.directories().await.unwrap();
        cache.count_files().await.unwrap();
        assert_eq!(cache.build_count(), 1);
    }

    #[tokio::test]
    async fn test_files_by_name() {
        let temp = sample_tree();
        let cache = FileCache::new(temp.path());

        let files = cache.files_by_name("app.py").await.unwrap();
        assert_eq!(files, vec![PathBuf::from("src/app.py")]);

        assert!(cache.files_by_name("missing.py").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_files_sorted() {
        let temp = sample_tree();
        let cache = FileCache::new(temp.path());

        let files = cache.all_files().await.unwrap();
        assert_eq!(files.len(), cache.count_files().await.unwrap());
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[tokio::test]
    async fn test_files_by_extension_normalizes() {
        let temp = sample_tree();
        let cache = FileCache::new(temp.path());

        // routes.PY is indexed under "py"; queries accept ".py" and "PY"
        let files = cache.files_by_extension(".py").await.unwrap();
        assert_eq!(files.len(), 3);
        let files_upper = cache.files_by_extension("PY").await.unwrap();
        assert_eq!(files_upper.len(), 3);
    }

    #[tokio::test]
    async fn test_files_by_pattern_caps_results() {
        let temp = tempdir().unwrap();
        for i in 0..30 {
            fs::write(temp.path().join(format!("mod_{i:02}.rs")), "").unwrap();
        }
        let cache = FileCache::new(temp.path());

        let matches = cache.files_by_pattern("mod_*.rs").await.unwrap();
        assert_eq!(matches.len(), PATTERN_RESULT_CAP);
    }

    #[tokio::test]
    async fn test_directories_exclude_hidden_but_files_counted() {
        let temp = sample_tree();
        let cache = FileCache::new(temp.path());

        let dirs = cache.directories().await.unwrap();
        assert!(dirs.contains(&PathBuf::from("src")));
        assert!(dirs.contains(&PathBuf::from("src/api")));
        assert!(!dirs.iter().any(|d| d.starts_with(".git")));

        // .git/config is still reachable by name
        let configs = cache.files_by_name("config").await.unwrap();
        assert_eq!(configs, vec![PathBuf::from(".git/config")]);
    }

    #[tokio::test]
    async fn test_files_in_dir() {
        let temp = sample_tree();
        let cache = FileCache::new(temp.path());

        let top = cache.files_in_dir(".").await.unwrap();
        assert!(top.contains(&PathBuf::from("main.py")));
        assert!(top.contains(&PathBuf::from("README.md")));

        let src = cache.files_in_dir("src").await.unwrap();
        assert_eq!(src, vec![PathBuf::from("src/app.py")]);
    }

    #[tokio::test]
    async fn test_has_file() {
        let temp = sample_tree();
        let cache = FileCache::new(temp.path());

        assert!(cache.has_file("main.py"));
        assert!(cache.has_file("src/app.py"));
        assert!(!cache.has_file("nope.py"));
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal_and_cache_stays_unbuilt() {
        let cache = FileCache::new("/definitely/not/a/real/path");

        let err = cache.count_files().await.unwrap_err();
        assert!(matches!(err, CacheError::NotADirectory { .. }));
        assert_eq!(cache.build_count(), 0);
    }

    #[tokio::test]
    async fn test_extension_counts() {
        let temp = sample_tree();
        let cache = FileCache::new(temp.path());

        let counts = cache.extension_counts().await.unwrap();
        assert_eq!(counts.get("py"), Some(&3));
        assert_eq!(counts.get("md"), Some(&1));
    }
}
