//! Tree scan: every regular file under the root, ignore-set directories pruned,
//! ordered by relative path so every later stage sees the same sequence.

use ignore::WalkBuilder;
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::AnalyzeError;
use crate::config::Config;

pub const TREE_TRUNCATION_MARKER: &str = "... (truncated)";

/// One scanned file. Never mutated after the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Root-relative path with `/` separators.
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub size: u64,
    /// Lowercase extension without the dot, empty when absent.
    pub ext: String,
    pub language: Option<String>,
}

impl FileEntry {
    pub fn name(&self) -> &str {
        self.rel_path.rsplit('/').next().unwrap_or(&self.rel_path)
    }

    /// Number of `/` separators in the relative path.
    pub fn depth(&self) -> usize {
        self.rel_path.matches('/').count()
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.rel_path.split('/')
    }

    /// Lowercase name without the final extension.
    pub fn stem(&self) -> String {
        Path::new(self.name())
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| self.name().to_lowercase())
    }

    /// Canonical path used for deduplication; falls back to the scanned path.
    pub fn identity(&self) -> PathBuf {
        fs::canonicalize(&self.abs_path).unwrap_or_else(|_| self.abs_path.clone())
    }
}

pub fn check_root(root: &Path) -> Result<(), AnalyzeError> {
    if !root.exists() {
        return Err(AnalyzeError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(AnalyzeError::RootNotDirectory(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|source| AnalyzeError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Enumerate files under `root`. Entries that fail to stat are skipped.
pub fn scan(root: &Path, config: &Config) -> Result<Vec<FileEntry>, AnalyzeError> {
    check_root(root)?;

    let ignore_dirs: Arc<HashSet<String>> =
        Arc::new(config.scan.ignore_dirs.iter().cloned().collect());
    let prune = Arc::clone(&ignore_dirs);

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            !(entry.depth() > 0
                && is_dir
                && prune.contains(entry.file_name().to_string_lossy().as_ref()))
        });

    let mut files = Vec::new();
    let mut skipped = 0usize;

    for entry in builder.build() {
        let entry = match entry {
            Ok(value) => value,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            continue;
        }

        let abs_path = entry.path();
        let metadata = match fs::metadata(abs_path) {
            Ok(m) => m,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        // Symlinks count when they point at a regular file; linked dirs are not walked.
        if !metadata.is_file() {
            continue;
        }

        let Ok(rel) = abs_path.strip_prefix(root) else {
            continue;
        };
        let in_ignored_dir = rel.parent().is_some_and(|dir| {
            dir.components()
                .any(|c| ignore_dirs.contains(c.as_os_str().to_string_lossy().as_ref()))
        });
        if in_ignored_dir {
            continue;
        }

        let rel_path = normalize_rel_path(rel);
        let ext = rel
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let language = config.signals.languages.get(&ext).cloned();

        files.push(FileEntry {
            rel_path,
            abs_path: abs_path.to_path_buf(),
            size: metadata.len(),
            ext,
            language,
        });
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    debug!(
        "scan root={} files={} skipped={}",
        root.display(),
        files.len(),
        skipped
    );
    Ok(files)
}

fn normalize_rel_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Newline-joined relative paths; the marker line is added only when entries were cut.
pub fn render_tree(files: &[FileEntry], max_entries: usize) -> String {
    let mut lines: Vec<&str> = files
        .iter()
        .take(max_entries)
        .map(|f| f.rel_path.as_str())
        .collect();
    if files.len() > max_entries {
        lines.push(TREE_TRUNCATION_MARKER);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn scan_is_sorted_and_prunes_ignored_dirs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/b.py", "x");
        touch(dir.path(), "a.txt", "x");
        touch(dir.path(), "node_modules/pkg/index.js", "x");
        touch(dir.path(), ".git/config", "x");
        touch(dir.path(), "pkg/build/out.js", "x");
        touch(dir.path(), ".github/workflows/ci.yml", "x");

        let files = scan(dir.path(), &Config::default()).unwrap();
        let rels: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(rels, vec![".github/workflows/ci.yml", "a.txt", "src/b.py"]);
    }

    #[test]
    fn scan_records_size_extension_and_language() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "lib/Util.TS", "export const a = 1;\n");
        touch(dir.path(), "Makefile", "all:\n");

        let files = scan(dir.path(), &Config::default()).unwrap();
        let util = files.iter().find(|f| f.rel_path == "lib/Util.TS").unwrap();
        assert_eq!(util.ext, "ts");
        assert_eq!(util.language.as_deref(), Some("TypeScript"));
        assert_eq!(util.size, 20);
        assert_eq!(util.stem(), "util");
        assert_eq!(util.depth(), 1);

        let make = files.iter().find(|f| f.rel_path == "Makefile").unwrap();
        assert_eq!(make.ext, "");
        assert_eq!(make.language, None);
    }

    #[test]
    fn root_named_like_ignored_dir_is_still_scanned() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "build/main.py", "print(1)");
        let files = scan(&dir.path().join("build"), &Config::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path, "main.py");
    }

    #[test]
    fn files_named_like_ignored_dirs_are_kept() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "build", "#!/bin/sh\n");
        touch(dir.path(), "tools/vendor", "x");
        touch(dir.path(), "vendor/lib.go", "package lib");

        let files = scan(dir.path(), &Config::default()).unwrap();
        let rels: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["build", "tools/vendor"]);
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = scan(&dir.path().join("nope"), &Config::default()).unwrap_err();
        assert!(matches!(err, AnalyzeError::RootNotFound(_)));
    }

    #[test]
    fn file_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "one.py", "");
        let err = scan(&dir.path().join("one.py"), &Config::default()).unwrap_err();
        assert!(matches!(err, AnalyzeError::RootNotDirectory(_)));
    }

    #[test]
    fn empty_root_yields_no_files() {
        let dir = TempDir::new().unwrap();
        assert!(scan(dir.path(), &Config::default()).unwrap().is_empty());
    }

    #[test]
    fn render_tree_marks_truncation_only_when_cut() {
        let dir = TempDir::new().unwrap();
        for name in ["a.py", "b.py", "c.py"] {
            touch(dir.path(), name, "");
        }
        let files = scan(dir.path(), &Config::default()).unwrap();

        assert_eq!(render_tree(&files, 3), "a.py\nb.py\nc.py");
        assert_eq!(
            render_tree(&files, 2),
            format!("a.py\nb.py\n{TREE_TRUNCATION_MARKER}")
        );
    }
}
