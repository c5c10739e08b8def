//! Cross-file reference counts from lexical imports.
//!
//! This is a centrality proxy for file selection, not a verified dependency
//! graph. A token whose stem is shared by several files credits every one of
//! them: recall is preferred over guessing a single target.

use log::{debug, trace};
use std::collections::{BTreeSet, HashMap};

use super::extractors::{extractor_for, ImportExtractor};
use super::scanner::FileEntry;
use super::text;
use crate::config::GraphConfig;

/// Maps a lowercase stem to candidate file indices.
pub trait Resolver {
    fn resolve(&self, stem: &str) -> &[usize];
}

/// Lowercase stem -> indices of every scanned file with that stem.
#[derive(Debug, Default)]
pub struct BasenameIndex {
    by_stem: HashMap<String, Vec<usize>>,
}

impl BasenameIndex {
    pub fn build(files: &[FileEntry]) -> Self {
        let mut by_stem: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, file) in files.iter().enumerate() {
            by_stem.entry(file.stem()).or_default().push(idx);
        }
        Self { by_stem }
    }
}

impl Resolver for BasenameIndex {
    fn resolve(&self, stem: &str) -> &[usize] {
        self.by_stem.get(stem).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportGraph {
    /// Number of distinct source files that resolve to this file.
    pub inbound: HashMap<String, usize>,
    /// Number of distinct files this file resolves to, itself excluded.
    pub outbound: HashMap<String, usize>,
    pub scanned_files: usize,
}

impl ImportGraph {
    pub fn build(
        files: &[FileEntry],
        resolver: &dyn Resolver,
        extractors: &[Box<dyn ImportExtractor>],
        config: &GraphConfig,
    ) -> Self {
        let source_exts: BTreeSet<String> = config
            .source_extensions
            .iter()
            .map(|e| e.to_lowercase())
            .collect();

        let mut candidates: Vec<usize> = files
            .iter()
            .enumerate()
            .filter(|(_, f)| source_exts.contains(&f.ext))
            .map(|(idx, _)| idx)
            .collect();
        // largest first; stable so equal sizes keep scan order
        candidates.sort_by(|a, b| files[*b].size.cmp(&files[*a].size));
        candidates.truncate(config.max_files_to_scan);

        let mut graph = ImportGraph::default();

        for src_idx in candidates {
            let source = &files[src_idx];
            let Some(extractor) = extractor_for(extractors, &source.ext) else {
                continue;
            };
            let Ok(content) = text::read_lossy(&source.abs_path) else {
                continue;
            };
            graph.scanned_files += 1;

            let content = text::clip_chars(&content, config.scan_max_chars);
            let targets = resolve_targets(extractor, resolver, content, src_idx);
            trace!(
                "import_graph {} via {} -> {} targets",
                source.rel_path,
                extractor.name(),
                targets.len()
            );
            if targets.is_empty() {
                continue;
            }

            graph
                .outbound
                .insert(source.rel_path.clone(), targets.len());
            for target in targets {
                *graph
                    .inbound
                    .entry(files[target].rel_path.clone())
                    .or_insert(0) += 1;
            }
        }

        debug!(
            "import_graph scanned={} sources_with_refs={} referenced={}",
            graph.scanned_files,
            graph.outbound.len(),
            graph.inbound.len()
        );
        graph
    }

    pub fn inbound_of(&self, rel_path: &str) -> usize {
        self.inbound.get(rel_path).copied().unwrap_or(0)
    }

    pub fn outbound_of(&self, rel_path: &str) -> usize {
        self.outbound.get(rel_path).copied().unwrap_or(0)
    }

    /// Files with nonzero inbound count, most referenced first, ties by path.
    pub fn most_referenced(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .inbound
            .iter()
            .filter(|&(_, &n)| n > 0)
            .map(|(rel, &n)| (rel.as_str(), n))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(limit);
        ranked
    }
}

/// Distinct resolved targets of one source file, never including the source itself.
fn resolve_targets(
    extractor: &dyn ImportExtractor,
    resolver: &dyn Resolver,
    content: &str,
    src_idx: usize,
) -> BTreeSet<usize> {
    let mut targets = BTreeSet::new();
    for token in extractor.extract(content) {
        let Some(stem) = extractor.token_stem(&token) else {
            continue;
        };
        targets.extend(
            resolver
                .resolve(&stem)
                .iter()
                .copied()
                .filter(|&idx| idx != src_idx),
        );
    }
    targets
}
