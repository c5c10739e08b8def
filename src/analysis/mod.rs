//! Repository analysis pipeline.
//!
//! scan -> {language profile, entrypoints, signals} -> basename index + import
//! graph -> four-tier selection -> evidence bundle. One run reads one snapshot
//! of the tree; nothing is re-scored or re-ordered after it is built.

use log::{debug, info};
use std::path::{Path, PathBuf};

mod error;
mod evidence;
mod extractors;
mod grounding;
mod import_graph;
mod languages;
mod scanner;
mod selector;
mod signals;
mod text;

pub use error::AnalyzeError;
pub use evidence::EvidenceBundle;

use evidence::read_evidence;
use extractors::{default_extractors, ImportExtractor};
use grounding::render_grounding;
use import_graph::{BasenameIndex, ImportGraph};
use languages::LanguageProfile;
use scanner::{render_tree, scan, FileEntry};
use selector::SelectionList;
use signals::{EntrypointSet, SignalsRecord};

use crate::config::Config;

/// Everything derived from one scan of a repository root.
#[derive(Debug)]
pub struct Analysis {
    pub root: PathBuf,
    pub files: Vec<FileEntry>,
    pub signals: SignalsRecord,
    pub graph: ImportGraph,
    pub selection: SelectionList,
}

impl Analysis {
    pub fn run(root: &Path, config: &Config) -> Result<Self, AnalyzeError> {
        Self::run_with(root, config, &default_extractors())
    }

    /// Run with a custom extractor set; the first extractor handling an extension wins.
    pub fn run_with(
        root: &Path,
        config: &Config,
        extractors: &[Box<dyn ImportExtractor>],
    ) -> Result<Self, AnalyzeError> {
        let files = scan(root, config)?;
        let profile = LanguageProfile::from_files(&files);
        let entrypoints = EntrypointSet::detect(&files, &config.signals);
        let signals = SignalsRecord::build(&files, &profile, &entrypoints, &config.signals);

        let index = BasenameIndex::build(&files);
        let graph = ImportGraph::build(&files, &index, extractors, &config.graph);

        let selection = selector::select(
            &files,
            &entrypoints,
            &graph,
            &config.signals,
            &config.select,
        );

        info!(
            "analysis root={} files={} primary={} selected={}",
            root.display(),
            files.len(),
            profile.primary.as_deref().unwrap_or("-"),
            selection.len()
        );
        debug!("selection order: {}", selection.rel_paths().join(", "));

        Ok(Self {
            root: root.to_path_buf(),
            files,
            signals,
            graph,
            selection,
        })
    }

    pub fn tree(&self, config: &Config) -> String {
        render_tree(&self.files, config.scan.tree_max_entries)
    }

    pub fn evidence(&self, config: &Config) -> EvidenceBundle {
        read_evidence(&self.selection.files, &config.evidence)
    }

    pub fn grounding(&self, config: &Config) -> String {
        render_grounding(&self.signals, &self.tree(config), &self.evidence(config))
    }
}
