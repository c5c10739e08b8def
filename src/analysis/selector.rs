//! Four-tier file selection: pinned manifests, entry files, import centrality,
//! then a heuristic score over every file. Earlier tiers always win; a file is
//! never admitted twice, compared by canonical path.

use aho_corasick::AhoCorasick;
use log::debug;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use super::import_graph::ImportGraph;
use super::scanner::FileEntry;
use super::signals::{lowercase_set, EntrypointSet};
use crate::config::{ScoreWeights, SelectConfig, SignalsConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Pinned,
    Entrypoint,
    Centrality,
    Heuristic,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Pinned => "pinned",
            Tier::Entrypoint => "entry",
            Tier::Centrality => "central",
            Tier::Heuristic => "scored",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedFile {
    pub rel_path: String,
    #[serde(skip)]
    pub abs_path: PathBuf,
    pub tier: Tier,
    /// Heuristic score; only set for the heuristic tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    pub inbound: usize,
    pub outbound: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionList {
    pub files: Vec<SelectedFile>,
}

impl SelectionList {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn rel_paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.rel_path.as_str()).collect()
    }

    pub fn render_text(&self) -> String {
        let width = self.files.len().to_string().len();
        let mut out = String::new();
        for (i, file) in self.files.iter().enumerate() {
            let score = file
                .score
                .map(|s| format!(" score={s}"))
                .unwrap_or_default();
            out.push_str(&format!(
                "{:>width$}. [{}] {} (in={} out={}){}\n",
                i + 1,
                file.tier.label(),
                file.rel_path,
                file.inbound,
                file.outbound,
                score,
                width = width
            ));
        }
        out
    }
}

/// Scores a file for the heuristic tier. `None` means excluded outright.
pub struct HeuristicScorer {
    priority_files: HashSet<String>,
    entry_filenames: HashSet<String>,
    code_dirs: HashSet<String>,
    deprioritized_dirs: HashSet<String>,
    handler_suffixes: Vec<String>,
    routing_hints: Option<AhoCorasick>,
    config_hints: Option<AhoCorasick>,
    hard_size_ceiling: u64,
    size_penalty_divisor: u64,
    wiring_outbound_threshold: usize,
    weights: ScoreWeights,
}

fn substring_matcher(patterns: &[String]) -> Option<AhoCorasick> {
    let lowered: Vec<String> = patterns.iter().map(|p| p.to_lowercase()).collect();
    if lowered.is_empty() {
        return None;
    }
    AhoCorasick::new(lowered).ok()
}

impl HeuristicScorer {
    pub fn new(signals: &SignalsConfig, select: &SelectConfig) -> Self {
        Self {
            priority_files: signals.priority_files.iter().cloned().collect(),
            entry_filenames: lowercase_set(&signals.entry_filenames),
            code_dirs: select.code_dir_hints.iter().cloned().collect(),
            deprioritized_dirs: select.deprioritized_dirs.iter().cloned().collect(),
            handler_suffixes: select
                .handler_suffixes
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            routing_hints: substring_matcher(&select.routing_substrings),
            config_hints: substring_matcher(&select.config_substrings),
            hard_size_ceiling: select.hard_size_ceiling,
            size_penalty_divisor: select.size_penalty_divisor,
            wiring_outbound_threshold: select.wiring_outbound_threshold,
            weights: select.weights.clone(),
        }
    }

    pub fn score(&self, file: &FileEntry, outbound: usize) -> Option<i64> {
        if file.size > self.hard_size_ceiling {
            return None;
        }

        let w = &self.weights;
        let name = file.name();
        let lower_name = name.to_lowercase();
        let lower_path = file.rel_path.to_lowercase();
        let mut score: i64 = 0;

        if self.priority_files.contains(name) {
            score += w.priority_file;
        }
        if file.components().any(|c| self.code_dirs.contains(c)) {
            score += w.code_dir;
        }
        if file.components().any(|c| self.deprioritized_dirs.contains(c)) {
            score += w.deprioritized_dir;
        }
        if self.entry_filenames.contains(&lower_name) {
            score += w.entry_filename;
        }
        if self
            .handler_suffixes
            .iter()
            .any(|suffix| lower_name.ends_with(suffix.as_str()))
        {
            score += w.handler_suffix;
        }
        if self
            .routing_hints
            .as_ref()
            .is_some_and(|ac| ac.is_match(&lower_path))
        {
            score += w.routing_path;
        }
        if self
            .config_hints
            .as_ref()
            .is_some_and(|ac| ac.is_match(&lower_path))
        {
            score += w.config_path;
        }

        if self.size_penalty_divisor > 0 {
            score -= (file.size / self.size_penalty_divisor) as i64;
        }
        if outbound >= self.wiring_outbound_threshold {
            score += w.wiring;
        }

        Some(score)
    }
}

/// Accumulates tiers in order, skipping anything already admitted.
struct Collector<'a> {
    graph: &'a ImportGraph,
    max_files: usize,
    seen: HashSet<PathBuf>,
    out: Vec<SelectedFile>,
}

impl<'a> Collector<'a> {
    fn is_full(&self) -> bool {
        self.out.len() >= self.max_files
    }

    fn add(&mut self, file: &FileEntry, tier: Tier, score: Option<i64>) {
        if self.is_full() {
            return;
        }
        if !self.seen.insert(file.identity()) {
            return;
        }
        self.out.push(SelectedFile {
            rel_path: file.rel_path.clone(),
            abs_path: file.abs_path.clone(),
            tier,
            score,
            inbound: self.graph.inbound_of(&file.rel_path),
            outbound: self.graph.outbound_of(&file.rel_path),
        });
    }
}

/// Near-root manifests with the primary root README moved to the front.
fn pinned_tier<'f>(
    by_rel: &HashMap<&str, &'f FileEntry>,
    entrypoints: &EntrypointSet,
    signals: &SignalsConfig,
) -> Vec<&'f FileEntry> {
    let mut pinned: Vec<&FileEntry> = entrypoints
        .near_root
        .iter()
        .filter_map(|rel| by_rel.get(rel.as_str()).copied())
        .collect();

    let readme = signals
        .readme_names
        .iter()
        .find_map(|name| by_rel.get(name.as_str()).copied());
    if let Some(readme) = readme {
        pinned.retain(|f| f.rel_path != readme.rel_path);
        pinned.insert(0, readme);
    }
    pinned
}

/// Heuristic survivors (score > 0), best first; equal scores keep scan order.
pub fn heuristic_tier<'f>(
    files: &'f [FileEntry],
    graph: &ImportGraph,
    scorer: &HeuristicScorer,
) -> Vec<(&'f FileEntry, i64)> {
    let mut scored: Vec<(&FileEntry, i64)> = files
        .iter()
        .filter_map(|f| {
            scorer
                .score(f, graph.outbound_of(&f.rel_path))
                .map(|s| (f, s))
        })
        .filter(|(_, s)| *s > 0)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}

pub fn select(
    files: &[FileEntry],
    entrypoints: &EntrypointSet,
    graph: &ImportGraph,
    signals: &SignalsConfig,
    config: &SelectConfig,
) -> SelectionList {
    let by_rel: HashMap<&str, &FileEntry> =
        files.iter().map(|f| (f.rel_path.as_str(), f)).collect();

    let mut collector = Collector {
        graph,
        max_files: config.max_files,
        seen: HashSet::new(),
        out: Vec::new(),
    };

    for file in pinned_tier(&by_rel, entrypoints, signals) {
        collector.add(file, Tier::Pinned, None);
    }

    for rel in &entrypoints.anywhere {
        if let Some(file) = by_rel.get(rel.as_str()) {
            collector.add(file, Tier::Entrypoint, None);
        }
    }

    for (rel, _) in graph.most_referenced(config.centrality_top_n) {
        if let Some(file) = by_rel.get(rel) {
            collector.add(file, Tier::Centrality, None);
        }
    }

    if !collector.is_full() {
        let scorer = HeuristicScorer::new(signals, config);
        for (file, score) in heuristic_tier(files, graph, &scorer) {
            if collector.is_full() {
                break;
            }
            collector.add(file, Tier::Heuristic, Some(score));
        }
    }

    debug!(
        "select picked={} max={} pinned={} entry={} central={} scored={}",
        collector.out.len(),
        config.max_files,
        count_tier(&collector.out, Tier::Pinned),
        count_tier(&collector.out, Tier::Entrypoint),
        count_tier(&collector.out, Tier::Centrality),
        count_tier(&collector.out, Tier::Heuristic),
    );

    SelectionList {
        files: collector.out,
    }
}

fn count_tier(files: &[SelectedFile], tier: Tier) -> usize {
    files.iter().filter(|f| f.tier == tier).count()
}
