//! Repository signals: entrypoints, monorepo hint and a sample of route-like
//! literals. Routes are lexical evidence only; nothing here confirms routing.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::languages::LanguageProfile;
use super::scanner::FileEntry;
use super::text;
use crate::config::SignalsConfig;

/// Manifest/readme files near the root and entry-named files anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrypointSet {
    pub near_root: Vec<String>,
    pub anywhere: Vec<String>,
}

impl EntrypointSet {
    pub fn detect(files: &[FileEntry], config: &SignalsConfig) -> Self {
        let priority: HashSet<&str> = config.priority_files.iter().map(String::as_str).collect();
        let entry_names = lowercase_set(&config.entry_filenames);

        let mut near_root = Vec::new();
        let mut anywhere = Vec::new();
        let mut seen_root = HashSet::new();
        let mut seen_any = HashSet::new();

        for file in files {
            if file.depth() <= 1
                && priority.contains(file.name())
                && seen_root.insert(file.rel_path.as_str())
            {
                near_root.push(file.rel_path.clone());
            }
            if entry_names.contains(&file.name().to_lowercase())
                && seen_any.insert(file.rel_path.as_str())
            {
                anywhere.push(file.rel_path.clone());
            }
        }

        Self {
            near_root,
            anywhere,
        }
    }
}

pub(crate) fn lowercase_set(items: &[String]) -> HashSet<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

/// The record handed to the summarizer. Key names are part of the output contract.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SignalsRecord {
    pub languages: Vec<String>,
    pub language_rank: Vec<String>,
    pub language_counts: BTreeMap<String, usize>,
    pub primary_language: Option<String>,
    pub entrypoints_near_root: Vec<String>,
    pub entrypoints_anywhere: Vec<String>,
    pub monorepo_hint: bool,
    pub manifest_paths: Vec<String>,
    pub routes_sample: Vec<String>,
    /// Reserved; never populated by this crate.
    pub framework_hints: Vec<String>,
    /// Reserved; never populated by this crate.
    pub capability_evidence: serde_json::Map<String, serde_json::Value>,
}

impl SignalsRecord {
    pub fn build(
        files: &[FileEntry],
        profile: &LanguageProfile,
        entrypoints: &EntrypointSet,
        config: &SignalsConfig,
    ) -> Self {
        let manifests = manifest_paths(files, config);
        let monorepo_hint = is_monorepo(&manifests);
        let routes_sample = sample_routes(files, entrypoints, config);

        debug!(
            "signals languages={} near_root={} anywhere={} manifests={} routes={}",
            profile.ranked.len(),
            entrypoints.near_root.len(),
            entrypoints.anywhere.len(),
            manifests.len(),
            routes_sample.len()
        );

        Self {
            languages: profile.ranked.clone(),
            language_rank: profile.ranked.clone(),
            language_counts: profile.counts.clone(),
            primary_language: profile.primary.clone(),
            entrypoints_near_root: entrypoints.near_root.clone(),
            entrypoints_anywhere: entrypoints.anywhere.clone(),
            monorepo_hint,
            manifest_paths: manifests
                .into_iter()
                .take(config.manifest_paths_cap)
                .collect(),
            routes_sample,
            framework_hints: Vec::new(),
            capability_evidence: serde_json::Map::new(),
        }
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let counts: Vec<String> = self
            .language_rank
            .iter()
            .map(|lang| format!("{lang}={}", self.language_counts.get(lang).unwrap_or(&0)))
            .collect();

        out.push_str(&format!(
            "primary: {}\n",
            self.primary_language.as_deref().unwrap_or("-")
        ));
        out.push_str(&format!("languages: {}\n", join_or_dash(&counts)));
        out.push_str(&format!(
            "entrypoints (root): {}\n",
            join_or_dash(&self.entrypoints_near_root)
        ));
        out.push_str(&format!(
            "entrypoints (any): {}\n",
            join_or_dash(&self.entrypoints_anywhere)
        ));
        out.push_str(&format!("monorepo: {}\n", self.monorepo_hint));
        out.push_str(&format!("manifests: {}\n", join_or_dash(&self.manifest_paths)));
        out.push_str(&format!("routes: {}\n", join_or_dash(&self.routes_sample)));
        out
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

/// Monorepo-manifest files in scan order.
pub fn manifest_paths(files: &[FileEntry], config: &SignalsConfig) -> Vec<String> {
    let names: HashSet<&str> = config
        .monorepo_manifests
        .iter()
        .map(String::as_str)
        .collect();
    files
        .iter()
        .filter(|f| names.contains(f.name()))
        .map(|f| f.rel_path.clone())
        .collect()
}

/// True when manifests live under two or more distinct parent directories.
pub fn is_monorepo(manifests: &[String]) -> bool {
    let parents: BTreeSet<&str> = manifests
        .iter()
        .map(|rel| rel.rsplit_once('/').map(|(parent, _)| parent).unwrap_or(""))
        .collect();
    parents.len() >= 2
}

lazy_static! {
    static ref ROUTE_LITERAL_RE: Regex =
        Regex::new(r#""(/[^"']+)"|'(/[^"']+)'"#).expect("valid route literal regex");
}

pub fn sample_routes(
    files: &[FileEntry],
    entrypoints: &EntrypointSet,
    config: &SignalsConfig,
) -> Vec<String> {
    let by_rel: HashMap<&str, &FileEntry> =
        files.iter().map(|f| (f.rel_path.as_str(), f)).collect();
    let scan_exts = lowercase_set(&config.route_scan_extensions);

    let mut candidates: Vec<&FileEntry> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    let preferred = entrypoints
        .near_root
        .iter()
        .chain(entrypoints.anywhere.iter())
        .filter_map(|rel| by_rel.get(rel.as_str()).copied())
        .filter(|f| scan_exts.contains(&f.ext));
    let fallback = config
        .route_fallback_files
        .iter()
        .filter_map(|rel| by_rel.get(rel.as_str()).copied());

    for file in preferred.chain(fallback) {
        if seen.insert(file.rel_path.as_str()) {
            candidates.push(file);
        }
    }

    let mut routes: Vec<String> = Vec::new();
    let mut seen_routes: HashSet<String> = HashSet::new();

    for file in candidates.into_iter().take(config.route_scan_max_files) {
        let Ok(content) = text::read_lossy(&file.abs_path) else {
            continue;
        };
        for route in extract_route_literals(&content, config.route_max_len) {
            if seen_routes.insert(route.clone()) {
                routes.push(route);
            }
        }
    }

    routes.truncate(config.routes_cap);
    routes
}

/// Quoted literals starting with `/`, at most `max_len` characters, in source order.
pub fn extract_route_literals(content: &str, max_len: usize) -> Vec<String> {
    ROUTE_LITERAL_RE
        .captures_iter(content)
        .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
        .map(|m| m.as_str())
        .filter(|route| text::char_len(route) <= max_len)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scanner::scan;
    use crate::config::Config;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn signals_for(root: &Path) -> SignalsRecord {
        let cfg = Config::default();
        let files = scan(root, &cfg).unwrap();
        let profile = LanguageProfile::from_files(&files);
        let entrypoints = EntrypointSet::detect(&files, &cfg.signals);
        SignalsRecord::build(&files, &profile, &entrypoints, &cfg.signals)
    }

    #[test]
    fn readme_and_main_py_scenario() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "README.md", "# demo\n");
        touch(dir.path(), "main.py", "print('hi')\n");

        let signals = signals_for(dir.path());
        assert_eq!(signals.primary_language.as_deref(), Some("Python"));
        assert_eq!(signals.entrypoints_near_root, vec!["README.md"]);
        assert_eq!(signals.entrypoints_anywhere, vec!["main.py"]);
        assert!(!signals.monorepo_hint);
    }

    #[test]
    fn near_root_allows_one_level_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "backend/package.json", "{}");
        touch(dir.path(), "a/b/package.json", "{}");
        touch(dir.path(), "src/cmd/Main.java", "class Main {}");

        let signals = signals_for(dir.path());
        assert_eq!(signals.entrypoints_near_root, vec!["backend/package.json"]);
        assert_eq!(signals.entrypoints_anywhere, vec!["src/cmd/Main.java"]);
    }

    #[test]
    fn monorepo_needs_two_parent_dirs() {
        assert!(!is_monorepo(&["package.json".to_string()]));
        assert!(!is_monorepo(&[]));
        assert!(is_monorepo(&[
            "package.json".to_string(),
            "services/api/go.mod".to_string(),
        ]));
        assert!(!is_monorepo(&[
            "web/package.json".to_string(),
            "web/pyproject.toml".to_string(),
        ]));
    }

    #[test]
    fn monorepo_hint_from_tree() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "apps/web/package.json", "{}");
        touch(dir.path(), "apps/api/package.json", "{}");
        let signals = signals_for(dir.path());
        assert!(signals.monorepo_hint);
        assert_eq!(
            signals.manifest_paths,
            vec!["apps/api/package.json", "apps/web/package.json"]
        );
    }

    #[test]
    fn route_literals_need_leading_slash_and_short_length() {
        let long = format!("/{}", "x".repeat(70));
        let content = format!(
            "app.get('/users', h)\nrouter.post(\"/users/:id\")\nx = \"users\"\ny = \"{long}\"\n"
        );
        let routes = extract_route_literals(&content, 60);
        assert_eq!(routes, vec!["/users", "/users/:id"]);
    }

    #[test]
    fn routes_sample_dedupes_and_caps() {
        let dir = TempDir::new().unwrap();
        let mut body = String::new();
        for i in 0..30 {
            body.push_str(&format!("@app.get('/r{i}')\n@app.get('/r{i}')\n"));
        }
        touch(dir.path(), "app.py", &body);

        let signals = signals_for(dir.path());
        assert_eq!(signals.routes_sample.len(), 20);
        assert_eq!(signals.routes_sample[0], "/r0");
        assert_eq!(signals.routes_sample[1], "/r1");
    }

    #[test]
    fn routes_only_come_from_entrypoints_or_fallbacks() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "lib/helpers.py", "URL = '/hidden'\n");
        touch(dir.path(), "src/index.js", "fetch('/api/items')\n");

        let signals = signals_for(dir.path());
        assert_eq!(signals.routes_sample, vec!["/api/items"]);
    }

    #[test]
    fn empty_tree_has_empty_signals() {
        let dir = TempDir::new().unwrap();
        let signals = signals_for(dir.path());
        assert!(signals.languages.is_empty());
        assert_eq!(signals.primary_language, None);
        assert!(signals.entrypoints_near_root.is_empty());
        assert!(signals.routes_sample.is_empty());

        let json: serde_json::Value = serde_json::from_str(&signals.to_json_pretty()).unwrap();
        assert_eq!(json["primary_language"], serde_json::Value::Null);
        assert_eq!(json["framework_hints"], serde_json::json!([]));
        assert_eq!(json["capability_evidence"], serde_json::json!({}));
    }
}
