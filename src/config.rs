use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Every fixed table and bound the analysis uses. Each section is optional in
/// the TOML file; missing keys fall back to the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub signals: SignalsConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub select: SelectConfig,
    #[serde(default)]
    pub evidence: EvidenceConfig,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names pruned anywhere in the tree.
    pub ignore_dirs: Vec<String>,
    /// Tree listing cap before the truncation marker.
    pub tree_max_entries: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_dirs: strings(&[
                ".git",
                ".venv",
                "venv",
                "__pycache__",
                "node_modules",
                "dist",
                "build",
                "target",
                "vendor",
                ".next",
                ".turbo",
                ".parcel-cache",
                ".cache",
                ".pytest_cache",
                ".mypy_cache",
            ]),
            tree_max_entries: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    /// Manifest/readme names pinned when found at depth <= 1.
    pub priority_files: Vec<String>,
    /// Candidates for the primary README, in preference order.
    pub readme_names: Vec<String>,
    /// Lowercase entry filenames recognised at any depth.
    pub entry_filenames: Vec<String>,
    /// Package/build manifests counted for the monorepo hint.
    pub monorepo_manifests: Vec<String>,
    pub manifest_paths_cap: usize,
    /// Extensions of entrypoints worth scanning for route literals.
    pub route_scan_extensions: Vec<String>,
    /// Root-relative files scanned for routes when present.
    pub route_fallback_files: Vec<String>,
    pub route_scan_max_files: usize,
    pub route_max_len: usize,
    pub routes_cap: usize,
    /// Lowercase extension (no dot) -> language name.
    pub languages: BTreeMap<String, String>,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        let languages = [
            ("py", "Python"),
            ("js", "JavaScript"),
            ("jsx", "JavaScript"),
            ("ts", "TypeScript"),
            ("tsx", "TypeScript"),
            ("go", "Go"),
            ("java", "Java"),
            ("kt", "Kotlin"),
            ("rb", "Ruby"),
            ("php", "PHP"),
            ("rs", "Rust"),
            ("c", "C"),
            ("cc", "C++"),
            ("cpp", "C++"),
            ("hpp", "C++"),
            ("h", "C/C++"),
            ("cs", "C#"),
        ]
        .iter()
        .map(|(ext, lang)| (ext.to_string(), lang.to_string()))
        .collect();

        Self {
            priority_files: strings(&[
                // docs
                "README.md",
                "README.rst",
                "README.txt",
                // python
                "pyproject.toml",
                "requirements.txt",
                "Pipfile",
                "poetry.lock",
                "setup.py",
                "manage.py",
                "environment.yml",
                // node
                "package.json",
                "pnpm-lock.yaml",
                "yarn.lock",
                "package-lock.json",
                // go
                "go.mod",
                "go.sum",
                // jvm
                "pom.xml",
                "build.gradle",
                "build.gradle.kts",
                // rust
                "Cargo.toml",
                // infra
                "Dockerfile",
                "docker-compose.yml",
                "compose.yml",
                "Makefile",
                "terraform.tf",
                "main.tf",
                "serverless.yml",
                "template.yaml",
            ]),
            readme_names: strings(&["README.md", "README.rst", "README.txt"]),
            entry_filenames: strings(&[
                "main.py",
                "app.py",
                "server.py",
                "wsgi.py",
                "asgi.py",
                "manage.py",
                "index.js",
                "index.ts",
                "app.js",
                "app.ts",
                "server.js",
                "server.ts",
                "main.go",
                "main.java",
                "main.rs",
            ]),
            monorepo_manifests: strings(&[
                "package.json",
                "pyproject.toml",
                "go.mod",
                "pom.xml",
                "build.gradle",
                "build.gradle.kts",
                "Cargo.toml",
            ]),
            manifest_paths_cap: 30,
            route_scan_extensions: strings(&["py", "js", "ts"]),
            route_fallback_files: strings(&[
                "app.py",
                "main.py",
                "server.py",
                "index.js",
                "src/index.js",
            ]),
            route_scan_max_files: 6,
            route_max_len: 60,
            routes_cap: 20,
            languages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Extensions eligible for import extraction.
    pub source_extensions: Vec<String>,
    /// Largest-first cap on files scanned for imports.
    pub max_files_to_scan: usize,
    /// Characters of each file fed to the extractors.
    pub scan_max_chars: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            source_extensions: strings(&["py", "js", "ts", "tsx", "jsx", "mjs", "cjs", "go"]),
            max_files_to_scan: 250,
            scan_max_chars: 80_000,
        }
    }
}

/// Additive/subtractive weights of the heuristic tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub priority_file: i64,
    pub code_dir: i64,
    pub deprioritized_dir: i64,
    pub entry_filename: i64,
    pub handler_suffix: i64,
    pub routing_path: i64,
    pub config_path: i64,
    pub wiring: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            priority_file: 120,
            code_dir: 40,
            deprioritized_dir: -35,
            entry_filename: 90,
            handler_suffix: 45,
            routing_path: 20,
            config_path: 15,
            wiring: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectConfig {
    pub max_files: usize,
    pub centrality_top_n: usize,
    pub code_dir_hints: Vec<String>,
    pub deprioritized_dirs: Vec<String>,
    pub handler_suffixes: Vec<String>,
    pub routing_substrings: Vec<String>,
    pub config_substrings: Vec<String>,
    /// Files above this size never enter the heuristic tier.
    pub hard_size_ceiling: u64,
    /// One point is subtracted per this many bytes.
    pub size_penalty_divisor: u64,
    /// Outbound reference count that marks a wiring file.
    pub wiring_outbound_threshold: usize,
    pub weights: ScoreWeights,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            max_files: 40,
            centrality_top_n: 80,
            code_dir_hints: strings(&[
                "src", "app", "apps", "api", "server", "backend", "frontend", "cmd", "pkg",
                "internal", "lib",
            ]),
            deprioritized_dirs: strings(&[
                "docs",
                "doc",
                "documentation",
                "site",
                "website",
                "examples",
                "example",
                "demo",
                "demos",
                "public",
            ]),
            handler_suffixes: strings(&[
                "routes.py",
                "router.py",
                "handlers.go",
                "controller.ts",
                "controller.js",
                "urls.py",
            ]),
            routing_substrings: strings(&[
                "route",
                "router",
                "controller",
                "handler",
                "endpoint",
                "service",
            ]),
            config_substrings: strings(&["config", "settings", "infra", "deploy", ".github"]),
            hard_size_ceiling: 350_000,
            size_penalty_divisor: 12_000,
            wiring_outbound_threshold: 8,
            weights: ScoreWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    pub per_file_char_cap: usize,
    pub total_char_cap: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            per_file_char_cap: 28_000,
            total_char_cap: 180_000,
        }
    }
}

impl Config {
    /// Load the user config, or defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = get_config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    /// Write the defaults to `explicit` or the user config path. Never overwrites.
    pub fn create_default(explicit: Option<&Path>) -> Result<PathBuf> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => get_config_path()?,
        };
        if path.exists() {
            bail!("Config already exists: {}", path.display());
        }
        Config::default().save(&path)?;
        Ok(path)
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(config_dir.join("repolens").join("config.toml"))
}

pub fn show_config(explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => get_config_path()?,
    };
    println!("Config: {}", path.display());
    println!();

    if path.exists() {
        let config = Config::load_from(&path)?;
        println!("{}", toml::to_string_pretty(&config)?);
    } else {
        println!("(default config, file not created)");
        println!();
        let config = Config::default();
        println!("{}", toml::to_string_pretty(&config)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_thresholds_are_independent_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.select.hard_size_ceiling, 350_000);
        assert_eq!(cfg.select.size_penalty_divisor, 12_000);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[select]
max_files = 5

[select.weights]
wiring = 100
"#,
        )
        .unwrap();
        assert_eq!(cfg.select.max_files, 5);
        assert_eq!(cfg.select.weights.wiring, 100);
        assert_eq!(cfg.select.weights.priority_file, 120);
        assert_eq!(cfg.select.centrality_top_n, 80);
        assert_eq!(cfg.evidence.total_char_cap, 180_000);
        assert!(cfg.scan.ignore_dirs.iter().any(|d| d == "node_modules"));
    }

    #[test]
    fn default_config_roundtrips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.signals.languages.get("py").map(String::as_str), Some("Python"));
        assert_eq!(back.graph.max_files_to_scan, 250);
    }

    #[test]
    fn load_from_reports_bad_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[select]\nmax_files = \"many\"\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid config"));
    }

    #[test]
    fn create_default_writes_explicit_path_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let written = Config::create_default(Some(&path)).unwrap();
        assert_eq!(written, path);
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.select.max_files, 40);

        std::fs::write(&path, "[select]\nmax_files = 3\n").unwrap();
        let err = Config::create_default(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(Config::load_from(&path).unwrap().select.max_files, 3);
    }
}
