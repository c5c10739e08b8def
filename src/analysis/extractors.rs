//! Lexical import extraction, one strategy per language family.
//!
//! Extractors only pull raw tokens out of text; they never check that the
//! import is syntactically valid or actually reachable. `token_stem` turns a
//! token into the lowercase basename the resolver looks up, so a more precise
//! resolver can later replace basename matching without touching callers.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

pub trait ImportExtractor {
    fn name(&self) -> &'static str;

    /// Whether this extractor applies to files with the given lowercase extension.
    fn handles(&self, ext: &str) -> bool;

    /// Raw import tokens found in `content`, deduplicated.
    fn extract(&self, content: &str) -> BTreeSet<String>;

    /// Lowercase basename a token refers to, or `None` if it names nothing.
    fn token_stem(&self, token: &str) -> Option<String> {
        path_stem(token)
    }
}

/// Last `/` segment up to its first `.`, lowercased.
pub fn path_stem(token: &str) -> Option<String> {
    let last = token.trim().trim_end_matches('/').rsplit('/').next()?;
    let stem = last.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_lowercase())
}

lazy_static! {
    static ref PY_IMPORT_RE: Regex = Regex::new(
        r"(?m)^\s*(?:from\s+([A-Za-z0-9_\.]+)\s+import|import\s+([A-Za-z0-9_\.]+))"
    )
    .expect("valid Python import regex");
    static ref ES_IMPORT_FROM_RE: Regex =
        Regex::new(r#"(?m)^\s*import\s+.*?from\s+['"](.+?)['"]\s*;?\s*$"#)
            .expect("valid ES import-from regex");
    static ref ES_IMPORT_BARE_RE: Regex =
        Regex::new(r#"(?m)^\s*import\s+['"](.+?)['"]"#).expect("valid ES bare import regex");
    static ref JS_REQUIRE_RE: Regex =
        Regex::new(r#"require\(\s*['"](.+?)['"]\s*\)"#).expect("valid require regex");
    static ref GO_IMPORT_SINGLE_RE: Regex =
        Regex::new(r#"(?m)^\s*import\s+(?:[A-Za-z_.][A-Za-z0-9_]*\s+)?"([^"]+)""#)
            .expect("valid Go single import regex");
    static ref GO_IMPORT_BLOCK_RE: Regex =
        Regex::new(r"(?ms)^\s*import\s*\((.*?)\)").expect("valid Go import block regex");
    static ref QUOTED_RE: Regex = Regex::new(r#""([^"]+)""#).expect("valid quoted literal regex");
}

/// `from X import Y` and `import X`.
pub struct PythonImports;

impl ImportExtractor for PythonImports {
    fn name(&self) -> &'static str {
        "python"
    }

    fn handles(&self, ext: &str) -> bool {
        ext == "py"
    }

    fn extract(&self, content: &str) -> BTreeSet<String> {
        PY_IMPORT_RE
            .captures_iter(content)
            .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
            .map(|m| m.as_str().trim().to_string())
            .filter(|module| !module.is_empty())
            .collect()
    }

    fn token_stem(&self, token: &str) -> Option<String> {
        let last = token.trim().rsplit('.').next()?;
        if last.is_empty() {
            return None;
        }
        Some(last.to_lowercase())
    }
}

/// ES modules (`import … from "p"`, `import "p"`) and CommonJS `require("p")`.
pub struct EsModuleImports;

impl ImportExtractor for EsModuleImports {
    fn name(&self) -> &'static str {
        "es-module"
    }

    fn handles(&self, ext: &str) -> bool {
        matches!(ext, "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs")
    }

    fn extract(&self, content: &str) -> BTreeSet<String> {
        let mut tokens = BTreeSet::new();
        for re in [&*ES_IMPORT_FROM_RE, &*ES_IMPORT_BARE_RE, &*JS_REQUIRE_RE] {
            for cap in re.captures_iter(content) {
                let path = cap[1].trim();
                if !path.is_empty() {
                    tokens.insert(path.to_string());
                }
            }
        }
        tokens
    }
}

/// Go `import "p"` and every quoted path inside `import ( … )`.
pub struct GoImports;

impl ImportExtractor for GoImports {
    fn name(&self) -> &'static str {
        "go"
    }

    fn handles(&self, ext: &str) -> bool {
        ext == "go"
    }

    fn extract(&self, content: &str) -> BTreeSet<String> {
        let mut tokens: BTreeSet<String> = GO_IMPORT_SINGLE_RE
            .captures_iter(content)
            .map(|cap| cap[1].trim().to_string())
            .collect();
        for block in GO_IMPORT_BLOCK_RE.captures_iter(content) {
            for cap in QUOTED_RE.captures_iter(&block[1]) {
                tokens.insert(cap[1].trim().to_string());
            }
        }
        tokens.retain(|t| !t.is_empty());
        tokens
    }
}

/// The built-in extractor set, tried in order; the first that handles an extension wins.
pub fn default_extractors() -> Vec<Box<dyn ImportExtractor>> {
    vec![
        Box::new(PythonImports),
        Box::new(EsModuleImports),
        Box::new(GoImports),
    ]
}

pub fn extractor_for<'a>(
    extractors: &'a [Box<dyn ImportExtractor>],
    ext: &str,
) -> Option<&'a dyn ImportExtractor> {
    extractors
        .iter()
        .find(|e| e.handles(ext))
        .map(|e| e.as_ref())
}
