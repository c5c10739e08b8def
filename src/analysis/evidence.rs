//! Evidence bundle: the selected files' text under a per-file and a total
//! character budget. Blocks are never split; the first block that would
//! overflow is replaced by a single truncation marker.

use log::debug;
use serde::Serialize;

use super::selector::SelectedFile;
use super::text;
use crate::config::EvidenceConfig;

pub const EVIDENCE_TRUNCATION_MARKER: &str = "\n\n... (content truncated to fit context budget)";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceBundle {
    pub text: String,
    /// Files whose block made it into `text`, in order.
    pub included: Vec<String>,
    /// Files dropped because they could not be read.
    pub unreadable: Vec<String>,
    pub truncated: bool,
}

impl EvidenceBundle {
    pub fn char_len(&self) -> usize {
        text::char_len(&self.text)
    }
}

pub fn file_block(rel_path: &str, snippet: &str) -> String {
    format!("\n\n===== FILE: {rel_path} =====\n{snippet}")
}

pub fn read_evidence(files: &[SelectedFile], config: &EvidenceConfig) -> EvidenceBundle {
    let mut bundle = EvidenceBundle::default();
    let mut total = 0usize;

    for file in files {
        let content = match text::read_lossy(&file.abs_path) {
            Ok(content) => content,
            Err(_) => {
                bundle.unreadable.push(file.rel_path.clone());
                continue;
            }
        };

        let snippet = text::clip_chars(&content, config.per_file_char_cap);
        let block = file_block(&file.rel_path, snippet);
        let block_len = text::char_len(&block);

        if total + block_len > config.total_char_cap {
            bundle.text.push_str(EVIDENCE_TRUNCATION_MARKER);
            bundle.truncated = true;
            break;
        }

        bundle.text.push_str(&block);
        bundle.included.push(file.rel_path.clone());
        total += block_len;
    }

    debug!(
        "evidence files={} unreadable={} chars={} truncated={}",
        bundle.included.len(),
        bundle.unreadable.len(),
        total,
        bundle.truncated
    );
    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::selector::Tier;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn selected(root: &Path, rel: &str) -> SelectedFile {
        SelectedFile {
            rel_path: rel.to_string(),
            abs_path: root.join(rel),
            tier: Tier::Heuristic,
            score: Some(1),
            inbound: 0,
            outbound: 0,
        }
    }

    #[test]
    fn blocks_follow_selection_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.py"), "B").unwrap();
        fs::write(dir.path().join("a.py"), "A").unwrap();
        let files = vec![selected(dir.path(), "b.py"), selected(dir.path(), "a.py")];

        let bundle = read_evidence(&files, &EvidenceConfig::default());
        assert_eq!(
            bundle.text,
            "\n\n===== FILE: b.py =====\nB\n\n===== FILE: a.py =====\nA"
        );
        assert_eq!(bundle.included, vec!["b.py", "a.py"]);
        assert!(!bundle.truncated);
    }

    #[test]
    fn per_file_cap_clips_content() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("big.txt"), "é".repeat(50)).unwrap();
        let config = EvidenceConfig {
            per_file_char_cap: 10,
            total_char_cap: 1_000,
        };

        let bundle = read_evidence(&[selected(dir.path(), "big.txt")], &config);
        let content = bundle.text.split("=====\n").nth(1).unwrap();
        assert_eq!(content, "é".repeat(10));
    }

    #[test]
    fn overflow_appends_single_marker_without_splitting() {
        let dir = TempDir::new().unwrap();
        for name in ["one.txt", "two.txt", "three.txt"] {
            fs::write(dir.path().join(name), "x".repeat(40)).unwrap();
        }
        let files: Vec<SelectedFile> = ["one.txt", "two.txt", "three.txt"]
            .iter()
            .map(|n| selected(dir.path(), n))
            .collect();
        let one_block = text::char_len(&file_block("one.txt", &"x".repeat(40)));
        let config = EvidenceConfig {
            per_file_char_cap: 1_000,
            total_char_cap: one_block * 2 + 5,
        };

        let bundle = read_evidence(&files, &config);
        assert!(bundle.truncated);
        assert_eq!(bundle.included, vec!["one.txt", "two.txt"]);
        assert!(bundle.text.ends_with(EVIDENCE_TRUNCATION_MARKER));
        assert_eq!(bundle.text.matches("content truncated").count(), 1);
        assert!(!bundle.text.contains("three.txt"));
        assert!(
            bundle.char_len() <= config.total_char_cap + text::char_len(EVIDENCE_TRUNCATION_MARKER)
        );
    }

    #[test]
    fn unreadable_files_are_skipped_silently() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ok.txt"), "fine").unwrap();
        let files = vec![selected(dir.path(), "gone.txt"), selected(dir.path(), "ok.txt")];

        let bundle = read_evidence(&files, &EvidenceConfig::default());
        assert_eq!(bundle.included, vec!["ok.txt"]);
        assert_eq!(bundle.unreadable, vec!["gone.txt"]);
        assert!(bundle.text.contains("fine"));
    }

    #[test]
    fn first_block_too_large_yields_only_marker() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("huge.txt"), "y".repeat(500)).unwrap();
        let config = EvidenceConfig {
            per_file_char_cap: 1_000,
            total_char_cap: 100,
        };
        let bundle = read_evidence(&[selected(dir.path(), "huge.txt")], &config);
        assert_eq!(bundle.text, EVIDENCE_TRUNCATION_MARKER);
        assert!(bundle.included.is_empty());
    }

    #[test]
    fn no_selection_yields_empty_bundle() {
        let bundle = read_evidence(&[], &EvidenceConfig::default());
        assert!(bundle.text.is_empty());
        assert!(!bundle.truncated);
    }
}
