use super::evidence::EvidenceBundle;
use super::signals::SignalsRecord;

/// The single document a summarizer is grounded on.
pub fn render_grounding(signals: &SignalsRecord, tree: &str, evidence: &EvidenceBundle) -> String {
    format!(
        "REPO SIGNALS (ground truth hints):\n{}\n\nFILE TREE:\n{}\n\nIMPORTANT FILE CONTENTS (snippets):\n{}\n",
        signals.to_json_pretty(),
        tree,
        evidence.text
    )
}
