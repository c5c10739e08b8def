use std::collections::{BTreeMap, HashMap};

use super::scanner::FileEntry;

/// Language counts derived from the extension table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageProfile {
    pub counts: BTreeMap<String, usize>,
    /// Count descending; equal counts keep first-seen order.
    pub ranked: Vec<String>,
    pub primary: Option<String>,
}

impl LanguageProfile {
    pub fn from_files(files: &[FileEntry]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut first_seen: Vec<&str> = Vec::new();

        for lang in files.iter().filter_map(|f| f.language.as_deref()) {
            let count = counts.entry(lang).or_insert(0);
            if *count == 0 {
                first_seen.push(lang);
            }
            *count += 1;
        }

        let mut ranked = first_seen.clone();
        // stable: ties stay in first-seen order
        ranked.sort_by(|a, b| counts[b].cmp(&counts[a]));

        let ranked: Vec<String> = ranked.into_iter().map(str::to_string).collect();
        Self {
            counts: counts
                .into_iter()
                .map(|(lang, n)| (lang.to_string(), n))
                .collect(),
            primary: ranked.first().cloned(),
            ranked,
        }
    }
}
