//! Lossy text helpers shared by route sampling, import scanning and evidence reading.

use std::fs;
use std::io;
use std::path::Path;

/// Read a file as text, dropping byte sequences that are not valid UTF-8.
pub fn read_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(decode_lossy(&bytes))
}

pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// First `max_chars` characters of `text`.
pub fn clip_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bytes_are_dropped() {
        let bytes = b"ok\xff\xfe then more";
        assert_eq!(decode_lossy(bytes), "ok then more");
    }

    #[test]
    fn clip_counts_characters_not_bytes() {
        assert_eq!(clip_chars("héllo", 2), "hé");
        assert_eq!(clip_chars("abc", 10), "abc");
        assert_eq!(clip_chars("abc", 0), "");
        assert_eq!(char_len("héllo"), 5);
    }
}
