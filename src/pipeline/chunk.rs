//! Recursive character text splitting.
//!
//! The text is split on the first separator of the cascade that occurs in
//! it, each separator staying attached to the start of the piece that
//! follows it. Pieces shorter than the chunk size are greedily merged into
//! chunks; when a chunk is emitted, pieces are dropped from its front until
//! at most `chunk_overlap` characters remain as context for the next one.
//! Oversized pieces are split again with the remaining separators.
//!
//! Lengths are counted in `char`s.

use crate::config::ChunkConfig;
use std::collections::VecDeque;

/// Splits text according to a [`ChunkConfig`].
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    config: ChunkConfig,
}

impl RecursiveCharacterSplitter {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split `text` into chunks. Deterministic; whitespace-only input yields nothing.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.config.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, s) in separators.iter().enumerate() {
            if s.is_empty() {
                separator = "";
                break;
            }
            if text.contains(s.as_str()) {
                separator = s;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut good: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.config.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                chunks.extend(self.merge_splits(&good));
                good.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }
        if !good.is_empty() {
            chunks.extend(self.merge_splits(&good));
        }
        chunks
    }

    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut docs = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in splits {
            let len = char_len(piece);
            if total + len > size && !current.is_empty() {
                if let Some(doc) = join_trimmed(&current) {
                    docs.push(doc);
                }
                while total > overlap || (total + len > size && total > 0) {
                    match current.pop_front() {
                        Some((_, front_len)) => total -= front_len,
                        None => break,
                    }
                }
            }
            current.push_back((piece, len));
            total += len;
        }
        if let Some(doc) = join_trimmed(&current) {
            docs.push(doc);
        }
        docs
    }
}

/// `a|b|c` split on `|` gives `a`, `|b`, `|c`; empty pieces are dropped.
/// The empty separator splits into single characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn join_trimmed(parts: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = parts.iter().map(|(s, _)| *s).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(size: usize, overlap: usize) -> RecursiveCharacterSplitter {
        RecursiveCharacterSplitter::new(ChunkConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            ..ChunkConfig::default()
        })
    }

    #[test]
    fn separator_stays_with_following_piece() {
        assert_eq!(split_keeping_separator("a|b|c", "|"), vec!["a", "|b", "|c"]);
        assert_eq!(split_keeping_separator("|a||b", "|"), vec!["|a", "|", "|b"]);
        assert_eq!(split_keeping_separator("héllo", ""), vec!["h", "é", "l", "l", "o"]);
    }

    #[test]
    fn short_text_is_one_chunk() {
        let s = splitter(1000, 100);
        let text = "# Title\n\nA short paragraph.";
        assert_eq!(s.split_text(text), vec![text.to_string()]);
    }

    #[test]
    fn merges_with_overlap() {
        assert_eq!(
            splitter(6, 3).split_text("ab cd ef gh"),
            vec!["ab cd", "cd ef", "ef gh"]
        );
    }

    #[test]
    fn no_overlap_when_pieces_exceed_it() {
        assert_eq!(
            splitter(10, 3).split_text("aaaa bbbb cccc dddd"),
            vec!["aaaa bbbb", "cccc dddd"]
        );
    }

    #[test]
    fn falls_back_to_characters() {
        assert_eq!(
            splitter(4, 1).split_text("abcdefghij"),
            vec!["abcd", "defg", "ghij"]
        );
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(splitter(1000, 100).split_text("  \n\n  ").is_empty());
        assert!(splitter(1000, 100).split_text("").is_empty());
    }

    #[test]
    fn long_markdown_respects_size_and_is_deterministic() {
        let paragraph = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(12);
        let text = vec![paragraph.trim(); 6].join("\n\n");
        let s = splitter(1000, 100);

        let first = s.split_text(&text);
        assert!(first.len() > 1);
        assert!(first.iter().all(|c| c.chars().count() <= 1000));
        assert_eq!(first, s.split_text(&text));
    }

    #[test]
    fn oversized_paragraph_is_split_on_finer_separators() {
        let sentence = "Word ".repeat(60);
        let text = format!("{}\n\nshort tail", sentence.repeat(5));
        let chunks = splitter(200, 20).split_text(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 200));
        assert_eq!(chunks.last().map(String::as_str), Some("short tail"));
    }
}
