//! Separator-priority text chunker with overlap.
//!
//! Splits document text into [`Segment`]s no larger than `chunk_size`
//! bytes, preferring to break on the highest-priority separator present
//! (paragraph break, line break, sentence end, space) and hard-splitting
//! only as a last resort. Consecutive segments from one document share up
//! to `chunk_overlap` bytes of trailing context so that a query landing
//! near a boundary still recovers its neighborhood.
//!
//! Splitting is lossless: separators stay attached to the piece they
//! terminate, so every byte of the input appears in at least one segment.

use crate::config::ChunkingConfig;
use crate::document::Document;

/// Separator priority, highest first. The empty-string fallback is the
/// hard split implemented by [`hard_split`].
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ".", " "];

/// A bounded slice of one document's text. Derived and disposable; the
/// [`Document`] remains the source of truth.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Row index of the originating document.
    pub row_index: usize,
    pub text: String,
}

/// Split every document, preserving document order and in-document order.
///
/// Documents with empty text (rows where every field was a sentinel)
/// produce no segments: there is nothing to index, and the embeddings
/// API rejects empty-string input.
pub fn split_documents(documents: &[Document], config: &ChunkingConfig) -> Vec<Segment> {
    documents
        .iter()
        .filter(|doc| !doc.text.is_empty())
        .flat_map(|doc| {
            split_text(&doc.text, config.chunk_size, config.chunk_overlap)
                .into_iter()
                .map(|text| Segment {
                    row_index: doc.row_index,
                    text,
                })
        })
        .collect()
}

/// Split one text into overlapping pieces of at most `max_bytes` each.
/// Always returns at least one piece.
pub fn split_text(text: &str, max_bytes: usize, overlap: usize) -> Vec<String> {
    if text.len() <= max_bytes {
        return vec![text.to_string()];
    }
    let pieces = split_pieces(text, 0, max_bytes);
    merge_pieces(pieces, max_bytes, overlap)
}

/// Recursively cut `text` into pieces no larger than `max_bytes`, trying
/// separators in priority order.
fn split_pieces(text: &str, sep_index: usize, max_bytes: usize) -> Vec<String> {
    if text.len() <= max_bytes {
        return vec![text.to_string()];
    }
    let Some(sep) = SEPARATORS.get(sep_index) else {
        return hard_split(text, max_bytes);
    };
    if !text.contains(sep) {
        return split_pieces(text, sep_index + 1, max_bytes);
    }

    let mut out = Vec::new();
    for piece in text.split_inclusive(sep) {
        if piece.len() > max_bytes {
            out.extend(split_pieces(piece, sep_index + 1, max_bytes));
        } else {
            out.push(piece.to_string());
        }
    }
    out
}

/// Greedily pack pieces into chunks, carrying an overlap tail from each
/// emitted chunk into the next.
fn merge_pieces(pieces: Vec<String>, max_bytes: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    // Bytes at the start of `buf` that repeat the previous chunk's tail.
    let mut seed_len = 0usize;

    for piece in pieces {
        if buf.len() + piece.len() > max_bytes && buf.len() > seed_len {
            chunks.push(buf.clone());
            buf = char_tail(&buf, overlap).to_string();
            seed_len = buf.len();
        }
        if buf.len() + piece.len() > max_bytes {
            // Only the overlap seed is left and the piece still does not
            // fit; shrink the seed rather than exceed the bound.
            let room = max_bytes.saturating_sub(piece.len());
            buf = char_tail(&buf, room).to_string();
            seed_len = buf.len();
        }
        buf.push_str(&piece);
    }

    if buf.len() > seed_len || chunks.is_empty() {
        chunks.push(buf);
    }

    chunks
}

/// Fallback split at byte windows, snapped to char boundaries.
fn hard_split(text: &str, max_bytes: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = text;
    while rest.len() > max_bytes {
        let mut cut = max_bytes;
        while cut > 0 && !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // max_bytes is smaller than one multi-byte char; take it whole.
            cut = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
        }
        out.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out
}

/// Last `n` bytes of `s`, snapped forward to a char boundary.
fn char_tail(s: &str, n: usize) -> &str {
    if s.len() <= n {
        return s;
    }
    let mut start = s.len() - n;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reconstruct the source by stripping at most `overlap` shared bytes
    /// from the head of each chunk. Panics if any byte was lost.
    fn assert_lossless(text: &str, chunks: &[String], overlap: usize) {
        let mut acc = chunks[0].clone();
        assert!(text.starts_with(&acc), "first chunk is not a source prefix");
        for chunk in &chunks[1..] {
            let k = (0..=overlap.min(chunk.len()).min(acc.len()))
                .rev()
                .filter(|&k| chunk.is_char_boundary(k))
                .find(|&k| {
                    acc.ends_with(&chunk[..k])
                        && text.starts_with(&format!("{}{}", acc, &chunk[k..]))
                })
                .unwrap_or_else(|| panic!("chunk {:?} does not continue the source", chunk));
            acc.push_str(&chunk[k..]);
        }
        assert_eq!(acc, text, "reconstruction differs from source");
    }

    #[test]
    fn short_text_is_one_segment() {
        let chunks = split_text("tiny", 100, 10);
        assert_eq!(chunks, vec!["tiny".to_string()]);
    }

    #[test]
    fn empty_text_is_one_empty_segment() {
        let chunks = split_text("", 100, 10);
        assert_eq!(chunks, vec![String::new()]);
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let text = "first paragraph body\n\nsecond paragraph body";
        let chunks = split_text(text, 30, 0);
        assert!(chunks.len() >= 2);
        assert!(chunks[0].starts_with("first paragraph"));
        assert_lossless(text, &chunks, 0);
    }

    #[test]
    fn falls_through_to_lower_separators() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chunks = split_text(text, 16, 0);
        for c in &chunks {
            assert!(c.len() <= 16, "{:?} too long", c);
        }
        assert_lossless(text, &chunks, 0);
    }

    #[test]
    fn respects_max_size_with_overlap() {
        let text = "frame.number: 1\nip.src: 10.0.0.1\nip.dst: 10.0.0.2\n\
                    tcp.srcport: 443\ndns.qry.name: example.com";
        let chunks = split_text(text, 40, 10);
        for c in &chunks {
            assert!(c.len() <= 40, "{:?} exceeds max", c);
        }
        assert_lossless(text, &chunks, 10);
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let text = "aaaa bbbb cccc dddd eeee ffff gggg hhhh";
        let chunks = split_text(text, 20, 8);
        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            let prev = &pair[0];
            let next = &pair[1];
            // The next chunk starts with some suffix of the previous one.
            let shared = (1..=8.min(prev.len()).min(next.len()))
                .rev()
                .find(|&n| prev.ends_with(&next[..n]));
            assert!(shared.is_some(), "no overlap between {:?} and {:?}", prev, next);
        }
        assert_lossless(text, &chunks, 8);
    }

    #[test]
    fn hard_split_handles_unbroken_text() {
        let text = "x".repeat(95);
        let chunks = split_text(&text, 10, 0);
        for c in &chunks {
            assert!(c.len() <= 10);
        }
        assert_lossless(&text, &chunks, 0);
    }

    #[test]
    fn hard_split_is_char_safe() {
        let text = "éééééééééé"; // 2 bytes per char
        let chunks = split_text(text, 3, 0);
        for c in &chunks {
            assert!(c.chars().count() >= 1);
        }
        assert_lossless(text, &chunks, 0);
    }

    #[test]
    fn empty_documents_produce_no_segments() {
        let docs = vec![
            Document {
                row_index: 0,
                text: String::new(),
            },
            Document {
                row_index: 1,
                text: "dns.qry.name: example.com".to_string(),
            },
        ];
        let config = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 10,
        };
        let segments = split_documents(&docs, &config);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].row_index, 1);
        assert!(segments.iter().all(|s| !s.text.is_empty()));
    }

    #[test]
    fn segments_keep_row_index_and_order() {
        let docs = vec![
            Document {
                row_index: 0,
                text: "short".to_string(),
            },
            Document {
                row_index: 1,
                text: "line one\nline two\nline three\nline four".to_string(),
            },
        ];
        let config = ChunkingConfig {
            chunk_size: 20,
            chunk_overlap: 4,
        };
        let segments = split_documents(&docs, &config);
        assert_eq!(segments[0].row_index, 0);
        assert!(segments.iter().skip(1).all(|s| s.row_index == 1));
        let indices: Vec<usize> = segments.iter().map(|s| s.row_index).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted, "segment order must follow document order");
    }
}
