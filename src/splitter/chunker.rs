//! Size-bounded sub-splitting with overlap
//!
//! Splits a cleaned segment into chunks of at most `chunk_size` characters,
//! repeating `chunk_overlap` characters of trailing context between
//! consecutive chunks. Break points prefer paragraph, then sentence, then
//! word boundaries, falling back to a hard character cut.

/// A sub-chunk with its byte offset into the segment it was cut from
#[derive(Debug, Clone)]
pub struct SubChunk {
    pub start: usize,
    pub text: String,
}

/// Break separators in priority order; the separator stays with the chunk
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

pub fn split_with_overlap(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<SubChunk> {
    if text.is_empty() {
        return Vec::new();
    }
    let chunk_size = chunk_size.max(1);

    // char-start byte offsets, with the total length appended
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let total_chars = bounds.len();
    bounds.push(text.len());

    if total_chars <= chunk_size {
        return vec![SubChunk {
            start: 0,
            text: text.to_string(),
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize; // char index

    loop {
        let end = (start + chunk_size).min(total_chars);
        let window = &text[bounds[start]..bounds[end]];

        if end == total_chars {
            chunks.push(SubChunk {
                start: bounds[start],
                text: window.to_string(),
            });
            break;
        }

        let break_byte = find_break(window).unwrap_or(window.len());
        let break_chars = window[..break_byte].chars().count();

        chunks.push(SubChunk {
            start: bounds[start],
            text: window[..break_byte].to_string(),
        });

        let break_char = start + break_chars;
        let next = break_char.saturating_sub(chunk_overlap).max(start + 1);
        if next >= total_chars {
            break;
        }
        start = next;
    }

    chunks
}

/// Best break point (byte offset) inside the window, if any separator exists
fn find_break(window: &str) -> Option<usize> {
    for sep in SEPARATORS {
        if let Some(pos) = window.rfind(sep) {
            if pos > 0 {
                return Some(pos + sep.len());
            }
        }
    }
    None
}
