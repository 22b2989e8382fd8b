//! Sentinel page markers carrying per-page metadata through the join

use super::Metadata;
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

const MARKER_PREFIX: &str = "<!-- QUARRY_PAGE_MARKER: ";
const MARKER_SUFFIX: &str = " -->";

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<!-- QUARRY_PAGE_MARKER: (.*?) -->").expect("valid marker regex"))
}

/// Format a marker line for a page's metadata
pub fn format_marker(metadata: &Metadata) -> String {
    let payload = serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string());
    format!("{}{}{}", MARKER_PREFIX, payload, MARKER_SUFFIX)
}

/// Parse a single line as a marker, returning its metadata payload
///
/// Returns `None` for non-marker lines and for marker-shaped lines whose
/// payload does not parse; the latter is logged so the chunk falls back to
/// the previous marker instead of failing the split.
pub fn parse_marker_line(line: &str) -> Option<Metadata> {
    let trimmed = line.trim();
    let payload = trimmed
        .strip_prefix(MARKER_PREFIX)?
        .strip_suffix(MARKER_SUFFIX)?;

    match serde_json::from_str::<Metadata>(payload) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!(marker = payload, error = %e, "Failed to parse page marker");
            None
        }
    }
}

/// Whether a line is marker-shaped, regardless of payload validity
pub fn is_marker_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(MARKER_PREFIX) && trimmed.ends_with(MARKER_SUFFIX)
}

/// Whether the text contains a marker-shaped substring anywhere
pub fn contains_marker(text: &str) -> bool {
    marker_regex().is_match(text)
}

/// Remove all marker-shaped substrings from page content
///
/// Defensive: markers embedded in source pages must never be mistaken for
/// real provenance markers.
pub fn strip_markers(text: &str) -> String {
    marker_regex().replace_all(text, "").into_owned()
}

/// Strip markers from a segment, recording where each one stood
///
/// Returns the cleaned segment text (markers removed, newline runs collapsed,
/// every line trimmed) together with `(offset, metadata)` pairs, where
/// `offset` is the byte position in the cleaned text of the first content
/// that follows the marker.
pub fn extract_markers(text: &str) -> (String, Vec<(usize, Metadata)>) {
    let mut cleaned = String::with_capacity(text.len());
    let mut markers = Vec::new();

    for line in text.lines() {
        if is_marker_line(line) {
            if let Some(metadata) = parse_marker_line(line) {
                let offset = if cleaned.is_empty() {
                    0
                } else {
                    // next content starts after the pending newline
                    cleaned.len() + 1
                };
                markers.push((offset, metadata));
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if !cleaned.is_empty() {
            cleaned.push('\n');
        }
        cleaned.push_str(trimmed);
    }

    (cleaned, markers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(page: u64) -> Metadata {
        let mut m = Metadata::new();
        m.insert("page".to_string(), json!(page));
        m
    }

    #[test]
    fn test_marker_roundtrip() {
        let line = format_marker(&meta(3));
        let parsed = parse_marker_line(&line).unwrap();
        assert_eq!(parsed.get("page").unwrap().as_u64(), Some(3));
    }

    #[test]
    fn test_non_marker_line() {
        assert!(parse_marker_line("just a normal line").is_none());
    }

    #[test]
    fn test_corrupt_payload_is_skipped() {
        let line = "<!-- QUARRY_PAGE_MARKER: {not json -->";
        assert!(is_marker_line(line));
        assert!(parse_marker_line(line).is_none());
    }

    #[test]
    fn test_strip_markers_from_page_content() {
        let text = format!("before {} after", format_marker(&meta(1)));
        assert!(contains_marker(&text));
        let stripped = strip_markers(&text);
        assert!(!contains_marker(&stripped));
        assert!(stripped.contains("before"));
        assert!(stripped.contains("after"));
    }

    #[test]
    fn test_extract_markers_offsets() {
        let text = format!(
            "{}\nfirst line\n\n\n{}\nsecond line",
            format_marker(&meta(1)),
            format_marker(&meta(2))
        );
        let (cleaned, markers) = extract_markers(&text);
        assert_eq!(cleaned, "first line\nsecond line");
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].0, 0);
        // second marker points at the start of "second line"
        assert_eq!(markers[1].0, cleaned.find("second").unwrap());
    }
}
