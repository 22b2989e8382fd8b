//! ATX header segmentation with accumulated header paths

use super::HeaderLevel;
use std::collections::BTreeMap;

/// A run of text bounded by markdown headers
///
/// The header line itself stays in the segment text; the path records every
/// header level active above the segment, shallowest first.
#[derive(Debug, Clone)]
pub struct Segment {
    pub text: String,
    pub header_path: BTreeMap<HeaderLevel, String>,
}

/// Parse a line as an ATX header (`#` through `######` followed by a space)
fn parse_header(line: &str) -> Option<(HeaderLevel, &str)> {
    let trimmed = line.trim_start();
    let depth = trimmed.chars().take_while(|c| *c == '#').count();
    let level = HeaderLevel::from_depth(depth)?;
    let rest = &trimmed[depth..];
    if !rest.starts_with(' ') && !rest.is_empty() {
        return None;
    }
    Some((level, rest.trim()))
}

/// Split joined text into header-bounded segments
///
/// Each header line starts a new segment. Entering a header at level N drops
/// every recorded header at level N or deeper before recording the new one,
/// so a segment under `###` still carries the nearest `#` and `##` above it.
/// Text before the first header forms a segment with an empty path.
pub fn split_by_headers(text: &str) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut path: BTreeMap<HeaderLevel, String> = BTreeMap::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_path = path.clone();

    for line in text.lines() {
        if let Some((level, title)) = parse_header(line) {
            if !current.is_empty() {
                segments.push(Segment {
                    text: current.join("\n"),
                    header_path: current_path.clone(),
                });
                current.clear();
            }

            path.retain(|existing, _| *existing < level);
            path.insert(level, title.to_string());
            current_path = path.clone();
        }
        current.push(line);
    }

    if !current.is_empty() {
        segments.push(Segment {
            text: current.join("\n"),
            header_path: current_path,
        });
    }

    segments
}
