//! Page-aware, hyphenation-correcting document splitter
//!
//! Turns an ordered sequence of extracted pages into header-bounded,
//! size-bounded chunks. Page provenance survives the split: each page's
//! metadata travels through the joined text as a sentinel marker line, and
//! every output chunk carries the metadata of the nearest preceding marker.

mod chunker;
mod headers;
mod hyphen;
mod marker;

pub use headers::Segment;
pub use marker::format_marker;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SplitterConfig;

/// JSON-shaped metadata map attached to pages and chunks
pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("no page marker found after joining; input document was empty")]
    EmptyInput,
}

/// One page of extracted source text
///
/// Produced by an upstream extraction step and immutable from its point of
/// view; the splitter works on its own copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page identity, used to attribute embedding records to pages
    pub id: Uuid,

    /// 1-based page number
    pub page_number: u32,

    /// Extracted text content
    pub content: String,

    /// Page metadata; always carries the page number under "page"
    pub metadata: Metadata,

    /// First word of the page as reported by the extraction step, when
    /// available. Guards the cross-page hyphen merge against extraction
    /// noise: a mismatching lead token cancels the merge.
    pub lead_word: Option<String>,
}

impl Page {
    pub fn new(page_number: u32, content: impl Into<String>) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("page".to_string(), serde_json::json!(page_number));
        Self {
            id: Uuid::new_v4(),
            page_number,
            content: content.into(),
            metadata,
            lead_word: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self.metadata
            .entry("page".to_string())
            .or_insert_with(|| serde_json::json!(self.page_number));
        self
    }

    pub fn with_lead_word(mut self, word: impl Into<String>) -> Self {
        self.lead_word = Some(word.into());
        self
    }
}

/// Markdown header levels, identified by the leading `#` run length
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeaderLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeaderLevel {
    pub fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            4 => Some(Self::H4),
            5 => Some(Self::H5),
            6 => Some(Self::H6),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::H1 => "H1",
            Self::H2 => "H2",
            Self::H3 => "H3",
            Self::H4 => "H4",
            Self::H5 => "H5",
            Self::H6 => "H6",
        }
    }
}

/// A retrieval-sized passage with header and page provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Sequential id, monotonic across one `split` call, starting at 0
    pub chunk_id: u64,

    /// Chunk text, non-empty after trimming
    pub text: String,

    /// Header path accumulated top-down, shallowest level first
    pub header_path: BTreeMap<HeaderLevel, String>,

    /// Metadata of the nearest preceding page marker
    pub metadata: Metadata,
}

impl Chunk {
    /// Source page number recorded in the provenance metadata
    pub fn page_number(&self) -> Option<u32> {
        self.metadata
            .get("page")
            .and_then(|v| v.as_u64())
            .map(|n| n as u32)
    }
}

/// Splits page sequences into provenance-carrying chunks
#[derive(Debug, Clone)]
pub struct DocumentSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn from_config(config: &SplitterConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split pages into chunks
    ///
    /// Fails with [`SplitError::EmptyInput`] when no page marker exists after
    /// joining, i.e. the input held no pages at all.
    pub fn split(&self, pages: Vec<Page>) -> Result<Vec<Chunk>, SplitError> {
        let pages = Self::pre_merge(pages);
        let joined = self.join_with_markers(&pages);

        let mut first_marker = None;
        for line in joined.lines() {
            if let Some(meta) = marker::parse_marker_line(line) {
                first_marker = Some(meta);
                break;
            }
        }
        let first_marker = first_marker.ok_or(SplitError::EmptyInput)?;

        let mut chunks = Vec::new();
        let mut chunk_id = 0u64;
        let mut last_marker = first_marker;

        for segment in headers::split_by_headers(&joined) {
            let (cleaned, markers) = marker::extract_markers(&segment.text);

            for sub in chunker::split_with_overlap(&cleaned, self.chunk_size, self.chunk_overlap) {
                let metadata = markers
                    .iter()
                    .rev()
                    .find(|(offset, _)| *offset <= sub.start)
                    .map(|(_, meta)| meta.clone())
                    .unwrap_or_else(|| last_marker.clone());

                let text = sub.text.trim();
                if text.is_empty() {
                    debug!(chunk_id, "Skipping empty chunk");
                    continue;
                }

                chunks.push(Chunk {
                    chunk_id,
                    text: text.to_string(),
                    header_path: segment.header_path.clone(),
                    metadata,
                });
                chunk_id += 1;
            }

            if let Some((_, meta)) = markers.last() {
                last_marker = meta.clone();
            }
        }

        Ok(chunks)
    }

    /// Pre-merge pass: horizontal-rule normalization and cross-page hyphen
    /// repair
    fn pre_merge(mut pages: Vec<Page>) -> Vec<Page> {
        for page in &mut pages {
            page.content = hyphen::normalize_horizontal_rules(&page.content);
        }

        for i in 0..pages.len().saturating_sub(1) {
            if !hyphen::ends_with_hyphen(&pages[i].content) {
                continue;
            }

            let (head, tail) = pages.split_at_mut(i + 1);
            let page = &mut head[i];
            let next = &mut tail[0];

            let token = match hyphen::first_word(&next.content) {
                Some(token) => token,
                None => continue,
            };

            if let Some(reported) = &next.lead_word {
                if !hyphen::lead_token_matches(token, reported) {
                    warn!(
                        page = page.page_number,
                        token,
                        reported = %reported,
                        "Lead word mismatch at hyphenated page boundary; leaving fragments unmerged"
                    );
                    continue;
                }
            }

            page.content = hyphen::merge_hyphenated(&page.content, &next.content);
            next.content = hyphen::remove_first_word(&next.content);
        }

        pages
    }

    /// Provenance join: marker line before each page's cleaned text
    fn join_with_markers(&self, pages: &[Page]) -> String {
        let mut joined_lines = Vec::new();

        for page in pages {
            let mut content = page.content.clone();
            if marker::contains_marker(&content) {
                warn!(
                    page = page.page_number,
                    "Existing page marker found in document content. Document may be malformed."
                );
                content = marker::strip_markers(&content);
            }

            joined_lines.push(marker::format_marker(&page.metadata));

            let cleaned = hyphen::repair_wrapped_hyphens(&content);
            let cleaned = hyphen::trim_lines(&cleaned);
            if !cleaned.is_empty() {
                joined_lines.push(cleaned);
            }
        }

        joined_lines.join("\n")
    }
}
