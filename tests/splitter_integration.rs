//! End-to-end splitter scenarios over multi-page documents

use quarry::splitter::{Chunk, DocumentSplitter, HeaderLevel, Page};

#[test]
fn test_three_pages_one_header_one_chunk() {
    // one header, one hyphenated word split across pages 1-2, chunk size
    // large enough for a single chunk per header segment
    let pages = vec![
        Page::new(1, "# Energy Policy\nThe committee discussed the infra-"),
        Page::new(2, "structure proposal in detail during the session."),
        Page::new(3, "Further remarks were recorded for the minutes."),
    ];

    let chunks = DocumentSplitter::new(2000, 400).split(pages).unwrap();

    assert_eq!(chunks.len(), 1);
    let chunk = &chunks[0];

    assert_eq!(chunk.page_number(), Some(1));
    assert!(chunk.text.contains("infrastructure"));
    assert!(!chunk.text.contains("infra-"));
    assert!(!chunk.text.contains("QUARRY_PAGE_MARKER"));
    assert_eq!(chunk.header_path[&HeaderLevel::H1], "Energy Policy");
}

#[test]
fn test_long_document_chunk_ids_and_provenance() {
    let mut pages = Vec::new();
    for page_number in 1..=8u32 {
        let body = format!("Content line for page {}. ", page_number).repeat(30);
        pages.push(Page::new(page_number, format!("## Section {}\n{}", page_number, body)));
    }

    let chunks = DocumentSplitter::new(400, 80).split(pages).unwrap();
    assert!(chunks.len() > 8);

    // chunk ids are 0..n-1 in output order
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_id, i as u64);
    }

    // page provenance never moves backwards
    let numbers: Vec<u32> = chunks.iter().filter_map(Chunk::page_number).collect();
    assert_eq!(numbers.len(), chunks.len());
    for pair in numbers.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
}

#[test]
fn test_hyphen_merge_with_emphasis_closer_at_boundary() {
    let pages = vec![
        Page::new(1, "Emphasis on **long hyphen-**"),
        Page::new(2, "ated word continues here."),
    ];

    let chunks = DocumentSplitter::new(2000, 400).split(pages).unwrap();
    let text: String = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n");

    assert!(text.contains("hyphenated**"));
    assert!(!text.contains("hyphen-"));
}

#[test]
fn test_horizontal_rules_never_bound_chunks() {
    let pages = vec![
        Page::new(1, "First part of the paragraph abc-\n---"),
        Page::new(2, "---\ndef continuing the same sentence without a break."),
    ];

    let chunks = DocumentSplitter::new(2000, 400).split(pages).unwrap();
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].text.contains("abcdef"));
    assert!(!chunks[0].text.contains("---"));
}

#[test]
fn test_header_paths_follow_hierarchy_across_pages() {
    let pages = vec![
        Page::new(1, "# Report\nIntro paragraph.\n## Findings\nFirst finding."),
        Page::new(2, "### Detail\nSupporting data.\n## Conclusion\nWrap up."),
    ];

    let chunks = DocumentSplitter::new(2000, 400).split(pages).unwrap();

    let detail = chunks
        .iter()
        .find(|c| c.text.contains("Supporting data"))
        .unwrap();
    assert_eq!(detail.header_path[&HeaderLevel::H1], "Report");
    assert_eq!(detail.header_path[&HeaderLevel::H2], "Findings");
    assert_eq!(detail.header_path[&HeaderLevel::H3], "Detail");
    assert_eq!(detail.page_number(), Some(2));

    let conclusion = chunks
        .iter()
        .find(|c| c.text.contains("Wrap up"))
        .unwrap();
    assert_eq!(conclusion.header_path.len(), 2);
    assert_eq!(conclusion.header_path[&HeaderLevel::H2], "Conclusion");
}

#[test]
fn test_custom_page_metadata_travels_to_chunks() {
    let mut metadata = quarry::splitter::Metadata::new();
    metadata.insert("source".to_string(), serde_json::json!("scan.pdf"));

    let pages = vec![Page::new(1, "page body text").with_metadata(metadata)];
    let chunks = DocumentSplitter::new(2000, 400).split(pages).unwrap();

    assert_eq!(chunks[0].metadata["source"], serde_json::json!("scan.pdf"));
    assert_eq!(chunks[0].page_number(), Some(1));
}

#[test]
fn test_overlap_repeats_context_between_chunks() {
    let body = "Sentences repeat in this document body. ".repeat(40);
    let pages = vec![Page::new(1, body)];

    let chunks = DocumentSplitter::new(300, 60).split(pages).unwrap();
    assert!(chunks.len() > 1);

    for pair in chunks.windows(2) {
        let tail: String = pair[0].text.chars().rev().take(20).collect::<String>()
            .chars().rev().collect();
        let tail = tail.trim();
        assert!(
            pair[1].text.contains(tail),
            "overlap context {:?} missing from following chunk",
            tail
        );
    }
}
