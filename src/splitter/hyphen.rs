//! Hyphenation repair across page and line-wrap boundaries

use regex::Regex;
use std::sync::OnceLock;

/// Hyphen characters that end a wrapped word: ASCII hyphen-minus plus the
/// common Unicode variants (hyphen, non-breaking hyphen, soft hyphen).
const HYPHENS: &[char] = &['-', '\u{2010}', '\u{2011}', '\u{00AD}'];

/// Markdown emphasis closers that may sit between a wrapped word and the
/// page boundary.
const EMPHASIS_CLOSERS: &[&str] = &["**", "__", "~~"];

fn wrapped_hyphen_regexes() -> &'static [Regex; 4] {
    static RES: OnceLock<[Regex; 4]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"(\w+)-\s*\*\*\s*\n\s*(\w+)").expect("valid regex"),
            Regex::new(r"(\w+)-\s*~~\s*\n\s*(\w+)").expect("valid regex"),
            Regex::new(r"(\w+)-\s*__\s*\n\s*(\w+)").expect("valid regex"),
            Regex::new(r"(\w+)-\s*\n\s*(\w+)").expect("valid regex"),
        ]
    })
}

fn space_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" +").expect("valid regex"))
}

/// Replace horizontal-rule lines (`---`, `***`, `___`) with nothing
///
/// Rule lines are layout artifacts of the extraction step; they must never
/// act as hard chunk boundaries, and they must stay transparent to the
/// cross-page hyphen merge.
pub fn normalize_horizontal_rules(text: &str) -> String {
    let kept: Vec<&str> = text.lines().filter(|line| !is_horizontal_rule(line)).collect();
    kept.join("\n")
}

fn is_horizontal_rule(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.len() < 3 {
        return false;
    }
    let first = trimmed.chars().next().unwrap_or(' ');
    matches!(first, '-' | '*' | '_') && trimmed.chars().all(|c| c == first)
}

/// Byte position where a trailing emphasis closer starts, if one ends the text
fn emphasis_closer_position(text: &str) -> Option<usize> {
    let stripped = text.trim_end();
    if stripped.len() < 2 {
        return None;
    }
    EMPHASIS_CLOSERS
        .iter()
        .any(|closer| stripped.ends_with(closer))
        .then(|| stripped.len() - 2)
}

/// Whether the page's text ends in a hyphenated word fragment
///
/// The hyphen must directly follow an alphanumeric character; trailing
/// whitespace and one markdown emphasis closer are looked through.
pub fn ends_with_hyphen(text: &str) -> bool {
    let end = emphasis_closer_position(text).unwrap_or(text.len());
    let cleaned = text[..end].trim_end();

    let mut chars = cleaned.chars().rev();
    let last = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    let before = match chars.next() {
        Some(c) => c,
        None => return false,
    };

    HYPHENS.contains(&last) && before.is_alphanumeric()
}

/// First whitespace-delimited token of the text
pub fn first_word(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

/// Merge a hyphen-ending page text with the next page's first word
///
/// The trailing hyphen and whitespace are removed, the word is appended,
/// and any emphasis closer that sat at the boundary is re-inserted after it.
pub fn merge_hyphenated(first: &str, second: &str) -> String {
    let end = emphasis_closer_position(first).unwrap_or(first.len());
    let closer = &first[end..];
    let head = first[..end].trim_end_matches(|c: char| c.is_whitespace() || HYPHENS.contains(&c));

    let word = first_word(second).unwrap_or("");
    format!("{}{}{}", head, word, closer)
}

/// Remove the leading whitespace-delimited token from the text
pub fn remove_first_word(text: &str) -> String {
    let stripped = text.trim_start();
    match stripped.find(char::is_whitespace) {
        Some(idx) => {
            let rest = &stripped[idx..];
            let ws_len = rest.chars().next().map(char::len_utf8).unwrap_or(0);
            rest[ws_len..].to_string()
        }
        None => String::new(),
    }
}

/// Whether the page's actual lead token agrees with the word the extraction
/// step reported at that position
///
/// Comparison ignores markdown punctuation on both sides. A disagreement
/// means the token does not continue the hyphenated fragment, so the caller
/// must skip the merge rather than corrupt the text.
pub fn lead_token_matches(token: &str, reported: &str) -> bool {
    strip_markdown_punctuation(token) == strip_markdown_punctuation(reported)
}

fn strip_markdown_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| matches!(c, '*' | '_' | '~' | '`' | '#'))
}

/// Repair words wrapped with a hyphen across a line break within one page,
/// including fragments that carry an emphasis closer at the wrap point, and
/// collapse runs of spaces.
pub fn repair_wrapped_hyphens(text: &str) -> String {
    let mut repaired = text.to_string();
    let [bold, strike, underline, plain] = wrapped_hyphen_regexes();
    repaired = bold.replace_all(&repaired, "$1$2**\n").into_owned();
    repaired = strike.replace_all(&repaired, "$1$2~~\n").into_owned();
    repaired = underline.replace_all(&repaired, "$1$2__\n").into_owned();
    repaired = plain.replace_all(&repaired, "$1$2\n").into_owned();
    space_run_regex()
        .replace_all(&repaired, " ")
        .trim()
        .to_string()
}

/// Trim whitespace surrounding every line
pub fn trim_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_rules_removed() {
        let text = "above\n---\nbelow\n***\nend\n___";
        assert_eq!(normalize_horizontal_rules(text), "above\nbelow\nend");
    }

    #[test]
    fn test_short_dashes_kept() {
        assert_eq!(normalize_horizontal_rules("a\n--\nb"), "a\n--\nb");
    }

    #[test]
    fn test_ends_with_hyphen() {
        assert!(ends_with_hyphen("some wrapped tex-"));
        assert!(ends_with_hyphen("some wrapped tex- \n"));
        assert!(ends_with_hyphen("unicode hyphen tex\u{2010}"));
        assert!(!ends_with_hyphen("no hyphen here"));
        assert!(!ends_with_hyphen("dash after space -"));
        assert!(!ends_with_hyphen("-"));
        assert!(!ends_with_hyphen(""));
    }

    #[test]
    fn test_ends_with_hyphen_behind_emphasis() {
        assert!(ends_with_hyphen("**bold frag-**"));
        assert!(ends_with_hyphen("~~struck frag-~~  "));
        assert!(!ends_with_hyphen("**bold word**"));
    }

    #[test]
    fn test_merge_plain() {
        assert_eq!(merge_hyphenated("text abc-", "def and more"), "text abcdef");
    }

    #[test]
    fn test_merge_keeps_emphasis_closer() {
        assert_eq!(merge_hyphenated("**text abc-**", "def more"), "**text abcdef**");
    }

    #[test]
    fn test_remove_first_word() {
        assert_eq!(remove_first_word("def and more"), "and more");
        assert_eq!(remove_first_word("  def and more"), "and more");
        assert_eq!(remove_first_word("single"), "");
        assert_eq!(remove_first_word(""), "");
    }

    #[test]
    fn test_lead_token_matching() {
        assert!(lead_token_matches("def**", "def"));
        assert!(lead_token_matches("def", "def"));
        assert!(!lead_token_matches("ghi", "def"));
    }

    #[test]
    fn test_wrapped_hyphen_repair() {
        assert_eq!(repair_wrapped_hyphens("wrap-\nped word"), "wrapped\n word");
        assert_eq!(repair_wrapped_hyphens("wrap-**\nped word"), "wrapped**\n word");
    }

    #[test]
    fn test_space_runs_collapsed() {
        assert_eq!(repair_wrapped_hyphens("a   b  c"), "a b c");
    }
}
