//! Pattern-based HTML text primitives shared by extraction strategies.
//!
//! No DOM is built anywhere in this crate: strategies scan the raw markup
//! with regexes and keep byte offsets, so everything here works on plain
//! strings and never fails on malformed input.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static RE_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());
static RE_STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").unwrap());
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap()
});
static RE_STYLED_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<span\b[^>]*\bstyle\s*=[^>]*>(.*?)</span>"#).unwrap());
static RE_READING_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(\s*(\d+)\s*min(?:ute)?s?\s+read\s*\)\s*$").unwrap());
static RE_LEADING_ORPHAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s.,;:!?)\]|\u{2013}\u{2014}-]+").unwrap());

/// One anchor found in the document, with byte offsets of the whole
/// `<a>…</a>` match so callers can reason about document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorMatch {
    pub url: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Remove HTML comments, `<script>` and `<style>` blocks.
pub fn strip_noise(html: &str) -> String {
    let out = RE_COMMENTS.replace_all(html, "");
    let out = RE_SCRIPT.replace_all(&out, "");
    RE_STYLE.replace_all(&out, "").into_owned()
}

/// Strip all tags, decode entities, collapse whitespace, trim.
pub fn strip_tags(fragment: &str) -> String {
    let out = RE_TAGS.replace_all(fragment, " ");
    let out = html_escape::decode_html_entities(&out).to_string();
    RE_WS.replace_all(&out, " ").trim().to_string()
}

/// All non-overlapping anchors in document order. Inner text is
/// tag-stripped and entity-decoded; hrefs get their entities decoded too
/// (`&amp;` is ubiquitous in mail markup).
pub fn find_anchors(html: &str) -> Vec<AnchorMatch> {
    RE_ANCHOR
        .captures_iter(html)
        .map(|cap| {
            let m = cap.get(0).unwrap();
            AnchorMatch {
                url: html_escape::decode_html_entities(&cap[1]).trim().to_string(),
                text: strip_tags(&cap[2]),
                start: m.start(),
                end: m.end(),
            }
        })
        .collect()
}

/// Inner text of the first inline-styled `<span>` in the fragment, if any.
pub fn styled_span_text(fragment: &str) -> Option<String> {
    RE_STYLED_SPAN
        .captures(fragment)
        .map(|cap| strip_tags(&cap[1]))
}

/// Split a trailing `"(N minute read)"` suffix off a link title.
/// Returns the remaining title and the reading time as `"N min read"`.
/// Absence of the suffix is not a fault: the full text stays the title.
pub fn split_reading_time(text: &str) -> (String, Option<String>) {
    if let Some(cap) = RE_READING_TIME.captures(text) {
        let title = text[..cap.get(0).unwrap().start()].trim().to_string();
        let minutes = &cap[1];
        return (title, Some(format!("{minutes} min read")));
    }
    (text.trim().to_string(), None)
}

/// Drop a leading run of orphaned punctuation left over from tag stripping.
pub fn strip_leading_orphan_punct(text: &str) -> String {
    RE_LEADING_ORPHAN.replace(text, "").into_owned()
}

/// Truncate to `max_chars`, preferring to cut at the last sentence-ending
/// period when it lies past 60% of the cap; otherwise hard-cut and append
/// an ellipsis.
pub fn truncate_at_sentence(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }
    let cut: String = chars[..max_chars].iter().collect();
    if let Some(byte_pos) = cut.rfind('.') {
        let char_pos = cut[..byte_pos].chars().count();
        if (char_pos as f64) >= (max_chars as f64) * 0.6 {
            return cut[..=byte_pos].to_string();
        }
    }
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_blocks_are_removed() {
        let html = "<!-- x --><style>a{color:red}</style><script>var x=1;</script><p>Keep</p>";
        assert_eq!(strip_noise(html), "<p>Keep</p>");
    }

    #[test]
    fn strip_tags_decodes_and_collapses() {
        let s = "<p>Hello&nbsp;&amp;   <b>world</b></p>";
        assert_eq!(strip_tags(s), "Hello & world");
    }

    #[test]
    fn anchors_are_found_in_document_order_with_offsets() {
        let html = r#"pre <a href="https://a.example/1">First link</a> mid <a href='https://a.example/2?x=1&amp;y=2'>Second link</a> post"#;
        let anchors = find_anchors(html);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].url, "https://a.example/1");
        assert_eq!(anchors[0].text, "First link");
        assert!(anchors[0].start < anchors[0].end);
        assert!(anchors[0].end <= anchors[1].start);
        assert_eq!(anchors[1].url, "https://a.example/2?x=1&y=2");
    }

    #[test]
    fn reading_time_suffix_is_split() {
        let (title, rt) = split_reading_time("Foo Corp raises $50M (3 minute read)");
        assert_eq!(title, "Foo Corp raises $50M");
        assert_eq!(rt.as_deref(), Some("3 min read"));

        let (title, rt) = split_reading_time("No suffix here at all");
        assert_eq!(title, "No suffix here at all");
        assert!(rt.is_none());
    }

    #[test]
    fn reading_time_tolerates_min_and_plural() {
        let (_, rt) = split_reading_time("Title (12 mins read)");
        assert_eq!(rt.as_deref(), Some("12 min read"));
        let (_, rt) = split_reading_time("Title (1 min read)");
        assert_eq!(rt.as_deref(), Some("1 min read"));
    }

    #[test]
    fn styled_span_wins_when_present() {
        let seg = r#"<td><span style="color:#333">A styled description.</span></td>"#;
        assert_eq!(styled_span_text(seg).as_deref(), Some("A styled description."));
        assert!(styled_span_text("<td>plain</td>").is_none());
    }

    #[test]
    fn orphan_punctuation_is_stripped() {
        assert_eq!(strip_leading_orphan_punct(") . — Real text"), "Real text");
        assert_eq!(strip_leading_orphan_punct("Clean"), "Clean");
    }

    #[test]
    fn truncation_prefers_late_sentence_boundary() {
        // Period past 60% of the cap: cut there.
        let text = format!("{} End of sentence. Trailing tail beyond cap", "x".repeat(80));
        let out = truncate_at_sentence(&text, 100);
        assert!(out.ends_with('.'));
        assert!(out.chars().count() <= 100);

        // No usable period: hard cut plus ellipsis.
        let text = "y".repeat(200);
        let out = truncate_at_sentence(&text, 100);
        assert!(out.ends_with("..."));

        // Short input untouched.
        assert_eq!(truncate_at_sentence("short", 100), "short");
    }
}
