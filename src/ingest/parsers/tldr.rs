// src/ingest/parsers/tldr.rs
//! Extraction strategy for the TLDR tech newsletter.
//!
//! TLDR wraps every article link in its click tracker, so link discovery
//! keys on that host. The layout between two article links carries the
//! article's blurb, and section headings appear as plain text above their
//! articles, which is all the structure the scan relies on.

use std::collections::HashSet;

use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::canonical;
use crate::htmltext::{self, AnchorMatch};
use crate::ingest::types::{
    rfc2822_to_iso_date, today_iso_date, ArticleCandidate, EmailMessage, ExtractionMethod,
    ExtractionStrategy, ParsedNewsletter,
};

const TRACKING_HOST: &str = "tracking.tldrnewsletter.com";

/// Known section headings, scanned as plain text. Order is fixed but
/// irrelevant to matching; the latest occurrence before a link wins.
const SECTION_HEADINGS: &[&str] = &[
    "Big Tech & Startups",
    "Science & Futuristic Technology",
    "Programming, Design & Data Science",
    "Headlines & Launches",
    "Research & Innovation",
    "Engineering & Resources",
    "Opinions & Advice",
    "Launches & Tools",
    "Deep Dives & Analysis",
    "Miscellaneous",
    "Quick Links",
];

/// Boilerplate link texts that are never article titles. Full-string,
/// case-insensitive; also drops bare numbers.
static RE_BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^(?:
            view\s+online|read\s+online|view\s+in\s+browser|
            subscribe|sign\s*up|sign\s*up\s+now|join\s+free|
            unsubscribe|manage\s+(?:your\s+)?subscriptions?|update\s+your\s+preferences|
            advertise|advertise\s+with\s+us|sponsor|sponsored|become\s+a\s+sponsor|
            share|share\s+this|forward\s+to\s+a\s+friend|tweet|
            follow\s+us(?:\s+on\s+\w+)?|
            privacy\s+policy|terms\s+of\s+service|
            careers|jobs|we'?re\s+hiring|hiring!?|
            \d+
        )$",
    )
    .unwrap()
});

static RE_SPONSOR_MARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\((?:sponsor|sponsored)\)\s*").unwrap());

pub struct TldrStrategy {
    summary_max_chars: usize,
}

impl Default for TldrStrategy {
    fn default() -> Self {
        Self {
            summary_max_chars: 500,
        }
    }
}

impl TldrStrategy {
    pub fn new(summary_max_chars: usize) -> Self {
        Self { summary_max_chars }
    }

    fn is_valid_title_text(text: &str) -> bool {
        let len = text.chars().count();
        if !(10..=300).contains(&len) {
            return false;
        }
        !RE_BOILERPLATE.is_match(text)
    }

    /// Description for one article: the markup between its link and the
    /// next surviving link. A styled span wins when long enough; otherwise
    /// the whole segment is tag-stripped and cleaned up.
    fn description_from_segment(&self, segment: &str) -> String {
        if let Some(span) = htmltext::styled_span_text(segment) {
            if span.chars().count() >= 20 {
                return htmltext::truncate_at_sentence(&span, self.summary_max_chars);
            }
        }
        let text = htmltext::strip_tags(segment);
        let text = RE_SPONSOR_MARK.replace_all(&text, " ");
        let text = htmltext::strip_leading_orphan_punct(text.trim());
        htmltext::truncate_at_sentence(text.trim(), self.summary_max_chars)
    }

    /// Strategy-local URL key: the decoded destination when the tracking
    /// URL carries one, else the lowercased raw URL. Looser than the dedup
    /// engine's canonical key on purpose; this only collapses literal
    /// repeats within one email.
    fn loose_url_key(url: &str) -> String {
        let resolved = canonical::resolve_redirect(url);
        if resolved != url {
            resolved
        } else {
            url.to_ascii_lowercase()
        }
    }
}

/// Byte positions of every section-heading occurrence, ascending. Both the
/// literal heading and its `&amp;`-encoded form are searched.
fn section_marks(doc: &str) -> Vec<(usize, &'static str)> {
    let mut marks = Vec::new();
    for name in SECTION_HEADINGS {
        let encoded = name.replace('&', "&amp;");
        for needle in [*name, encoded.as_str()] {
            let mut from = 0;
            while let Some(pos) = doc[from..].find(needle) {
                marks.push((from + pos, *name));
                from += pos + needle.len();
            }
        }
    }
    marks.sort_by_key(|&(idx, _)| idx);
    marks
}

impl ExtractionStrategy for TldrStrategy {
    fn source(&self) -> &'static str {
        "tldr"
    }

    fn display_name(&self) -> &'static str {
        "TLDR"
    }

    fn parse(&self, message: &EmailMessage) -> ParsedNewsletter {
        let t0 = std::time::Instant::now();
        let published_at = rfc2822_to_iso_date(&message.date).unwrap_or_else(today_iso_date);
        let mut parsed = ParsedNewsletter {
            newsletter_source: self.source().to_string(),
            email_subject: message.subject.clone(),
            published_at: published_at.clone(),
            candidates: Vec::new(),
        };

        if message.html_body.trim().is_empty() {
            return parsed;
        }

        let doc = htmltext::strip_noise(&message.html_body);
        let links: Vec<AnchorMatch> = htmltext::find_anchors(&doc)
            .into_iter()
            .filter(|a| a.url.contains(TRACKING_HOST))
            .filter(|a| Self::is_valid_title_text(&a.text))
            .collect();
        let marks = section_marks(&doc);

        let mut seen_urls: HashSet<String> = HashSet::new();
        for (i, link) in links.iter().enumerate() {
            let (title, reading_time) = htmltext::split_reading_time(&link.text);

            let seg_start = link.end.min(doc.len());
            let seg_end = links
                .get(i + 1)
                .map(|next| next.start)
                .unwrap_or(doc.len())
                .max(seg_start);
            let description = self.description_from_segment(&doc[seg_start..seg_end]);

            let section = marks
                .iter()
                .filter(|&&(idx, _)| idx < link.start)
                .next_back()
                .map(|&(_, name)| name.to_string());

            if title.chars().count() <= 10 || description.chars().count() <= 20 {
                continue;
            }
            if !seen_urls.insert(Self::loose_url_key(&link.url)) {
                continue;
            }

            parsed.candidates.push(ArticleCandidate {
                title,
                url: Some(link.url.clone()),
                summary: description,
                content: None,
                source_name: self.display_name().to_string(),
                extraction_method: ExtractionMethod::EmailLinks,
                title_inferred: Some(false),
                reading_time,
                section,
                newsletter_date: Some(published_at.clone()),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("harvest_parse_ms").record(ms);
        counter!("harvest_candidates_total").increment(parsed.candidates.len() as u64);
        parsed
    }
}
