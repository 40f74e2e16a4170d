// src/ingest/types.rs
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

/// Raw email record handed to the pipeline by a mail source.
/// Any field may be empty; strategies must degrade, not fail.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub message_id: String,
    pub from: String,
    pub subject: String,
    /// RFC-2822-ish date header, e.g. "Tue, 12 Aug 2025 14:03:00 +0000".
    pub date: String,
    pub html_body: String,
    pub text_body: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Candidate points at an external article via a link in the email.
    EmailLinks,
    /// Candidate's content lives inline in the email itself; no URL.
    EmailInline,
}

/// One article extracted from one email, not yet deduplicated or persisted.
///
/// Invariant: `EmailLinks` implies `url` is Some; `EmailInline` implies
/// `url` is None and `content` carries the article body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleCandidate {
    pub title: String,
    pub url: Option<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub source_name: String,
    pub extraction_method: ExtractionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_inferred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// ISO date (YYYY-MM-DD) of the carrying newsletter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newsletter_date: Option<String>,
}

/// Result of one strategy invocation over one email. Consumed immediately
/// by the orchestrator, never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedNewsletter {
    /// Registry key of the strategy that produced this.
    pub newsletter_source: String,
    pub email_subject: String,
    /// YYYY-MM-DD.
    pub published_at: String,
    pub candidates: Vec<ArticleCandidate>,
}

/// Source-specific extraction algorithm. Implementations are pure over the
/// message: deterministic, no network, no persistence, and never panic on
/// malformed or empty bodies (they return zero candidates instead).
pub trait ExtractionStrategy: Send + Sync {
    /// Stable registry key, e.g. "tldr".
    fn source(&self) -> &'static str;
    /// Human-readable name used as `source_name` on candidates.
    fn display_name(&self) -> &'static str;
    fn parse(&self, message: &EmailMessage) -> ParsedNewsletter;
}

/// Parse an RFC 2822 date header into a YYYY-MM-DD string (UTC).
pub fn rfc2822_to_iso_date(ts: &str) -> Option<String> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
        .map(|dt| {
            let d = dt.date();
            format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
        })
}

/// Today's UTC date as YYYY-MM-DD; fallback when the date header is absent
/// or unparseable.
pub fn today_iso_date() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}
