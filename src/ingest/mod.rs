// src/ingest/mod.rs
pub mod mailbox;
pub mod parsers;
pub mod scheduler;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical;
use crate::config::HarvestSettings;
use crate::dedup;
use crate::dedup::semantic;
use crate::embeddings::EmbeddingClient;
use crate::ingest::mailbox::MailSource;
use crate::ingest::types::ArticleCandidate;
use crate::registry::{EmailAudit, ParserRegistry};
use crate::store::{Article, ArticleStore};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("harvest_emails_total", "Emails fetched from the mail source.");
        describe_counter!(
            "harvest_emails_unrouted_total",
            "Emails with no registered parser for their sender."
        );
        describe_counter!(
            "harvest_candidates_total",
            "Article candidates extracted by strategies."
        );
        describe_counter!(
            "harvest_dedup_exact_total",
            "Candidates removed by the exact-URL pass."
        );
        describe_counter!(
            "harvest_dedup_canonical_total",
            "Candidates removed by the canonical-URL pass."
        );
        describe_counter!(
            "harvest_dedup_semantic_total",
            "Persisted articles removed as semantic duplicates."
        );
        describe_counter!(
            "harvest_already_persisted_total",
            "Candidates skipped because their URL was already stored."
        );
        describe_counter!("harvest_articles_persisted_total", "New articles stored.");
        describe_histogram!("harvest_parse_ms", "Strategy parse time in milliseconds.");
        describe_gauge!(
            "harvest_last_run_ts",
            "Unix ts when the harvest pipeline last ran."
        );
    });
}

// Short stable id for log lines; raw bodies are never logged.
fn body_hash(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Aggregate counts and per-email audits for one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub emails_seen: usize,
    pub emails_routed: usize,
    pub emails_unrouted: usize,
    /// Candidates extracted before any dedup.
    pub extracted_total: usize,
    pub exact_dedup_removed: usize,
    pub canonical_dedup_removed: usize,
    /// Candidates whose raw or canonical URL was already in the store.
    pub already_persisted: usize,
    pub persisted: usize,
    pub semantic_removed: usize,
    /// Unique articles in the store after the run.
    pub final_unique: usize,
    pub audits: Vec<EmailAudit>,
}

/// Run the pipeline once: fetch -> route -> extract -> dedup -> persist ->
/// semantic collapse. Extraction and the first two dedup passes are pure;
/// the embedding call is the only awaited dependency, and its failure only
/// skips the semantic pass for the run.
pub async fn run_once(
    mailbox: &dyn MailSource,
    registry: &ParserRegistry,
    store: &dyn ArticleStore,
    embeddings: &dyn EmbeddingClient,
    settings: &HarvestSettings,
) -> anyhow::Result<IngestReport> {
    ensure_metrics_described();

    let messages = mailbox.fetch_unread().await?;
    let mut report = IngestReport {
        emails_seen: messages.len(),
        ..Default::default()
    };
    counter!("harvest_emails_total").increment(messages.len() as u64);

    let mut candidates: Vec<ArticleCandidate> = Vec::new();
    for msg in &messages {
        match registry.find_parser(&msg.from) {
            Some(route) => {
                let parsed = route.strategy.parse(msg);
                tracing::info!(
                    message_id = %msg.message_id,
                    source = %route.source,
                    candidates = parsed.candidates.len(),
                    body = %body_hash(&msg.html_body),
                    "email parsed"
                );
                report.emails_routed += 1;
                report.audits.push(EmailAudit::for_message(
                    msg,
                    Some(&route),
                    parsed.candidates.len(),
                    Vec::new(),
                ));
                candidates.extend(parsed.candidates);
            }
            None => {
                tracing::warn!(message_id = %msg.message_id, from = %msg.from, "no parser for sender");
                counter!("harvest_emails_unrouted_total").increment(1);
                report.emails_unrouted += 1;
                report.audits.push(EmailAudit::for_message(
                    msg,
                    None,
                    0,
                    vec!["no parser registered for sender".to_string()],
                ));
            }
        }
    }
    report.extracted_total = candidates.len();

    let (candidates, exact_removed) = dedup::dedup_exact_url(candidates);
    let (candidates, canonical_removed) = dedup::dedup_canonical(candidates);
    report.exact_dedup_removed = exact_removed;
    report.canonical_dedup_removed = canonical_removed;
    counter!("harvest_dedup_exact_total").increment(exact_removed as u64);
    counter!("harvest_dedup_canonical_total").increment(canonical_removed as u64);

    // Store boundary: a candidate is new only if neither its raw nor its
    // canonical URL is already persisted.
    for c in candidates {
        let known = match c.url.as_deref() {
            Some(u) => {
                store.exists_by_url(u).await?
                    || store.exists_by_url(&canonical::normalize(u)).await?
            }
            None => false,
        };
        if known {
            report.already_persisted += 1;
            continue;
        }
        store.insert(Article::from_candidate(&c)).await?;
        report.persisted += 1;
    }
    counter!("harvest_already_persisted_total").increment(report.already_persisted as u64);
    counter!("harvest_articles_persisted_total").increment(report.persisted as u64);

    // Semantic pass over everything persisted so far. Skipped below two
    // articles, and skipped (with a warning) when the embedding dependency
    // fails; retry policy around that dependency belongs to the caller.
    let articles = store.all().await?;
    if articles.len() >= 2 {
        let texts: Vec<String> = articles.iter().map(|a| a.embedding_text()).collect();
        match embeddings.embed_batch(&texts).await {
            Ok(vectors) => {
                let outcome =
                    semantic::cluster_duplicates(articles, &vectors, settings.similarity_threshold)?;
                for group in &outcome.duplicate_groups {
                    tracing::info!(
                        representative = %group.representative.title,
                        duplicates = group.duplicates.len(),
                        "semantic duplicate group collapsed"
                    );
                    for dup in &group.duplicates {
                        store.remove(dup.id).await?;
                        report.semantic_removed += 1;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = embeddings.provider_name(), "embedding batch failed; skipping semantic dedup");
            }
        }
    }
    counter!("harvest_dedup_semantic_total").increment(report.semantic_removed as u64);

    report.final_unique = store.all().await?.len();
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    gauge!("harvest_last_run_ts").set(now as f64);

    tracing::info!(
        emails = report.emails_seen,
        extracted = report.extracted_total,
        deduped = report.exact_dedup_removed + report.canonical_dedup_removed,
        persisted = report.persisted,
        semantic_removed = report.semantic_removed,
        unique = report.final_unique,
        "harvest run finished"
    );

    Ok(report)
}
