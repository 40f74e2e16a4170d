// src/dedup/mod.rs
//! Candidate deduplication passes.
//!
//! The orchestrator runs these in sequence but each pass stands alone:
//! a cheap exact-URL cut first, then canonical-URL grouping with a
//! better-candidate tie-break, then (in `semantic`) embedding clustering
//! over what actually got persisted.

pub mod disjoint;
pub mod semantic;

use std::collections::{HashMap, HashSet};

use crate::canonical;
use crate::ingest::types::ArticleCandidate;

/// Coarse key for the first pass: lowercase, scheme stripped, query
/// dropped entirely, trailing slashes trimmed. Deliberately more
/// aggressive than full canonicalization; this is a fast first cut.
fn exact_url_key(url: &str) -> String {
    let mut s = url.trim().to_ascii_lowercase();
    for scheme in ["https://", "http://"] {
        if let Some(rest) = s.strip_prefix(scheme) {
            s = rest.to_string();
            break;
        }
    }
    if let Some(q) = s.find('?') {
        s.truncate(q);
    }
    while s.ends_with('/') {
        s.pop();
    }
    s
}

/// First pass: keep the first candidate per coarse URL key, preserving
/// input order. Candidates without a URL pass through. Returns survivors
/// and the removed count.
pub fn dedup_exact_url(candidates: Vec<ArticleCandidate>) -> (Vec<ArticleCandidate>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(candidates.len());
    let mut removed = 0usize;
    for c in candidates {
        match c.url.as_deref() {
            Some(u) if !seen.insert(exact_url_key(u)) => removed += 1,
            _ => kept.push(c),
        }
    }
    (kept, removed)
}

/// Grouping key for the second pass: the fully normalized URL, or a
/// synthetic title key for inline candidates.
fn canonical_key(c: &ArticleCandidate) -> String {
    match c.url.as_deref() {
        Some(u) => canonical::normalize(u),
        None => format!("inline:{}", c.title.trim().to_lowercase()),
    }
}

/// True when `challenger` should replace `current` as its group's
/// representative. Each rule breaks ties from the prior one; a full tie
/// keeps the earliest-seen candidate.
fn prefer_challenger(current: &ArticleCandidate, challenger: &ArticleCandidate) -> bool {
    let cur_inferred = current.title_inferred == Some(true);
    let ch_inferred = challenger.title_inferred == Some(true);
    if cur_inferred != ch_inferred {
        return cur_inferred;
    }
    if current.content.is_some() != challenger.content.is_some() {
        return challenger.content.is_some();
    }
    if current.title.len() != challenger.title.len() {
        return challenger.title.len() > current.title.len();
    }
    challenger.summary.len() > current.summary.len()
}

/// Second pass: group by canonical URL (or inline title) and keep exactly
/// one representative per group. Output keeps the input order of each
/// group's first occurrence. Returns survivors and the removed count.
pub fn dedup_canonical(candidates: Vec<ArticleCandidate>) -> (Vec<ArticleCandidate>, usize) {
    let total = candidates.len();
    let mut index_of: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<ArticleCandidate> = Vec::new();
    for c in candidates {
        let key = canonical_key(&c);
        match index_of.get(&key) {
            Some(&i) => {
                if prefer_challenger(&kept[i], &c) {
                    kept[i] = c;
                }
            }
            None => {
                index_of.insert(key, kept.len());
                kept.push(c);
            }
        }
    }
    let removed = total - kept.len();
    (kept, removed)
}
