// src/dedup/semantic.rs
//! Embedding-similarity dedup over persisted articles.
//!
//! Decoupled from the embedding fetch: callers hand in the vectors (or a
//! precomputed similarity matrix in tests) and get back the survivors plus
//! the collapsed groups for auditing.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::dedup::disjoint::DisjointSet;
use crate::store::Article;

/// Source default; configurable via `HarvestSettings`.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.85;

/// Standard dot-product-over-norms cosine similarity, clamped to [-1, 1].
/// Zero-norm input yields 0.0. A length mismatch is the one input this
/// module refuses: it means the embedding contract upstream was violated.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        bail!("embedding length mismatch: {} vs {}", a.len(), b.len());
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Full symmetric pairwise similarity matrix; diagonal is 1.0.
pub fn similarity_matrix(vectors: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
    let n = vectors.len();
    let mut matrix = vec![vec![0.0f32; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let sim = cosine_similarity(&vectors[i], &vectors[j])?;
            matrix[i][j] = sim;
            matrix[j][i] = sim;
        }
    }
    Ok(matrix)
}

/// Connected components of the "similarity >= threshold" relation, as
/// index groups ordered by first-seen member. Exposed separately so the
/// clustering is testable with synthetic matrices.
pub fn cluster_by_matrix(matrix: &[Vec<f32>], threshold: f32) -> Vec<Vec<usize>> {
    let n = matrix.len();
    let mut ds = DisjointSet::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if matrix[i][j] >= threshold {
                ds.union(i, j);
            }
        }
    }
    ds.groups()
}

/// One collapsed group: the surviving article plus the members discarded
/// in its favor, kept for auditability.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub representative: Article,
    pub duplicates: Vec<Article>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemanticDedupOutcome {
    /// Survivors, in first-occurrence order of their groups.
    pub kept: Vec<Article>,
    /// Groups that had more than one member.
    pub duplicate_groups: Vec<DuplicateGroup>,
}

/// Collapse articles whose embeddings are pairwise-transitively similar at
/// or above `threshold`. Group representatives are chosen by newsletter
/// date (newest first), then summary length (longest first). Fewer than
/// two articles pass through untouched.
pub fn cluster_duplicates(
    articles: Vec<Article>,
    vectors: &[Vec<f32>],
    threshold: f32,
) -> Result<SemanticDedupOutcome> {
    if articles.len() < 2 {
        return Ok(SemanticDedupOutcome {
            kept: articles,
            duplicate_groups: Vec::new(),
        });
    }
    if vectors.len() != articles.len() {
        bail!(
            "embedding batch size mismatch: {} vectors for {} articles",
            vectors.len(),
            articles.len()
        );
    }

    let matrix = similarity_matrix(vectors)?;
    let groups = cluster_by_matrix(&matrix, threshold);

    let mut kept = Vec::with_capacity(groups.len());
    let mut duplicate_groups = Vec::new();
    for group in groups {
        if group.len() == 1 {
            kept.push(articles[group[0]].clone());
            continue;
        }
        let mut members: Vec<Article> = group.iter().map(|&i| articles[i].clone()).collect();
        members.sort_by(|a, b| {
            b.newsletter_date
                .cmp(&a.newsletter_date)
                .then_with(|| b.summary.len().cmp(&a.summary.len()))
        });
        let representative = members.remove(0);
        kept.push(representative.clone());
        duplicate_groups.push(DuplicateGroup {
            representative,
            duplicates: members,
        });
    }

    Ok(SemanticDedupOutcome {
        kept,
        duplicate_groups,
    })
}
