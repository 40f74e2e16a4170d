//! Persistence boundary for harvested articles.
//!
//! Real database backends live outside this crate; the pipeline only needs
//! an existence check keyed by `source_url`, inserts, a full snapshot for
//! the semantic pass, and removal of detected duplicates.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ingest::types::ArticleCandidate;

/// A persisted article record, uniquely identified by `source_url` where
/// one exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub source_url: Option<String>,
    pub summary: String,
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newsletter_date: Option<String>,
}

impl Article {
    /// Id 0 marks "not yet persisted"; the store assigns the real id.
    pub fn from_candidate(c: &ArticleCandidate) -> Self {
        Self {
            id: 0,
            title: c.title.clone(),
            source_url: c.url.clone(),
            summary: c.summary.clone(),
            source_name: c.source_name.clone(),
            newsletter_date: c.newsletter_date.clone(),
        }
    }

    /// The text embedded for semantic comparison.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.summary)
    }
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// True iff an article with exactly this `source_url` exists.
    async fn exists_by_url(&self, url: &str) -> Result<bool>;
    /// Persist and return the assigned id.
    async fn insert(&self, article: Article) -> Result<u64>;
    async fn all(&self) -> Result<Vec<Article>>;
    async fn remove(&self, id: u64) -> Result<()>;
}

#[derive(Debug)]
struct MemoryInner {
    items: Vec<Article>,
    next_id: u64,
}

/// In-memory store with a capacity bound; oldest entries are dropped first.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    cap: usize,
}

impl MemoryStore {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.min(10_000);
        Self {
            inner: Mutex::new(MemoryInner {
                items: Vec::with_capacity(cap),
                next_id: 1,
            }),
            cap,
        }
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let g = self.inner.lock().expect("store mutex poisoned");
        Ok(g.items
            .iter()
            .any(|a| a.source_url.as_deref() == Some(url)))
    }

    async fn insert(&self, mut article: Article) -> Result<u64> {
        let mut g = self.inner.lock().expect("store mutex poisoned");
        article.id = g.next_id;
        g.next_id += 1;
        let id = article.id;
        g.items.push(article);
        if g.items.len() > self.cap {
            let excess = g.items.len() - self.cap;
            g.items.drain(0..excess);
        }
        Ok(id)
    }

    async fn all(&self) -> Result<Vec<Article>> {
        let g = self.inner.lock().expect("store mutex poisoned");
        Ok(g.items.clone())
    }

    async fn remove(&self, id: u64) -> Result<()> {
        let mut g = self.inner.lock().expect("store mutex poisoned");
        g.items.retain(|a| a.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::ExtractionMethod;

    fn candidate(url: &str) -> ArticleCandidate {
        ArticleCandidate {
            title: "A title long enough".into(),
            url: Some(url.into()),
            summary: "A summary of reasonable length.".into(),
            content: None,
            source_name: "TLDR".into(),
            extraction_method: ExtractionMethod::EmailLinks,
            title_inferred: Some(false),
            reading_time: None,
            section: None,
            newsletter_date: Some("2025-08-12".into()),
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_exists_matches_exact_url() {
        let store = MemoryStore::with_capacity(10);
        let id = store
            .insert(Article::from_candidate(&candidate("https://e.com/a")))
            .await
            .unwrap();
        assert_eq!(id, 1);
        assert!(store.exists_by_url("https://e.com/a").await.unwrap());
        assert!(!store.exists_by_url("https://e.com/b").await.unwrap());
    }

    #[tokio::test]
    async fn remove_drops_by_id() {
        let store = MemoryStore::with_capacity(10);
        let id = store
            .insert(Article::from_candidate(&candidate("https://e.com/a")))
            .await
            .unwrap();
        store
            .insert(Article::from_candidate(&candidate("https://e.com/b")))
            .await
            .unwrap();
        store.remove(id).await.unwrap();
        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].source_url.as_deref(), Some("https://e.com/b"));
    }

    #[tokio::test]
    async fn capacity_bound_drops_oldest() {
        let store = MemoryStore::with_capacity(2);
        for i in 0..3 {
            let url = format!("https://e.com/{i}");
            store
                .insert(Article::from_candidate(&candidate(&url)))
                .await
                .unwrap();
        }
        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(!store.exists_by_url("https://e.com/0").await.unwrap());
    }
}
