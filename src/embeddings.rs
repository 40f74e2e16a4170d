//! Embedding client: provider abstraction + file cache.
//!
//! The semantic dedup pass treats embeddings as an opaque async
//! dependency. The one hard contract: a batch response must have the same
//! length and order as the request.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// One vector per input text, same length and order as the input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    fn provider_name(&self) -> &'static str;
}

/// Factory honoring `EMBEDDINGS_TEST_MODE=mock`; otherwise the OpenAI
/// provider wrapped with a file cache.
pub fn build_embedding_client() -> Arc<dyn EmbeddingClient> {
    if std::env::var("EMBEDDINGS_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockEmbeddings::default());
    }
    Arc::new(CachingEmbeddings::new(
        OpenAiEmbeddings::new(None),
        PathBuf::from("cache/embeddings"),
    ))
}

// ------------------------------------------------------------
// OpenAI provider
// ------------------------------------------------------------

/// OpenAI embeddings endpoint. Requires `OPENAI_API_KEY`.
pub struct OpenAiEmbeddings {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn new(model_override: Option<&str>) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("newsletter-harvester/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        let model = model_override.unwrap_or("text-embedding-3-small").to_string();
        Self {
            http,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddings {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if self.api_key.is_empty() {
            bail!("OPENAI_API_KEY is not set");
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            input: &'a [String],
        }
        #[derive(Deserialize)]
        struct Resp {
            data: Vec<Datum>,
        }
        #[derive(Deserialize)]
        struct Datum {
            index: usize,
            embedding: Vec<f32>,
        }

        let resp = self
            .http
            .post("https://api.openai.com/v1/embeddings")
            .bearer_auth(&self.api_key)
            .json(&Req {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .context("embeddings http post")?;

        if !resp.status().is_success() {
            bail!("embeddings api returned {}", resp.status());
        }
        let body: Resp = resp.json().await.context("embeddings response json")?;

        let mut data = body.data;
        data.sort_by_key(|d| d.index);
        let vectors: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();
        if vectors.len() != texts.len() {
            bail!(
                "embedding count mismatch: {} vectors for {} texts",
                vectors.len(),
                texts.len()
            );
        }
        Ok(vectors)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Deterministic mock
// ------------------------------------------------------------

/// Deterministic vectors derived from a text hash; identical texts get
/// identical vectors, distinct texts land far apart. For tests/dev only.
#[derive(Debug, Default, Clone)]
pub struct MockEmbeddings;

impl MockEmbeddings {
    fn vector_for(text: &str) -> Vec<f32> {
        let digest = Sha256::digest(text.as_bytes());
        digest
            .iter()
            .map(|&b| (b as f32 - 127.5) / 127.5)
            .collect()
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbeddings {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// File-cache wrapper
// ------------------------------------------------------------

/// Caches one vector per text, keyed by the text's sha256. Only misses hit
/// the inner provider; results are reassembled in request order.
pub struct CachingEmbeddings<C: EmbeddingClient> {
    inner: C,
    cache_dir: PathBuf,
}

impl<C: EmbeddingClient> CachingEmbeddings<C> {
    pub fn new(inner: C, cache_dir: PathBuf) -> Self {
        let _ = std::fs::create_dir_all(&cache_dir); // best-effort
        Self { inner, cache_dir }
    }
}

fn cache_key(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cached(dir: &Path, key: &str) -> Option<Vec<f32>> {
    let s = std::fs::read_to_string(cache_path(dir, key)).ok()?;
    serde_json::from_str(&s).ok()
}

fn write_cached(dir: &Path, key: &str, vector: &[f32]) -> std::io::Result<()> {
    let path = cache_path(dir, key);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(vector).unwrap_or_else(|_| "[]".to_string());
    std::fs::write(&tmp, json)?;
    std::fs::rename(tmp, path)?;
    Ok(())
}

#[async_trait]
impl<C: EmbeddingClient> EmbeddingClient for CachingEmbeddings<C> {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut miss_indices = Vec::new();
        let mut miss_texts = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            match read_cached(&self.cache_dir, &cache_key(text)) {
                Some(v) => out.push(Some(v)),
                None => {
                    out.push(None);
                    miss_indices.push(i);
                    miss_texts.push(text.clone());
                }
            }
        }

        if !miss_texts.is_empty() {
            let fresh = self.inner.embed_batch(&miss_texts).await?;
            if fresh.len() != miss_texts.len() {
                bail!(
                    "embedding count mismatch: {} vectors for {} texts",
                    fresh.len(),
                    miss_texts.len()
                );
            }
            for (slot, vector) in miss_indices.into_iter().zip(fresh) {
                let _ = write_cached(&self.cache_dir, &cache_key(&texts[slot]), &vector);
                out[slot] = Some(vector);
            }
        }

        Ok(out.into_iter().map(|v| v.expect("all slots filled")).collect())
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
