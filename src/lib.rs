// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod canonical;
pub mod config;
pub mod dedup;
pub mod embeddings;
pub mod htmltext;
pub mod ingest;
pub mod metrics;
pub mod registry;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::HarvestSettings;
pub use crate::ingest::types::{
    ArticleCandidate, EmailMessage, ExtractionMethod, ExtractionStrategy, ParsedNewsletter,
};
pub use crate::registry::{MatchType, ParserRegistry};
