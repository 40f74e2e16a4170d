// src/ingest/parsers/mod.rs
pub mod tldr;

use std::sync::Arc;

use crate::config::HarvestSettings;
use crate::registry::ParserRegistry;

/// Registry with every known newsletter source wired up. New sources are
/// added here by implementing `ExtractionStrategy` and registering; the
/// routing logic itself never changes.
pub fn default_registry(settings: &HarvestSettings) -> ParserRegistry {
    let mut registry = ParserRegistry::new();
    registry.register(
        Arc::new(tldr::TldrStrategy::new(settings.summary_max_chars)),
        &["dan@tldrnewsletter.com"],
        &["tldrnewsletter.com"],
    );
    registry
}
