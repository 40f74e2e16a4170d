// src/ingest/mailbox.rs
//! Mail source boundary. Real IMAP/Gmail clients live outside this crate;
//! the pipeline only needs "give me unread messages".

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

use crate::ingest::types::EmailMessage;

#[async_trait]
pub trait MailSource: Send + Sync {
    async fn fetch_unread(&self) -> Result<Vec<EmailMessage>>;
    fn name(&self) -> &'static str;
}

/// Fixture-backed mailbox for tests, demos, and the fixture scheduler.
#[derive(Debug)]
pub struct FixtureMailbox {
    messages: Vec<EmailMessage>,
}

impl FixtureMailbox {
    pub fn from_messages(messages: Vec<EmailMessage>) -> Self {
        Self { messages }
    }

    /// Load a JSON array of messages from disk.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading mailbox fixture from {}", path.display()))?;
        let messages: Vec<EmailMessage> =
            serde_json::from_str(&content).context("parsing mailbox fixture JSON")?;
        Ok(Self { messages })
    }
}

#[async_trait]
impl MailSource for FixtureMailbox {
    async fn fetch_unread(&self) -> Result<Vec<EmailMessage>> {
        Ok(self.messages.clone())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
