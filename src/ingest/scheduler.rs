// src/ingest/scheduler.rs
use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::config::HarvestSettings;
use crate::embeddings::EmbeddingClient;
use crate::ingest::mailbox::MailSource;
use crate::registry::ParserRegistry;
use crate::store::ArticleStore;

#[derive(Clone, Copy, Debug)]
pub struct HarvestSchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn a background task running the harvest pipeline on an interval.
/// Errors are logged per tick and never kill the loop.
pub fn spawn_harvest_scheduler(
    cfg: HarvestSchedulerCfg,
    mailbox: Arc<dyn MailSource>,
    registry: Arc<ParserRegistry>,
    store: Arc<dyn ArticleStore>,
    embeddings: Arc<dyn EmbeddingClient>,
    settings: Arc<HarvestSettings>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs));
        loop {
            ticker.tick().await;
            counter!("harvest_runs_total").increment(1);

            match crate::ingest::run_once(
                mailbox.as_ref(),
                &registry,
                store.as_ref(),
                embeddings.as_ref(),
                &settings,
            )
            .await
            {
                Ok(report) => {
                    tracing::info!(
                        target: "harvest",
                        emails = report.emails_seen,
                        persisted = report.persisted,
                        unique = report.final_unique,
                        "scheduled harvest tick"
                    );
                }
                Err(e) => {
                    tracing::warn!(target: "harvest", error = ?e, "scheduled harvest tick failed");
                }
            }
        }
    })
}
