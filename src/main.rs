//! Binary entrypoint: boots the Axum HTTP server, wiring the parser
//! registry, store, embedding client, and the optional fixture scheduler.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsletter_harvester::api::{self, AppState};
use newsletter_harvester::config::HarvestSettings;
use newsletter_harvester::embeddings;
use newsletter_harvester::ingest::mailbox::FixtureMailbox;
use newsletter_harvester::ingest::parsers;
use newsletter_harvester::ingest::scheduler::{spawn_harvest_scheduler, HarvestSchedulerCfg};
use newsletter_harvester::metrics::Metrics;
use newsletter_harvester::store::MemoryStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Arc::new(HarvestSettings::load().context("loading pipeline settings")?);
    let registry = Arc::new(parsers::default_registry(&settings));
    let store = Arc::new(MemoryStore::with_capacity(settings.store_capacity));
    let embeddings = embeddings::build_embedding_client();

    let metrics = Metrics::init(settings.similarity_threshold);

    if settings.ingest_interval_secs > 0 {
        if let Some(path) = settings.fixture_mailbox_path.clone() {
            let mailbox = Arc::new(
                FixtureMailbox::from_json_file(&path).context("loading fixture mailbox")?,
            );
            spawn_harvest_scheduler(
                HarvestSchedulerCfg {
                    interval_secs: settings.ingest_interval_secs,
                },
                mailbox,
                Arc::clone(&registry),
                store.clone(),
                Arc::clone(&embeddings),
                Arc::clone(&settings),
            );
            tracing::info!(
                interval_secs = settings.ingest_interval_secs,
                "fixture harvest scheduler running"
            );
        }
    }

    let state = AppState {
        registry,
        settings,
        store,
        embeddings,
    };
    let app = api::create_router(state).merge(metrics.router());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await.context("serving http")?;
    Ok(())
}
