use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::config::HarvestSettings;
use crate::embeddings::EmbeddingClient;
use crate::ingest::mailbox::FixtureMailbox;
use crate::ingest::types::{EmailMessage, ParsedNewsletter};
use crate::ingest::IngestReport;
use crate::registry::{MatchType, ParserRegistry, RegistrationInfo};
use crate::store::{Article, ArticleStore};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ParserRegistry>,
    pub settings: Arc<HarvestSettings>,
    pub store: Arc<dyn ArticleStore>,
    pub embeddings: Arc<dyn EmbeddingClient>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/extract", post(extract))
        .route("/ingest", post(ingest))
        .route("/debug/registry", get(debug_registry))
        .route("/debug/articles", get(debug_articles))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct ExtractResp {
    matched: bool,
    source: Option<String>,
    match_type: Option<MatchType>,
    newsletter: Option<ParsedNewsletter>,
}

/// Route one email and run its strategy, with no persistence side effects.
async fn extract(
    State(state): State<AppState>,
    Json(message): Json<EmailMessage>,
) -> Json<ExtractResp> {
    match state.registry.find_parser(&message.from) {
        Some(route) => {
            let newsletter = route.strategy.parse(&message);
            Json(ExtractResp {
                matched: true,
                source: Some(route.source),
                match_type: Some(route.match_type),
                newsletter: Some(newsletter),
            })
        }
        None => Json(ExtractResp {
            matched: false,
            source: None,
            match_type: None,
            newsletter: None,
        }),
    }
}

/// Run the full pipeline over a posted batch of emails.
async fn ingest(
    State(state): State<AppState>,
    Json(messages): Json<Vec<EmailMessage>>,
) -> Result<Json<IngestReport>, (StatusCode, String)> {
    let mailbox = FixtureMailbox::from_messages(messages);
    crate::ingest::run_once(
        &mailbox,
        &state.registry,
        state.store.as_ref(),
        state.embeddings.as_ref(),
        &state.settings,
    )
    .await
    .map(Json)
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn debug_registry(State(state): State<AppState>) -> Json<Vec<RegistrationInfo>> {
    Json(state.registry.registrations())
}

async fn debug_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Article>>, (StatusCode, String)> {
    state
        .store
        .all()
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
