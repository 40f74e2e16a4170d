// tests/api_http.rs
use std::sync::Arc;

use axum::body::Body;
use http::{Request, StatusCode};
use tower::ServiceExt;

use newsletter_harvester::api::{create_router, AppState};
use newsletter_harvester::config::HarvestSettings;
use newsletter_harvester::embeddings::MockEmbeddings;
use newsletter_harvester::ingest::parsers;
use newsletter_harvester::store::MemoryStore;

const FIXTURE: &str = include_str!("fixtures/tldr_newsletter.html");

fn app() -> axum::Router {
    let settings = Arc::new(HarvestSettings::default());
    let registry = Arc::new(parsers::default_registry(&settings));
    let state = AppState {
        registry,
        settings,
        store: Arc::new(MemoryStore::with_capacity(100)),
        embeddings: Arc::new(MockEmbeddings),
    };
    create_router(state)
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_answers_ok() {
    let resp = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn extract_routes_and_parses_one_email() {
    let payload = serde_json::json!({
        "message_id": "m1",
        "from": "Dan <dan@tldrnewsletter.com>",
        "subject": "TLDR 2025-08-12",
        "date": "Tue, 12 Aug 2025 10:02:00 +0000",
        "html_body": FIXTURE,
        "text_body": ""
    });
    let req = Request::post("/extract")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["matched"], true);
    assert_eq!(json["source"], "tldr");
    assert_eq!(json["match_type"], "exact_email");
    assert_eq!(json["newsletter"]["candidates"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn extract_reports_unmatched_senders() {
    let payload = serde_json::json!({
        "message_id": "m2",
        "from": "nobody@unknown.example",
        "subject": "x",
        "date": "",
        "html_body": "",
        "text_body": ""
    });
    let req = Request::post("/extract")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["matched"], false);
    assert!(json["newsletter"].is_null());
}

#[tokio::test]
async fn ingest_runs_the_pipeline_and_reports_counts() {
    let payload = serde_json::json!([
        {
            "message_id": "m1",
            "from": "Dan <dan@tldrnewsletter.com>",
            "subject": "TLDR 2025-08-12",
            "date": "Tue, 12 Aug 2025 10:02:00 +0000",
            "html_body": FIXTURE,
            "text_body": ""
        }
    ]);
    let req = Request::post("/ingest")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["emails_seen"], 1);
    assert_eq!(json["extracted_total"], 3);
    assert_eq!(json["persisted"], 3);
    assert_eq!(json["final_unique"], 3);
    assert_eq!(json["audits"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn debug_routes_expose_registry_and_articles() {
    let resp = app()
        .oneshot(Request::get("/debug/registry").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let regs = json.as_array().unwrap();
    assert_eq!(regs.len(), 1);
    assert_eq!(regs[0]["source"], "tldr");

    let resp = app()
        .oneshot(Request::get("/debug/articles").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert!(json.as_array().unwrap().is_empty());
}
