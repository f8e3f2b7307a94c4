use std::{any::Any, sync::Arc};

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use configs::FrontendConfig;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tower::ServiceExt;
use tracing::{error, warn, Level};
use utoipa::OpenApi;

use common::types::Health;
use service::tracking::TrackingStore;

use crate::errors::INTERNAL_SERVER_ERROR;
use crate::openapi::ApiDoc;

pub mod tracking;

/// Shared handler state. The store is the only mutable state in the process.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TrackingStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn TrackingStore>) -> Self {
        Self { store }
    }
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(panic = %detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": INTERNAL_SERVER_ERROR})),
    )
        .into_response()
}

/// Unmatched requests: GET/HEAD may hit a static file in the frontend directory,
/// everything else (any method) gets the end-user page with 404.
async fn not_found(frontend: FrontendConfig, req: Request) -> Response {
    if matches!(*req.method(), Method::GET | Method::HEAD) {
        match ServeDir::new(&frontend.dir).oneshot(req).await {
            Ok(res) if res.status() != StatusCode::NOT_FOUND => return res.into_response(),
            _ => {}
        }
    }
    match tokio::fs::read_to_string(frontend.page("index.html")).await {
        Ok(page) => (StatusCode::NOT_FOUND, Html(page)).into_response(),
        Err(e) => {
            warn!(error = %e, "end-user page unavailable for 404");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// `/` and `/tracker` serve fixed pages; see [`not_found`] for the rest.
fn page_routes(frontend: &FrontendConfig) -> Router {
    let index = frontend.page("index.html");
    let tracker = frontend.page("tracker.html");
    let pages = frontend.clone();

    Router::new()
        .route_service("/", ServeFile::new(index))
        .route_service("/tracker", ServeFile::new(tracker))
        .fallback(move |req: Request| not_found(pages.clone(), req))
}

/// Build the full application router: pages, health, API docs and the tracking API.
pub fn build_router(state: AppState, frontend: &FrontendConfig, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/api/register_user", post(tracking::register_user))
        .route("/api/update_location", post(tracking::update_location))
        .route("/api/get_locations", get(tracking::get_locations))
        .route("/api/get_my_location", get(tracking::get_my_location))
        .route("/api/export_contacts", get(tracking::export_contacts))
        .with_state(state);

    let meta = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json));

    page_routes(frontend)
        .merge(meta)
        .merge(api)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx are logged at ERROR
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
