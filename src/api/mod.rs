//! HTTP surface
//!
//! `/` and `/galileo/questions` both render the questions page; the page's
//! single button drives the visualization endpoints.

pub mod pages;
pub mod visualization_routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::error;

use crate::visualization::{VisualizationTrigger, STATIC_MOUNT};
use pages::{PageRenderer, PageSettings};

pub const GENERATE_PATH: &str = "/api/visualization";
pub const STATUS_PATH: &str = "/api/visualization/status";
pub const RESULTS_PATH: &str = "/galileo/visualization";

#[derive(Clone)]
pub struct AppState {
    pub trigger: Arc<VisualizationTrigger>,
    pub pages: Arc<PageRenderer>,
}

impl AppState {
    pub fn new(
        trigger: Arc<VisualizationTrigger>,
        redirect_delay_ms: u64,
    ) -> Result<Self, handlebars::TemplateError> {
        let pages = PageRenderer::new(PageSettings {
            generate_url: GENERATE_PATH.to_string(),
            status_url: STATUS_PATH.to_string(),
            results_url: RESULTS_PATH.to_string(),
            redirect_delay_ms,
        })?;
        Ok(Self {
            trigger,
            pages: Arc::new(pages),
        })
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Build the application router.
///
/// `output_dir` is the script directory; when known it is served under
/// `/standalone-viz` so the generated page is reachable.
pub fn create_router(state: AppState, output_dir: Option<PathBuf>) -> Router {
    let mut router = Router::new()
        .route("/", get(questions_page))
        .route("/galileo/questions", get(questions_page))
        .route(RESULTS_PATH, get(visualization_routes::show_visualization))
        .route(
            GENERATE_PATH,
            post(visualization_routes::generate_visualization),
        )
        .route(STATUS_PATH, get(visualization_routes::visualization_status))
        .route("/api/health", get(health_check));

    if let Some(dir) = output_dir {
        router = router.nest_service(STATIC_MOUNT, ServeDir::new(dir));
    }

    router
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

async fn questions_page(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    state.pages.questions().map(Html).map_err(|e| {
        error!("Failed to render questions page: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse {
        success: true,
        data: Some("OK".to_string()),
        error: None,
    })
}
