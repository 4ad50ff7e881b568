//! Visualization endpoints
//!
//! POST /api/visualization         - run the visualization script
//! GET  /api/visualization/status  - whether the output page exists
//! GET  /galileo/visualization     - redirect to the served output page

use axum::{
    extract::State,
    http::StatusCode,
    response::{Json, Redirect},
};
use serde::Serialize;
use tracing::warn;

use super::AppState;
use crate::error::VisualizationError;
use crate::visualization::{VisualizationOutcome, VisualizationRequest};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub ready: bool,
    pub output_path: String,
}

fn error_response(e: &VisualizationError) -> (StatusCode, Json<ErrorResponse>) {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: e.code(),
            message: e.to_string(),
        }),
    )
}

/// POST /api/visualization
pub async fn generate_visualization(
    State(state): State<AppState>,
    Json(req): Json<VisualizationRequest>,
) -> Result<Json<VisualizationOutcome>, (StatusCode, Json<ErrorResponse>)> {
    state
        .trigger
        .generate(&req.variable1, &req.variable2)
        .await
        .map(Json)
        .map_err(|e| {
            warn!("Visualization request failed: {}", e);
            error_response(&e)
        })
}

/// GET /api/visualization/status
pub async fn visualization_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ready: state.trigger.output_ready(),
        output_path: state.trigger.config().served_output_path(),
    })
}

/// GET /galileo/visualization
pub async fn show_visualization(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.trigger.config().served_output_path())
}
