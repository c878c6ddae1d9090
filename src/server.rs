//! HTTP control surface: axum router and request handlers.
//!
//! Handlers never touch the frame. They forward [`RenderCommand`] values to
//! the render loop over `std::sync::mpsc` and read the [`DisplayStatus`] it
//! publishes.

use crate::patterns::pacman::GameState;
use crate::patterns::{ParameterSnapshot, PatternKind};
use crate::render::{DisplayStatus, ParameterUpdate, RenderCommand};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::Deserialize;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Channel to send commands to the render loop
    pub command_tx: Sender<RenderCommand>,
    /// Shared display status (render loop writes, handlers read)
    pub status: Arc<Mutex<DisplayStatus>>,
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        get_status,
        get_patterns,
        post_pattern,
        post_params,
        post_toggle,
        post_clear,
    ),
    components(schemas(
        DisplayStatus,
        GameState,
        ParameterSnapshot,
        ParameterUpdate,
        PatternKind,
        PatternRequest,
    )),
    tags(
        (name = "display", description = "Display control endpoints"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "LED Lattice API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP API for selecting and tuning the wireframe LED patterns"
    )
)]
pub struct ApiDoc;

// ── Request types ────────────────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PatternRequest {
    /// Pattern to run: comets, fireworks or pacman
    #[schema(example = "comets")]
    pattern: PatternKind,
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/patterns", get(get_patterns))
        .route("/api/v1/pattern", post(post_pattern))
        .route("/api/v1/params", post(post_params))
        .route("/api/v1/toggle", post(post_toggle))
        .route("/api/v1/clear", post(post_clear))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Forward a command, mapping a stopped render loop to 500.
fn send_command(state: &AppState, cmd: RenderCommand) -> Result<StatusCode, (StatusCode, String)> {
    state.command_tx.send(cmd).map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Render loop gone".to_string(),
        )
    })?;

    Ok(StatusCode::OK)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/status — return current display state
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current display status", body = DisplayStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Json<DisplayStatus> {
    let status = state.status.lock().unwrap().clone();
    Json(status)
}

/// GET /api/v1/patterns — list selectable patterns
#[utoipa::path(
    get,
    path = "/api/v1/patterns",
    tag = "system",
    responses(
        (status = 200, description = "Selectable pattern names", body = Vec<PatternKind>)
    )
)]
async fn get_patterns() -> Json<Vec<PatternKind>> {
    Json(PatternKind::ALL.to_vec())
}

/// POST /api/v1/pattern — switch pattern
#[utoipa::path(
    post,
    path = "/api/v1/pattern",
    tag = "display",
    request_body = PatternRequest,
    responses(
        (status = 200, description = "Pattern switch queued"),
        (status = 422, description = "Unknown pattern name")
    )
)]
async fn post_pattern(
    State(state): State<AppState>,
    Json(req): Json<PatternRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    send_command(&state, RenderCommand::SetPattern(req.pattern))
}

/// POST /api/v1/params — change hue, saturation, brightness or speed
///
/// Omitted fields keep their current value. Values are 0-255.
#[utoipa::path(
    post,
    path = "/api/v1/params",
    tag = "display",
    request_body = ParameterUpdate,
    responses(
        (status = 200, description = "Parameters updated"),
        (status = 422, description = "Value outside 0-255")
    )
)]
async fn post_params(
    State(state): State<AppState>,
    Json(req): Json<ParameterUpdate>,
) -> Result<StatusCode, (StatusCode, String)> {
    send_command(&state, RenderCommand::SetParams(req))
}

/// POST /api/v1/toggle — turn the display on or off
#[utoipa::path(
    post,
    path = "/api/v1/toggle",
    tag = "display",
    responses(
        (status = 200, description = "Display toggled"),
    )
)]
async fn post_toggle(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    send_command(&state, RenderCommand::Toggle)
}

/// POST /api/v1/clear — blank the display once
#[utoipa::path(
    post,
    path = "/api/v1/clear",
    tag = "display",
    responses(
        (status = 200, description = "Display cleared"),
    )
)]
async fn post_clear(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    send_command(&state, RenderCommand::Clear)
}
