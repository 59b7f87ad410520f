use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    analyzer::{analyze_images, AnalysisError},
    catalog::Catalog,
    chat::{forward_chat, ChatCompletion},
    config::Config,
    error::AppError,
    models::{ChatRequest, ChatResponse, RoutineRequest, RoutineResponse, SkinAnalysisReport, WidgetConfig},
    routine::generate_routine,
    uploads::collect_images,
};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub chat: Arc<dyn ChatCompletion>,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/chat", post(chat).fallback(method_not_allowed))
        .route("/api/chat", post(chat).fallback(method_not_allowed))
        .route("/api/create-routine", post(create_routine).fallback(method_not_allowed))
        .route(
            "/api/analyze-skin",
            post(analyze_skin).fallback(method_not_allowed).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/health", get(health).fallback(method_not_allowed))
        .route("/api/widget-config", get(widget_config).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(middleware::from_fn(preflight))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// Answers any OPTIONS request with an empty 200, whatever the path. The CORS
/// layer above adds the allow-origin header.
async fn preflight(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }
    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, POST, OPTIONS, HEAD"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Origin, X-Requested-With, Content-Type, Accept, Authorization"),
    );
    response
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let message = body.message.clone().unwrap_or_default();
    let history = body.normalized_history();

    tracing::info!("💬 Chat request: {} chars, {} history messages", message.len(), history.len());

    let response = forward_chat(state.chat.as_ref(), &state.catalog, &state.config.chat, &message, history).await?;
    Ok(Json(response))
}

pub async fn create_routine(payload: Result<Json<RoutineRequest>, JsonRejection>) -> Result<Json<RoutineResponse>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let routine = generate_routine(&body.answers);
    tracing::info!("🧴 Routine created: {} morning / {} evening steps", routine.morning.len(), routine.evening.len());
    Ok(Json(RoutineResponse { routine }))
}

pub async fn analyze_skin(
    State(state): State<AppState>,
    multipart: Result<Multipart, axum::extract::multipart::MultipartRejection>,
) -> Result<Json<SkinAnalysisReport>, AppError> {
    // A non-multipart request carries no files.
    let mut multipart = multipart.map_err(|e| {
        tracing::info!("Skin analysis request without multipart body: {}", e);
        AppError::from(AnalysisError::NoImages)
    })?;

    let scope = collect_images(&mut multipart, &state.config.upload_dir, state.config.max_upload_files).await?;
    let result = analyze_images(&scope.images);
    scope.close().await;

    let report = result?;
    tracing::info!(
        "🔬 Analyzed {} images, overall acne severity {:?}",
        report.details.len(),
        report.overall.acne.severity
    );
    Ok(Json(report))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn widget_config(State(state): State<AppState>) -> Json<WidgetConfig> {
    Json(state.config.widget.clone())
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
