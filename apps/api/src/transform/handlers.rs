//! Axum route handlers for the session and document APIs.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InitializeSessionRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub ready: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdaptRequest {
    pub page_content: String,
    #[serde(default)]
    pub cv_content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    pub page_content: String,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TailorResponse {
    pub adapted_cv: String,
    pub cover_letter: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/session
pub async fn handle_session_status(State(state): State<AppState>) -> Json<SessionStatusResponse> {
    let ready = state.session.read().await.is_ready();
    Json(SessionStatusResponse { ready })
}

/// PUT /api/v1/session
///
/// Stores the API key. The key is not checked against the service here;
/// a bad key shows up as INVALID_CREDENTIAL on the first document request.
pub async fn handle_initialize_session(
    State(state): State<AppState>,
    Json(request): Json<InitializeSessionRequest>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let api_key = request.api_key.trim();
    if api_key.is_empty() {
        return Err(AppError::Validation("api_key cannot be empty".to_string()));
    }

    let mut session = state.session.write().await;
    session.initialize(api_key)?;

    Ok(Json(SessionStatusResponse {
        ready: session.is_ready(),
    }))
}

/// DELETE /api/v1/session
pub async fn handle_clear_session(State(state): State<AppState>) -> StatusCode {
    state.session.write().await.clear();
    StatusCode::NO_CONTENT
}

// ────────────────────────────────────────────────────────────────────────────
// Documents
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/documents/adapt
///
/// Adapts the supplied CV to the page, or drafts a CV template when none is given.
pub async fn handle_adapt(
    State(state): State<AppState>,
    Json(request): Json<AdaptRequest>,
) -> Result<Json<TextResponse>, AppError> {
    let session = state.session_snapshot().await;
    let text = state
        .transformer
        .adapt_document(
            &session,
            &request.page_content,
            request.cv_content.as_deref(),
        )
        .await?;

    Ok(Json(TextResponse { text }))
}

/// POST /api/v1/documents/cover-letter
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    Json(request): Json<CoverLetterRequest>,
) -> Result<Json<TextResponse>, AppError> {
    let session = state.session_snapshot().await;
    let text = state
        .transformer
        .generate_companion_letter(&session, &request.page_content)
        .await?;

    Ok(Json(TextResponse { text }))
}

/// POST /api/v1/documents/tailor
///
/// Runs both operations concurrently against the same session snapshot.
/// All-or-nothing: the first failure is returned and the other result dropped.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(request): Json<AdaptRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    let session = state.session_snapshot().await;
    let page = request.page_content.as_str();

    info!(
        "Tailoring documents (page_len={}, has_cv={})",
        page.len(),
        request.cv_content.as_deref().is_some_and(|cv| !cv.is_empty())
    );

    let (adapted_cv, cover_letter) = tokio::try_join!(
        state
            .transformer
            .adapt_document(&session, page, request.cv_content.as_deref()),
        state.transformer.generate_companion_letter(&session, page),
    )?;

    Ok(Json(TailorResponse {
        adapted_cv,
        cover_letter,
    }))
}
