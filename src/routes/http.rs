//! HTTP endpoint handlers. Thin wrappers over ingestion, generation, and the
//! session store; each handler is instrumented and logs basic result info.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{info, instrument};

use crate::domain::GenerationRequest;
use crate::error::{ApiError, GenerationError};
use crate::protocol::*;
use crate::session::Submit;
use crate::state::{validate_generation_request, AppState};
use crate::{export, ingest};

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

/// `POST /api/upload`: multipart file body in, extracted plain text out.
#[instrument(level = "info", skip(multipart))]
pub async fn http_upload(mut multipart: Multipart) -> Result<Json<UploadOut>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read file field: {e}")))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }
    let Some((file_name, bytes)) = upload else {
        return Err(ApiError::BadRequest("missing 'file' field".into()));
    };

    let text = ingest::extract_text(&bytes, &file_name)?;
    info!(target: "text2quiz_backend", %file_name, text_len = text.len(), "Upload extracted");
    Ok(Json(UploadOut { text }))
}

/// `POST /api/generate`: validate, call the provider, and on success create
/// the quiz session seeded with the request's timer.
#[instrument(
    level = "info",
    skip(state, body),
    fields(count = body.count, timer = body.timer, content_len = body.content.len())
)]
pub async fn http_generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerationRequest>,
) -> Result<Json<GenerateOut>, ApiError> {
    validate_generation_request(&body)?;

    let model = state.model.as_ref().ok_or(GenerationError::NotConfigured)?;
    let questions = model.generate(&state.config.prompts, &body).await?;
    let session_id = state.create_session(questions.clone(), body.timer).await;
    info!(target: "quiz", %session_id, count = questions.len(), "Generate served");
    Ok(Json(GenerateOut { session_id, questions }))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionOut>, ApiError> {
    let out = state.with_session(&id, SessionOut::from_session).await?;
    Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%id, index = body.index))]
pub async fn http_post_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AnswerIn>,
) -> Result<StatusCode, ApiError> {
    state.select_answer(&id, body.index, body.answer).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_post_submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SubmitOut>, ApiError> {
    let outcome = state.submit(&id).await?;
    // Either way the session is now Submitted; report the recorded attempt.
    let out = state
        .with_session(&id, |s| SubmitOut {
            score: s.score().unwrap_or(0),
            total: s.questions().len(),
            auto_submitted: s.auto_submitted(),
        })
        .await?;
    if let Submit::AlreadySubmitted = outcome {
        info!(target: "quiz", %id, "Submit was a no-op (already submitted)");
    }
    Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_post_retake(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionOut>, ApiError> {
    state.retake(&id).await?;
    let out = state.with_session(&id, SessionOut::from_session).await?;
    Ok(Json(out))
}

/// `GET /api/session/{id}/export?name=...`: the quiz plus its answer key as
/// a PDF. Depends only on the questions, never on the user's answers.
#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_export(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let name = q.name.unwrap_or_else(|| "quiz".into());
    let questions = state.with_session(&id, |s| s.questions().to_vec()).await?;
    let bytes = export::render(&questions, &name)?;
    info!(target: "quiz", %id, pdf_bytes = bytes.len(), "Export rendered");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.pdf\"", name),
            ),
        ],
        bytes,
    ))
}
