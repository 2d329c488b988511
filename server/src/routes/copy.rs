use axum::{Json, Router, extract::State, routing::post};
use crm::copy::{CopyText, GenerateCopyRequest, GeneratedCopy, RewriteCopyRequest};
use platform_api::{ApiResult, JsonBody};

use crate::{auth::AuthUser, http::AppState};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/copy/generate", post(generate))
        .route("/copy/generate-with-recipient", post(generate_with_recipient))
        .route("/copy/rewrite", post(rewrite))
}

async fn generate(
    State(state): State<AppState>,
    _user: AuthUser,
    JsonBody(request): JsonBody<GenerateCopyRequest>,
) -> ApiResult<Json<CopyText>> {
    request.validate()?;
    let copy = state.copy.generate(&request).await;
    Ok(Json(CopyText { copy }))
}

async fn generate_with_recipient(
    State(state): State<AppState>,
    _user: AuthUser,
    JsonBody(request): JsonBody<GenerateCopyRequest>,
) -> ApiResult<Json<GeneratedCopy>> {
    request.validate()?;
    Ok(Json(state.copy.generate_with_recipient(&request).await))
}

async fn rewrite(
    State(state): State<AppState>,
    _user: AuthUser,
    JsonBody(request): JsonBody<RewriteCopyRequest>,
) -> ApiResult<Json<CopyText>> {
    request.validate()?;
    let copy = state.copy.rewrite(&request).await;
    Ok(Json(CopyText { copy }))
}
