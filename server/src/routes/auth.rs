use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use crm::service::auth::{self, AuthResponse, LoginRequest, RegisterRequest, UserDto};
use platform_api::{ApiResult, JsonBody};

use crate::{auth::AuthUser, http::AppState};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(auth::register(&state.db, &state.tokens, input).await?))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(auth::login(&state.db, &state.tokens, input).await?))
}

async fn me(State(state): State<AppState>, AuthUser(claims): AuthUser) -> ApiResult<Json<UserDto>> {
    Ok(Json(auth::me(&state.db, claims.sub).await?))
}
