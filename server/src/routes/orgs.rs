use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use crm::service::orgs::{
    self, AddMember, ChangeRole, CreateOrganization, MemberDto, OrganizationDto, WebhookInfo,
};
use platform_api::{ApiResult, JsonBody, PathParam};
use uuid::Uuid;

use crate::{auth::AuthUser, http::AppState};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/organizations", get(list).post(create))
        .route("/organizations/{id}", get(get_one))
        .route("/organizations/{id}/members", get(members).post(add_member))
        .route("/organizations/{id}/members/{member_id}", delete(remove_member))
        .route("/organizations/{id}/members/{member_id}/role", put(change_role))
        .route("/organizations/{id}/webhook", get(webhook_info))
        .route("/organizations/{id}/webhook/regenerate", post(regenerate_key))
}

async fn list(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<Vec<OrganizationDto>>> {
    Ok(Json(orgs::list_mine(&state.db, claims.sub).await?))
}

async fn get_one(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<OrganizationDto>> {
    Ok(Json(orgs::get(&state.db, claims.sub, id).await?))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    JsonBody(input): JsonBody<CreateOrganization>,
) -> ApiResult<(StatusCode, Json<OrganizationDto>)> {
    let org = orgs::create(&state.db, claims.sub, input).await?;
    Ok((StatusCode::CREATED, Json(org)))
}

async fn members(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<Vec<MemberDto>>> {
    Ok(Json(orgs::members(&state.db, claims.sub, id).await?))
}

async fn add_member(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<AddMember>,
) -> ApiResult<(StatusCode, Json<MemberDto>)> {
    let member = orgs::add_member(&state.db, claims.sub, id, input).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn change_role(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    PathParam((id, member_id)): PathParam<(Uuid, Uuid)>,
    JsonBody(input): JsonBody<ChangeRole>,
) -> ApiResult<Json<MemberDto>> {
    Ok(Json(orgs::change_role(&state.db, claims.sub, id, member_id, input).await?))
}

async fn remove_member(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    PathParam((id, member_id)): PathParam<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    orgs::remove_member(&state.db, claims.sub, id, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn webhook_info(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<WebhookInfo>> {
    Ok(Json(orgs::webhook_info(&state.db, claims.sub, id).await?))
}

async fn regenerate_key(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<WebhookInfo>> {
    Ok(Json(orgs::regenerate_webhook_key(&state.db, claims.sub, id).await?))
}
