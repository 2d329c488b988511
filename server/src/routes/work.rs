//! Tasks and activities.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch},
};
use crm::{
    PagedResult, PaginationParams,
    repo::activities::ActivityFilter,
    service::{
        activities::{self, ActivityDto, ActivityInput},
        tasks::{self, TaskDto, TaskInput, TaskQuery},
    },
};
use platform_api::{ApiError, ApiResult, JsonBody, PathParam, QueryParams};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::RequestActor, http::AppState};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", get(get_task).put(update_task).delete(remove_task))
        .route("/tasks/{id}/status", patch(update_status))
        .route("/activities", get(list_activities).post(create_activity))
        .route("/activities/{id}", get(get_activity).delete(remove_activity))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskListQuery {
    page: Option<i64>,
    page_size: Option<i64>,
    deal_id: Option<Uuid>,
    lead_id: Option<Uuid>,
    contact_id: Option<Uuid>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityListQuery {
    page: Option<i64>,
    page_size: Option<i64>,
    deal_id: Option<Uuid>,
    contact_id: Option<Uuid>,
    lead_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: Option<String>,
}

async fn list_tasks(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    QueryParams(query): QueryParams<TaskListQuery>,
) -> ApiResult<Json<PagedResult<TaskDto>>> {
    let params = PaginationParams::new(query.page, query.page_size);
    let filter = TaskQuery {
        deal_id: query.deal_id,
        lead_id: query.lead_id,
        contact_id: query.contact_id,
        status: query.status,
    };
    Ok(Json(tasks::list_paged(&state.db, &actor, params, filter).await?))
}

async fn get_task(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<TaskDto>> {
    Ok(Json(tasks::get(&state.db, &actor, id).await?))
}

async fn create_task(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonBody(input): JsonBody<TaskInput>,
) -> ApiResult<(StatusCode, Json<TaskDto>)> {
    let task = tasks::create(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<TaskInput>,
) -> ApiResult<Json<TaskDto>> {
    Ok(Json(tasks::update(&state.db, &actor, id, input).await?))
}

async fn update_status(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<StatusRequest>,
) -> ApiResult<Json<TaskDto>> {
    let status = input
        .status
        .ok_or_else(|| ApiError::InvalidInput("status is required".into()))?;
    Ok(Json(tasks::update_status(&state.db, &actor, id, &status).await?))
}

async fn remove_task(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    tasks::delete(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_activities(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    QueryParams(query): QueryParams<ActivityListQuery>,
) -> ApiResult<Json<PagedResult<ActivityDto>>> {
    let params = PaginationParams::new(query.page, query.page_size);
    let filter = ActivityFilter {
        deal_id: query.deal_id,
        contact_id: query.contact_id,
        lead_id: query.lead_id,
    };
    Ok(Json(activities::list_paged(&state.db, &actor, params, filter).await?))
}

async fn get_activity(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<ActivityDto>> {
    Ok(Json(activities::get(&state.db, &actor, id).await?))
}

async fn create_activity(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonBody(input): JsonBody<ActivityInput>,
) -> ApiResult<(StatusCode, Json<ActivityDto>)> {
    let activity = activities::create(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn remove_activity(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    activities::delete(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
