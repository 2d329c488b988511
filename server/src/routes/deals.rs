use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use crm::{
    PagedResult,
    service::deals::{self, CreateDeal, DealDto, StageChangeDto, UpdateDeal},
};
use platform_api::{ApiResult, JsonBody, PathParam, QueryParams};
use serde::Deserialize;
use uuid::Uuid;

use super::ListQuery;
use crate::{auth::RequestActor, http::AppState};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/deals", get(list).post(create))
        .route("/deals/search", get(search))
        .route("/deals/{id}", get(get_one).put(update).delete(remove))
        .route("/deals/{id}/stage", put(change_stage))
        .route("/deals/{id}/stage-history", get(stage_history))
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeStageRequest {
    deal_stage_id: Uuid,
}

async fn list(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<PagedResult<DealDto>>> {
    let page = deals::list_paged(&state.db, &actor, query.params(), query.search()).await?;
    Ok(Json(page))
}

async fn search(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    QueryParams(query): QueryParams<SearchQuery>,
) -> ApiResult<Json<Vec<DealDto>>> {
    let q = query.q.unwrap_or_default();
    Ok(Json(deals::search(&state.db, &actor, q.trim()).await?))
}

async fn get_one(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<DealDto>> {
    Ok(Json(deals::get(&state.db, &actor, id).await?))
}

async fn create(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonBody(input): JsonBody<CreateDeal>,
) -> ApiResult<(StatusCode, Json<DealDto>)> {
    let deal = deals::create(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(deal)))
}

async fn update(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<UpdateDeal>,
) -> ApiResult<Json<DealDto>> {
    Ok(Json(deals::update(&state.db, &actor, id, input).await?))
}

async fn remove(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    deals::delete(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_stage(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<ChangeStageRequest>,
) -> ApiResult<Json<DealDto>> {
    let deal = deals::change_stage(&state.db, &actor, id, input.deal_stage_id).await?;
    Ok(Json(deal))
}

async fn stage_history(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<Vec<StageChangeDto>>> {
    Ok(Json(deals::stage_history(&state.db, &actor, id).await?))
}
