use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use crm::service::{
    board::{self, Board},
    pipelines::{
        self, CreateDealStage, CreatePipeline, DealStageDto, PipelineDto, UpdateDealStage,
        UpdatePipeline,
    },
};
use platform_api::{ApiResult, JsonBody, PathParam};
use uuid::Uuid;

use crate::{auth::RequestActor, http::AppState};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/pipelines", get(list).post(create))
        .route("/pipelines/{id}", get(get_one).put(update).delete(remove))
        .route("/pipelines/{id}/stages", get(stages))
        .route("/pipelines/{id}/board", get(board_view))
        .route("/dealstages", post(create_stage))
        .route("/dealstages/{id}", get(get_stage).put(update_stage).delete(remove_stage))
}

async fn list(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
) -> ApiResult<Json<Vec<PipelineDto>>> {
    Ok(Json(pipelines::list(&state.db, &actor).await?))
}

async fn get_one(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<PipelineDto>> {
    Ok(Json(pipelines::get(&state.db, &actor, id).await?))
}

async fn create(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonBody(input): JsonBody<CreatePipeline>,
) -> ApiResult<(StatusCode, Json<PipelineDto>)> {
    let pipeline = pipelines::create(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(pipeline)))
}

async fn update(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<UpdatePipeline>,
) -> ApiResult<Json<PipelineDto>> {
    Ok(Json(pipelines::update(&state.db, &actor, id, input).await?))
}

async fn remove(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    pipelines::delete(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stages(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<Vec<DealStageDto>>> {
    Ok(Json(pipelines::list_stages(&state.db, &actor, id).await?))
}

async fn board_view(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<Board>> {
    Ok(Json(board::board(&state.db, &actor, id).await?))
}

async fn get_stage(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<DealStageDto>> {
    Ok(Json(pipelines::get_stage(&state.db, &actor, id).await?))
}

async fn create_stage(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonBody(input): JsonBody<CreateDealStage>,
) -> ApiResult<(StatusCode, Json<DealStageDto>)> {
    let stage = pipelines::create_stage(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(stage)))
}

async fn update_stage(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<UpdateDealStage>,
) -> ApiResult<Json<DealStageDto>> {
    Ok(Json(pipelines::update_stage(&state.db, &actor, id, input).await?))
}

async fn remove_stage(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    pipelines::delete_stage(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
