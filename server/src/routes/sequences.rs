use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
};
use crm::service::sequences::{
    self, EnrollInput, EnrollmentDto, SequenceDetail, SequenceDto, SequenceInput, StepDto,
    StepInput,
};
use platform_api::{ApiResult, JsonBody, PathParam};
use uuid::Uuid;

use crate::{auth::RequestActor, http::AppState};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/sequences", get(list).post(create))
        .route("/sequences/{id}", get(get_one).put(update).delete(remove))
        .route("/sequences/{id}/steps", post(add_step))
        .route("/sequences/{id}/steps/{step_id}", delete(remove_step))
        .route("/sequences/{id}/enrollments", post(enroll))
        .route("/sequences/{id}/enrollments/{enrollment_id}", delete(unenroll))
        .route("/sequences/{id}/enrollments/{enrollment_id}/pause", post(pause))
        .route("/sequences/{id}/enrollments/{enrollment_id}/resume", post(resume))
}

async fn list(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
) -> ApiResult<Json<Vec<SequenceDto>>> {
    Ok(Json(sequences::list(&state.db, &actor).await?))
}

async fn get_one(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<SequenceDetail>> {
    Ok(Json(sequences::get(&state.db, &actor, id).await?))
}

async fn create(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonBody(input): JsonBody<SequenceInput>,
) -> ApiResult<(StatusCode, Json<SequenceDto>)> {
    let sequence = sequences::create(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(sequence)))
}

async fn update(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<SequenceInput>,
) -> ApiResult<Json<SequenceDto>> {
    Ok(Json(sequences::update(&state.db, &actor, id, input).await?))
}

async fn remove(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    sequences::delete(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_step(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<StepInput>,
) -> ApiResult<(StatusCode, Json<StepDto>)> {
    let step = sequences::add_step(&state.db, &actor, id, input).await?;
    Ok((StatusCode::CREATED, Json(step)))
}

async fn remove_step(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam((id, step_id)): PathParam<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    sequences::remove_step(&state.db, &actor, id, step_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn enroll(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<EnrollInput>,
) -> ApiResult<(StatusCode, Json<EnrollmentDto>)> {
    let enrollment = sequences::enroll(&state.db, &actor, id, input).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

async fn pause(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam((id, enrollment_id)): PathParam<(Uuid, Uuid)>,
) -> ApiResult<Json<EnrollmentDto>> {
    Ok(Json(sequences::pause(&state.db, &actor, id, enrollment_id).await?))
}

async fn resume(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam((id, enrollment_id)): PathParam<(Uuid, Uuid)>,
) -> ApiResult<Json<EnrollmentDto>> {
    Ok(Json(sequences::resume(&state.db, &actor, id, enrollment_id).await?))
}

async fn unenroll(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam((id, enrollment_id)): PathParam<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    sequences::unenroll(&state.db, &actor, id, enrollment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
