use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use crm::{
    PagedResult, PaginationParams,
    repo::leads::LeadFilter,
    service::{
        leads::{self, ConvertLead, ConvertedLead, LeadDto, LeadInput},
        webhook::{self, WebhookLead, WebhookLeadCreated},
    },
};
use platform_api::{ApiResult, JsonBody, PathParam, QueryParams};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{API_KEY_HEADER, RequestActor},
    http::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list).post(create))
        .route("/leads/{id}", get(get_one).put(update).delete(remove))
        .route("/leads/{id}/convert", post(convert))
        .route("/webhook/leads", post(ingest))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeadQuery {
    page: Option<i64>,
    page_size: Option<i64>,
    search: Option<String>,
    status: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    QueryParams(query): QueryParams<LeadQuery>,
) -> ApiResult<Json<PagedResult<LeadDto>>> {
    let params = PaginationParams::new(query.page, query.page_size);
    let filter = LeadFilter {
        search: query.search,
        status: query.status,
    };
    Ok(Json(leads::list_paged(&state.db, &actor, params, &filter).await?))
}

async fn get_one(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<LeadDto>> {
    Ok(Json(leads::get(&state.db, &actor, id).await?))
}

async fn create(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonBody(input): JsonBody<LeadInput>,
) -> ApiResult<(StatusCode, Json<LeadDto>)> {
    let lead = leads::create(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

async fn update(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<LeadInput>,
) -> ApiResult<Json<LeadDto>> {
    Ok(Json(leads::update(&state.db, &actor, id, input).await?))
}

async fn remove(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    leads::delete(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn convert(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<ConvertLead>,
) -> ApiResult<Json<ConvertedLead>> {
    Ok(Json(leads::convert(&state.db, &actor, id, input).await?))
}

/// Authenticated by `X-Api-Key` only; the organization comes from the key.
async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<WebhookLead>,
) -> ApiResult<(StatusCode, Json<WebhookLeadCreated>)> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    let created = webhook::ingest_lead(&state.db, api_key, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
