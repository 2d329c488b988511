//! Companies and contacts.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use crm::{
    PagedResult,
    service::{
        companies::{self, CompanyDto, CompanyInput},
        contacts::{self, ContactDto, ContactInput},
    },
};
use platform_api::{ApiResult, JsonBody, PathParam, QueryParams};
use uuid::Uuid;

use super::ListQuery;
use crate::{auth::RequestActor, http::AppState};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list_companies).post(create_company))
        .route("/companies/{id}", get(get_company).put(update_company).delete(remove_company))
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/{id}", get(get_contact).put(update_contact).delete(remove_contact))
}

async fn list_companies(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<PagedResult<CompanyDto>>> {
    let page = companies::list_paged(&state.db, &actor, query.params(), query.search()).await?;
    Ok(Json(page))
}

async fn get_company(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<CompanyDto>> {
    Ok(Json(companies::get(&state.db, &actor, id).await?))
}

async fn create_company(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonBody(input): JsonBody<CompanyInput>,
) -> ApiResult<(StatusCode, Json<CompanyDto>)> {
    let company = companies::create(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

async fn update_company(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<CompanyInput>,
) -> ApiResult<Json<CompanyDto>> {
    Ok(Json(companies::update(&state.db, &actor, id, input).await?))
}

async fn remove_company(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    companies::delete(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_contacts(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<PagedResult<ContactDto>>> {
    let page = contacts::list_paged(&state.db, &actor, query.params(), query.search()).await?;
    Ok(Json(page))
}

async fn get_contact(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<ContactDto>> {
    Ok(Json(contacts::get(&state.db, &actor, id).await?))
}

async fn create_contact(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonBody(input): JsonBody<ContactInput>,
) -> ApiResult<(StatusCode, Json<ContactDto>)> {
    let contact = contacts::create(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn update_contact(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<ContactInput>,
) -> ApiResult<Json<ContactDto>> {
    Ok(Json(contacts::update(&state.db, &actor, id, input).await?))
}

async fn remove_contact(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    contacts::delete(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
