//! Dashboard numbers and the cross-entity search box.

use axum::{Json, Router, extract::State, routing::get};
use crm::service::{
    reporting::{self, DashboardStats},
    search::{self, GlobalSearchResult},
};
use platform_api::{ApiResult, QueryParams};
use serde::Deserialize;

use crate::{auth::RequestActor, http::AppState};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/reporting/dashboard", get(dashboard))
        .route("/search", get(global_search))
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

async fn dashboard(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(reporting::dashboard(&state.db, &actor).await?))
}

async fn global_search(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    QueryParams(query): QueryParams<SearchQuery>,
) -> ApiResult<Json<GlobalSearchResult>> {
    let q = query.q.unwrap_or_default();
    Ok(Json(search::global(&state.db, &actor, &q).await?))
}
