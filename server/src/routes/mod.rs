//! REST surface under `/api`. Handlers translate HTTP to crm service calls.

mod accounts;
mod auth;
mod copy;
mod deals;
mod leads;
mod orgs;
mod pipelines;
mod reporting;
mod sequences;
mod work;

#[cfg(test)]
mod tests;

use axum::Router;
use crm::PaginationParams;
use serde::Deserialize;

use crate::http::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(orgs::router())
        .merge(pipelines::router())
        .merge(deals::router())
        .merge(accounts::router())
        .merge(leads::router())
        .merge(work::router())
        .merge(sequences::router())
        .merge(reporting::router())
        .merge(copy::router())
}

/// `?page=&pageSize=&search=` shared by the paged list endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn params(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
