//! Narrow query functions per aggregate. Every function takes any
//! `ConnectionTrait`, so callers can pass a pool or an open transaction.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait,
    QuerySelect, Select,
};

use crate::paging::PaginationParams;

pub mod activities;
pub mod companies;
pub mod contacts;
pub mod deal_stages;
pub mod deals;
pub mod leads;
pub mod orgs;
pub mod pipelines;
pub mod sequences;
pub mod stage_changes;
pub mod tasks;
pub mod users;

pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

/// Case-insensitive substring match.
pub(crate) fn contains_ci<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", needle.trim().to_lowercase());
    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}

/// One page of `select` plus the unpaged row count.
pub(crate) async fn fetch_page<C, E>(
    db: &C,
    select: Select<E>,
    params: PaginationParams,
) -> Result<(Vec<E::Model>, u64), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    let total = select.clone().count(db).await?;
    let items = select
        .offset(params.skip())
        .limit(params.page_size())
        .all(db)
        .await?;
    Ok((items, total))
}
