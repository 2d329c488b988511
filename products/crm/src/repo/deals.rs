use std::collections::HashMap;

use entity::{activities, deals};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::{contains_ci, fetch_page};
use crate::paging::PaginationParams;
use crate::scope::{Actor, visible_to};

fn visible(actor: &Actor) -> Condition {
    visible_to(deals::Column::UserId, deals::Column::OrganizationId, actor)
}

fn matches(search: &str) -> Condition {
    Condition::any()
        .add(contains_ci(deals::Column::Name, search))
        .add(contains_ci(deals::Column::Value, search))
}

pub async fn find_visible<C: ConnectionTrait>(
    db: &C,
    deal_id: Uuid,
    actor: &Actor,
) -> Result<Option<deals::Model>, DbErr> {
    deals::Entity::find_by_id(deal_id)
        .filter(visible(actor))
        .one(db)
        .await
}

/// Newest first, optionally narrowed by a case-insensitive search on name or value.
pub async fn list_paged<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    params: PaginationParams,
    search: Option<&str>,
) -> Result<(Vec<deals::Model>, u64), DbErr> {
    let mut select = deals::Entity::find().filter(visible(actor));
    if let Some(q) = search.filter(|q| !q.trim().is_empty()) {
        select = select.filter(matches(q));
    }
    let select = select
        .order_by_desc(deals::Column::CreatedAt)
        .order_by_asc(deals::Column::Id);
    fetch_page(db, select, params).await
}

pub async fn search<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    query: &str,
    limit: u64,
) -> Result<Vec<deals::Model>, DbErr> {
    deals::Entity::find()
        .filter(visible(actor))
        .filter(matches(query))
        .order_by_asc(deals::Column::Name)
        .limit(limit)
        .all(db)
        .await
}

/// Every visible deal, for aggregate reports.
pub async fn all_visible<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
) -> Result<Vec<deals::Model>, DbErr> {
    deals::Entity::find().filter(visible(actor)).all(db).await
}

/// Visible deals placed in the pipeline, plus legacy deals that never got one.
pub async fn for_board<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    pipeline_id: Uuid,
) -> Result<Vec<deals::Model>, DbErr> {
    deals::Entity::find()
        .filter(visible(actor))
        .filter(
            Condition::any()
                .add(deals::Column::PipelineId.eq(pipeline_id))
                .add(deals::Column::PipelineId.is_null()),
        )
        .order_by_desc(deals::Column::CreatedAt)
        .all(db)
        .await
}

/// Every deal placed in the stage, regardless of owner.
pub async fn in_stage<C: ConnectionTrait>(
    db: &C,
    stage_id: Uuid,
) -> Result<Vec<deals::Model>, DbErr> {
    deals::Entity::find()
        .filter(deals::Column::DealStageId.eq(stage_id))
        .all(db)
        .await
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    model: deals::ActiveModel,
) -> Result<deals::Model, DbErr> {
    model.insert(db).await
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    model: deals::ActiveModel,
) -> Result<deals::Model, DbErr> {
    model.update(db).await
}

pub async fn delete_visible<C: ConnectionTrait>(
    db: &C,
    deal_id: Uuid,
    actor: &Actor,
) -> Result<bool, DbErr> {
    let res = deals::Entity::delete_many()
        .filter(deals::Column::Id.eq(deal_id))
        .filter(visible(actor))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

/// Latest activity timestamp per deal.
pub async fn last_activity_at<C: ConnectionTrait>(
    db: &C,
    deal_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, DateTimeWithTimeZone>, DbErr> {
    if deal_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Option<Uuid>, Option<DateTimeWithTimeZone>)> = activities::Entity::find()
        .select_only()
        .column(activities::Column::DealId)
        .column_as(Expr::col(activities::Column::CreatedAt).max(), "last_at")
        .filter(activities::Column::DealId.is_in(deal_ids))
        .group_by(activities::Column::DealId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(deal_id, at)| Some((deal_id?, at?)))
        .collect())
}
