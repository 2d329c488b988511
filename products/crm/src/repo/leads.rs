use entity::leads;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use super::{contains_ci, fetch_page};
use crate::paging::PaginationParams;
use crate::scope::{Actor, visible_to};

fn visible(actor: &Actor) -> Condition {
    visible_to(leads::Column::UserId, leads::Column::OrganizationId, actor)
}

#[derive(Clone, Debug, Default)]
pub struct LeadFilter {
    pub search: Option<String>,
    pub status: Option<String>,
}

pub async fn find_visible<C: ConnectionTrait>(
    db: &C,
    lead_id: Uuid,
    actor: &Actor,
) -> Result<Option<leads::Model>, DbErr> {
    leads::Entity::find_by_id(lead_id)
        .filter(visible(actor))
        .one(db)
        .await
}

pub async fn count_visible<C: ConnectionTrait>(db: &C, actor: &Actor) -> Result<u64, DbErr> {
    leads::Entity::find().filter(visible(actor)).count(db).await
}

pub async fn list_paged<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    params: PaginationParams,
    filter: &LeadFilter,
) -> Result<(Vec<leads::Model>, u64), DbErr> {
    let mut select = leads::Entity::find().filter(visible(actor));
    if let Some(q) = filter.search.as_deref().filter(|q| !q.trim().is_empty()) {
        select = select.filter(
            Condition::any()
                .add(contains_ci(leads::Column::Name, q))
                .add(contains_ci(leads::Column::Email, q)),
        );
    }
    if let Some(status) = filter.status.as_deref().filter(|s| !s.trim().is_empty()) {
        select = select.filter(leads::Column::Status.eq(status.trim()));
    }
    fetch_page(db, select.order_by_desc(leads::Column::CreatedAt), params).await
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    model: leads::ActiveModel,
) -> Result<leads::Model, DbErr> {
    model.insert(db).await
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    model: leads::ActiveModel,
) -> Result<leads::Model, DbErr> {
    model.update(db).await
}

pub async fn delete_visible<C: ConnectionTrait>(
    db: &C,
    lead_id: Uuid,
    actor: &Actor,
) -> Result<bool, DbErr> {
    let res = leads::Entity::delete_many()
        .filter(leads::Column::Id.eq(lead_id))
        .filter(visible(actor))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}
