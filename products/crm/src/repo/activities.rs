use entity::activities;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use super::fetch_page;
use crate::paging::PaginationParams;
use crate::scope::{Actor, visible_to};

fn visible(actor: &Actor) -> Condition {
    visible_to(activities::Column::UserId, activities::Column::OrganizationId, actor)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ActivityFilter {
    pub deal_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
}

pub async fn find_visible<C: ConnectionTrait>(
    db: &C,
    activity_id: Uuid,
    actor: &Actor,
) -> Result<Option<activities::Model>, DbErr> {
    activities::Entity::find_by_id(activity_id)
        .filter(visible(actor))
        .one(db)
        .await
}

/// Newest first.
pub async fn list_paged<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    params: PaginationParams,
    filter: ActivityFilter,
) -> Result<(Vec<activities::Model>, u64), DbErr> {
    let mut select = activities::Entity::find().filter(visible(actor));
    if let Some(deal_id) = filter.deal_id {
        select = select.filter(activities::Column::DealId.eq(deal_id));
    }
    if let Some(contact_id) = filter.contact_id {
        select = select.filter(activities::Column::ContactId.eq(contact_id));
    }
    if let Some(lead_id) = filter.lead_id {
        select = select.filter(activities::Column::LeadId.eq(lead_id));
    }
    fetch_page(db, select.order_by_desc(activities::Column::CreatedAt), params).await
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    model: activities::ActiveModel,
) -> Result<(), DbErr> {
    activities::Entity::insert(model)
        .exec_without_returning(db)
        .await
        .map(|_| ())
}

pub async fn delete_visible<C: ConnectionTrait>(
    db: &C,
    activity_id: Uuid,
    actor: &Actor,
) -> Result<bool, DbErr> {
    let res = activities::Entity::delete_many()
        .filter(activities::Column::Id.eq(activity_id))
        .filter(visible(actor))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}
