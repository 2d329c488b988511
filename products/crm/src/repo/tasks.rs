use entity::tasks::{self, Status};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::fetch_page;
use crate::paging::PaginationParams;
use crate::scope::{Actor, visible_to};

fn visible(actor: &Actor) -> Condition {
    visible_to(tasks::Column::UserId, tasks::Column::OrganizationId, actor)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TaskFilter {
    pub deal_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub status: Option<Status>,
}

pub async fn find_visible<C: ConnectionTrait>(
    db: &C,
    task_id: Uuid,
    actor: &Actor,
) -> Result<Option<tasks::Model>, DbErr> {
    tasks::Entity::find_by_id(task_id)
        .filter(visible(actor))
        .one(db)
        .await
}

/// By due date, then newest first.
pub async fn list_paged<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    params: PaginationParams,
    filter: TaskFilter,
) -> Result<(Vec<tasks::Model>, u64), DbErr> {
    let mut select = tasks::Entity::find().filter(visible(actor));
    if let Some(deal_id) = filter.deal_id {
        select = select.filter(tasks::Column::DealId.eq(deal_id));
    }
    if let Some(lead_id) = filter.lead_id {
        select = select.filter(tasks::Column::LeadId.eq(lead_id));
    }
    if let Some(contact_id) = filter.contact_id {
        select = select.filter(tasks::Column::ContactId.eq(contact_id));
    }
    if let Some(status) = filter.status {
        select = select.filter(tasks::Column::Status.eq(status));
    }
    let select = select
        .order_by_asc(tasks::Column::DueAt)
        .order_by_desc(tasks::Column::CreatedAt);
    fetch_page(db, select, params).await
}

/// Open tasks whose reminder time has passed and that were not yet reminded.
pub async fn due_reminders<C: ConnectionTrait>(
    db: &C,
    now: DateTimeWithTimeZone,
    limit: u64,
) -> Result<Vec<tasks::Model>, DbErr> {
    tasks::Entity::find()
        .filter(tasks::Column::ReminderAt.lte(now))
        .filter(tasks::Column::ReminderSentAt.is_null())
        .filter(tasks::Column::Status.is_not_in([Status::Completed, Status::Cancelled]))
        .order_by_asc(tasks::Column::ReminderAt)
        .limit(limit)
        .all(db)
        .await
}

/// Stamps `reminder_sent_at` unless another pass got there first.
pub async fn mark_reminded<C: ConnectionTrait>(
    db: &C,
    task_id: Uuid,
    at: DateTimeWithTimeZone,
) -> Result<bool, DbErr> {
    let res = tasks::Entity::update_many()
        .col_expr(tasks::Column::ReminderSentAt, Expr::value(at))
        .filter(tasks::Column::Id.eq(task_id))
        .filter(tasks::Column::ReminderSentAt.is_null())
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    model: tasks::ActiveModel,
) -> Result<tasks::Model, DbErr> {
    model.insert(db).await
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    model: tasks::ActiveModel,
) -> Result<tasks::Model, DbErr> {
    model.update(db).await
}

pub async fn delete_visible<C: ConnectionTrait>(
    db: &C,
    task_id: Uuid,
    actor: &Actor,
) -> Result<bool, DbErr> {
    let res = tasks::Entity::delete_many()
        .filter(tasks::Column::Id.eq(task_id))
        .filter(visible(actor))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}
