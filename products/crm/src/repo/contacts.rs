use entity::contacts;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use super::{contains_ci, fetch_page};
use crate::paging::PaginationParams;
use crate::scope::{Actor, visible_to};

fn visible(actor: &Actor) -> Condition {
    visible_to(contacts::Column::UserId, contacts::Column::OrganizationId, actor)
}

pub async fn find_visible<C: ConnectionTrait>(
    db: &C,
    contact_id: Uuid,
    actor: &Actor,
) -> Result<Option<contacts::Model>, DbErr> {
    contacts::Entity::find_by_id(contact_id)
        .filter(visible(actor))
        .one(db)
        .await
}

pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
    actor: &Actor,
) -> Result<Option<contacts::Model>, DbErr> {
    contacts::Entity::find()
        .filter(visible(actor))
        .filter(contacts::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
}

pub async fn list_paged<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    params: PaginationParams,
    search: Option<&str>,
) -> Result<(Vec<contacts::Model>, u64), DbErr> {
    let mut select = contacts::Entity::find().filter(visible(actor));
    if let Some(q) = search.filter(|q| !q.trim().is_empty()) {
        select = select.filter(
            Condition::any()
                .add(contains_ci(contacts::Column::Name, q))
                .add(contains_ci(contacts::Column::Email, q))
                .add(contains_ci(contacts::Column::JobTitle, q)),
        );
    }
    fetch_page(db, select.order_by_asc(contacts::Column::Name), params).await
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    model: contacts::ActiveModel,
) -> Result<contacts::Model, DbErr> {
    model.insert(db).await
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    model: contacts::ActiveModel,
) -> Result<contacts::Model, DbErr> {
    model.update(db).await
}

pub async fn delete_visible<C: ConnectionTrait>(
    db: &C,
    contact_id: Uuid,
    actor: &Actor,
) -> Result<bool, DbErr> {
    let res = contacts::Entity::delete_many()
        .filter(contacts::Column::Id.eq(contact_id))
        .filter(visible(actor))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}
