use entity::companies;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use super::{contains_ci, fetch_page};
use crate::paging::PaginationParams;
use crate::scope::{Actor, visible_to};

fn visible(actor: &Actor) -> Condition {
    visible_to(companies::Column::UserId, companies::Column::OrganizationId, actor)
}

pub async fn find_visible<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    actor: &Actor,
) -> Result<Option<companies::Model>, DbErr> {
    companies::Entity::find_by_id(company_id)
        .filter(visible(actor))
        .one(db)
        .await
}

/// Case-insensitive exact name match inside the caller's scope.
pub async fn find_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
    actor: &Actor,
) -> Result<Option<companies::Model>, DbErr> {
    companies::Entity::find()
        .filter(visible(actor))
        .filter(
            Expr::expr(Func::lower(Expr::col(companies::Column::Name)))
                .eq(name.trim().to_lowercase()),
        )
        .one(db)
        .await
}

pub async fn list_paged<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    params: PaginationParams,
    search: Option<&str>,
) -> Result<(Vec<companies::Model>, u64), DbErr> {
    let mut select = companies::Entity::find().filter(visible(actor));
    if let Some(q) = search.filter(|q| !q.trim().is_empty()) {
        select = select.filter(
            Condition::any()
                .add(contains_ci(companies::Column::Name, q))
                .add(contains_ci(companies::Column::Domain, q))
                .add(contains_ci(companies::Column::Industry, q)),
        );
    }
    fetch_page(db, select.order_by_asc(companies::Column::Name), params).await
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    model: companies::ActiveModel,
) -> Result<companies::Model, DbErr> {
    model.insert(db).await
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    model: companies::ActiveModel,
) -> Result<companies::Model, DbErr> {
    model.update(db).await
}

pub async fn delete_visible<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    actor: &Actor,
) -> Result<bool, DbErr> {
    let res = companies::Entity::delete_many()
        .filter(companies::Column::Id.eq(company_id))
        .filter(visible(actor))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}
