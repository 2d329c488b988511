use entity::{deals, pipelines};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

pub async fn list_for_org<C: ConnectionTrait>(
    db: &C,
    org_id: Uuid,
) -> Result<Vec<pipelines::Model>, DbErr> {
    pipelines::Entity::find()
        .filter(pipelines::Column::OrganizationId.eq(org_id))
        .order_by_asc(pipelines::Column::DisplayOrder)
        .order_by_asc(pipelines::Column::Name)
        .all(db)
        .await
}

/// `None` when the pipeline does not exist or belongs to another organization.
pub async fn find_in_org<C: ConnectionTrait>(
    db: &C,
    pipeline_id: Uuid,
    org_id: Uuid,
) -> Result<Option<pipelines::Model>, DbErr> {
    pipelines::Entity::find_by_id(pipeline_id)
        .filter(pipelines::Column::OrganizationId.eq(org_id))
        .one(db)
        .await
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    model: pipelines::ActiveModel,
) -> Result<pipelines::Model, DbErr> {
    model.insert(db).await
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    model: pipelines::ActiveModel,
) -> Result<pipelines::Model, DbErr> {
    model.update(db).await
}

pub async fn delete_in_org<C: ConnectionTrait>(
    db: &C,
    pipeline_id: Uuid,
    org_id: Uuid,
) -> Result<bool, DbErr> {
    let res = pipelines::Entity::delete_many()
        .filter(pipelines::Column::Id.eq(pipeline_id))
        .filter(pipelines::Column::OrganizationId.eq(org_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

pub async fn count_deals<C: ConnectionTrait>(db: &C, pipeline_id: Uuid) -> Result<u64, DbErr> {
    deals::Entity::find()
        .filter(deals::Column::PipelineId.eq(pipeline_id))
        .count(db)
        .await
}

pub async fn max_display_order<C: ConnectionTrait>(db: &C, org_id: Uuid) -> Result<i32, DbErr> {
    Ok(list_for_org(db, org_id)
        .await?
        .iter()
        .map(|p| p.display_order)
        .max()
        .unwrap_or(-1))
}
