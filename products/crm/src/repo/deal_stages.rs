//! Stage rows are owned by a pipeline; every org-scoped read or write joins
//! through `pipelines` and treats a foreign stage as missing.

use entity::{deal_stages, pipelines};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use uuid::Uuid;

/// Partial update. `None` leaves the column untouched.
#[derive(Clone, Debug, Default)]
pub struct StagePatch {
    pub name: Option<String>,
    pub display_order: Option<i32>,
    pub is_won: Option<bool>,
    pub is_lost: Option<bool>,
}

/// Stages of one pipeline by display order, then name.
pub async fn stages_by_pipeline<C: ConnectionTrait>(
    db: &C,
    pipeline_id: Uuid,
) -> Result<Vec<deal_stages::Model>, DbErr> {
    deal_stages::Entity::find()
        .filter(deal_stages::Column::PipelineId.eq(pipeline_id))
        .order_by_asc(deal_stages::Column::DisplayOrder)
        .order_by_asc(deal_stages::Column::Name)
        .all(db)
        .await
}

pub async fn stages_for_pipelines<C: ConnectionTrait>(
    db: &C,
    pipeline_ids: Vec<Uuid>,
) -> Result<Vec<deal_stages::Model>, DbErr> {
    if pipeline_ids.is_empty() {
        return Ok(Vec::new());
    }
    deal_stages::Entity::find()
        .filter(deal_stages::Column::PipelineId.is_in(pipeline_ids))
        .order_by_asc(deal_stages::Column::DisplayOrder)
        .order_by_asc(deal_stages::Column::Name)
        .all(db)
        .await
}

pub async fn find_in_org<C: ConnectionTrait>(
    db: &C,
    stage_id: Uuid,
    org_id: Uuid,
) -> Result<Option<deal_stages::Model>, DbErr> {
    deal_stages::Entity::find_by_id(stage_id)
        .join(JoinType::InnerJoin, deal_stages::Relation::Pipeline.def())
        .filter(pipelines::Column::OrganizationId.eq(org_id))
        .one(db)
        .await
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    model: deal_stages::ActiveModel,
) -> Result<deal_stages::Model, DbErr> {
    model.insert(db).await
}

/// `None` when the stage is missing or its pipeline belongs to another organization.
pub async fn update_in_org<C: ConnectionTrait>(
    db: &C,
    stage_id: Uuid,
    org_id: Uuid,
    patch: StagePatch,
) -> Result<Option<deal_stages::Model>, DbErr> {
    let Some(existing) = find_in_org(db, stage_id, org_id).await? else {
        return Ok(None);
    };
    let mut active: deal_stages::ActiveModel = existing.into();
    if let Some(name) = patch.name {
        active.name = Set(name);
    }
    if let Some(order) = patch.display_order {
        active.display_order = Set(order);
    }
    if let Some(is_won) = patch.is_won {
        active.is_won = Set(is_won);
    }
    if let Some(is_lost) = patch.is_lost {
        active.is_lost = Set(is_lost);
    }
    active.update(db).await.map(Some)
}

/// `false` when the stage is missing or foreign; nothing is deleted then.
pub async fn delete_in_org<C: ConnectionTrait>(
    db: &C,
    stage_id: Uuid,
    org_id: Uuid,
) -> Result<bool, DbErr> {
    if find_in_org(db, stage_id, org_id).await?.is_none() {
        return Ok(false);
    }
    let res = deal_stages::Entity::delete_by_id(stage_id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

pub async fn max_display_order<C: ConnectionTrait>(
    db: &C,
    pipeline_id: Uuid,
) -> Result<i32, DbErr> {
    Ok(stages_by_pipeline(db, pipeline_id)
        .await?
        .iter()
        .map(|s| s.display_order)
        .max()
        .unwrap_or(-1))
}
