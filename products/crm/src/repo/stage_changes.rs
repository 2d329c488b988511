use entity::deal_stage_changes;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

/// Append-only: rows are inserted, never updated.
pub async fn append<C: ConnectionTrait>(
    db: &C,
    change: deal_stage_changes::ActiveModel,
) -> Result<(), DbErr> {
    deal_stage_changes::Entity::insert(change)
        .exec_without_returning(db)
        .await
        .map(|_| ())
}

/// Newest first.
pub async fn history<C: ConnectionTrait>(
    db: &C,
    deal_id: Uuid,
) -> Result<Vec<deal_stage_changes::Model>, DbErr> {
    deal_stage_changes::Entity::find()
        .filter(deal_stage_changes::Column::DealId.eq(deal_id))
        .order_by_desc(deal_stage_changes::Column::ChangedAt)
        .all(db)
        .await
}
