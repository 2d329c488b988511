use sea_orm::entity::prelude::*;

/// Append-only audit row written on every stage reassignment. Names are copied so history
/// survives stage renames and deletions.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "deal_stage_changes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub deal_id: Uuid,
    pub from_deal_stage_id: Option<Uuid>,
    pub from_stage_name: Option<String>,
    pub to_deal_stage_id: Option<Uuid>,
    pub to_stage_name: Option<String>,
    pub changed_by_user_id: Uuid,
    pub changed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::deals::Entity",
        from = "Column::DealId",
        to = "super::deals::Column::Id",
        on_delete = "Cascade"
    )]
    Deal,
}

impl Related<super::deals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
