use sea_orm::entity::prelude::*;

/// A sales opportunity owned by one user and optionally scoped to one organization.
///
/// `value` is stored as the caller typed it (for example `"$12,500"`). `stage` is the legacy
/// free-text stage name kept alongside `deal_stage_id` for boards that predate configured stages.
/// `is_won` is tri-state: `None` while open.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    #[sea_orm(indexed)]
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub value: String,
    pub currency: Option<String>,
    pub stage: Option<String>,
    #[sea_orm(indexed)]
    pub pipeline_id: Option<Uuid>,
    #[sea_orm(indexed)]
    pub deal_stage_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub expected_close_date: Option<DateTimeWithTimeZone>,
    pub is_won: Option<bool>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub updated_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pipelines::Entity",
        from = "Column::PipelineId",
        to = "super::pipelines::Column::Id",
        on_delete = "SetNull"
    )]
    Pipeline,
    #[sea_orm(
        belongs_to = "super::deal_stages::Entity",
        from = "Column::DealStageId",
        to = "super::deal_stages::Column::Id",
        on_delete = "SetNull"
    )]
    DealStage,
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id",
        on_delete = "SetNull"
    )]
    Company,
    #[sea_orm(has_many = "super::deal_stage_changes::Entity")]
    StageChanges,
}

impl Related<super::pipelines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pipeline.def()
    }
}

impl Related<super::deal_stages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DealStage.def()
    }
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::deal_stage_changes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StageChanges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
