use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "email_sequence_steps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub sequence_id: Uuid,
    pub step_order: i32,
    pub subject: String,
    pub body: String,
    pub copy_type: String,
    pub delay_days: i32,
    pub delay_hours: i32,
    pub stop_on_reply: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::email_sequences::Entity",
        from = "Column::SequenceId",
        to = "super::email_sequences::Column::Id",
        on_delete = "Cascade"
    )]
    Sequence,
}

impl Related<super::email_sequences::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sequence.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
