use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "email_sequence_enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub sequence_id: Uuid,
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    pub contact_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub current_step: i32,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTimeWithTimeZone,
    pub last_sent_at: Option<DateTimeWithTimeZone>,
    pub next_send_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum EnrollmentStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "paused")]
    Paused,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "replied")]
    Replied,
    #[sea_orm(string_value = "unsubscribed")]
    Unsubscribed,
    #[sea_orm(string_value = "bounced")]
    Bounced,
}

impl EnrollmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Paused => "paused",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Replied => "replied",
            EnrollmentStatus::Unsubscribed => "unsubscribed",
            EnrollmentStatus::Bounced => "bounced",
        }
    }
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
