use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    #[sea_orm(indexed)]
    pub organization_id: Option<Uuid>,
    pub kind: Kind,
    pub subject: Option<String>,
    pub body: Option<String>,
    #[sea_orm(indexed)]
    pub contact_id: Option<Uuid>,
    #[sea_orm(indexed)]
    pub deal_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Kind {
    #[sea_orm(string_value = "call")]
    Call,
    #[sea_orm(string_value = "meeting")]
    Meeting,
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "note")]
    Note,
    #[sea_orm(string_value = "task")]
    Task,
    #[sea_orm(string_value = "follow_up")]
    FollowUp,
    #[sea_orm(string_value = "deadline")]
    Deadline,
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "demo")]
    Demo,
    /// Written by the stage move, never accepted from clients.
    #[sea_orm(string_value = "stage_change")]
    StageChange,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Call => "call",
            Kind::Meeting => "meeting",
            Kind::Email => "email",
            Kind::Note => "note",
            Kind::Task => "task",
            Kind::FollowUp => "follow_up",
            Kind::Deadline => "deadline",
            Kind::Video => "video",
            Kind::Demo => "demo",
            Kind::StageChange => "stage_change",
        }
    }

    /// Parses a kind a user may log by hand.
    pub fn parse_user_kind(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "call" => Some(Kind::Call),
            "meeting" => Some(Kind::Meeting),
            "email" => Some(Kind::Email),
            "note" => Some(Kind::Note),
            "task" => Some(Kind::Task),
            "follow_up" | "followup" => Some(Kind::FollowUp),
            "deadline" => Some(Kind::Deadline),
            "video" => Some(Kind::Video),
            "demo" => Some(Kind::Demo),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::deals::Entity",
        from = "Column::DealId",
        to = "super::deals::Column::Id",
        on_delete = "SetNull"
    )]
    Deal,
}

impl Related<super::deals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
