use sea_orm::entity::prelude::*;

use crate::{orgs, users};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "memberships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub organization_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTimeWithTimeZone,
}

/// Role inside one organization. Managers may edit pipelines but not membership.
#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum MemberRole {
    #[sea_orm(string_value = "owner")]
    Owner,
    #[sea_orm(string_value = "member")]
    Member,
    #[sea_orm(string_value = "manager")]
    Manager,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Member => "member",
            MemberRole::Manager => "manager",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Some(MemberRole::Owner),
            "member" => Some(MemberRole::Member),
            "manager" => Some(MemberRole::Manager),
            _ => None,
        }
    }

    pub fn can_edit_pipelines(self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Manager)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "orgs::Entity",
        from = "Column::OrganizationId",
        to = "orgs::Column::Id",
        on_delete = "Cascade"
    )]
    Org,
    #[sea_orm(
        belongs_to = "users::Entity",
        from = "Column::UserId",
        to = "users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<orgs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Org.def()
    }
}

impl Related<users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
