//! Organizations, membership, and the per-organization webhook key.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, FixedOffset};
use entity::memberships::{self, MemberRole};
use entity::orgs;
use rand::RngCore;
use rand::rngs::OsRng;
use sea_orm::ActiveValue::Set;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::pipelines;
use crate::error::{CrmResult, DomainError};
use crate::repo::{self, now};
use crate::validation::non_blank;

pub const DEFAULT_ORG_NAME: &str = "My Organization";
pub const NAME_MAX_LEN: usize = 200;
pub const WEBHOOK_URL: &str = "/api/webhook/leads";
pub const API_KEY_PREFIX: &str = "aci_";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDto {
    pub id: Uuid,
    pub name: String,
    pub owner_user_id: Uuid,
    pub role: &'static str,
    pub created_at: DateTime<FixedOffset>,
}

impl OrganizationDto {
    fn new(org: orgs::Model, role: MemberRole) -> Self {
        Self {
            id: org.id,
            name: org.name,
            owner_user_id: org.owner_user_id,
            role: role.as_str(),
            created_at: org.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub joined_at: DateTime<FixedOffset>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookInfo {
    pub webhook_url: &'static str,
    pub api_key: Option<String>,
    pub api_key_created_at: Option<DateTime<FixedOffset>>,
    pub has_api_key: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganization {
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMember {
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRole {
    pub role: Option<String>,
}

async fn require_role(
    db: &DatabaseConnection,
    user_id: Uuid,
    org_id: Uuid,
) -> CrmResult<(orgs::Model, MemberRole)> {
    let org = repo::orgs::find(db, org_id)
        .await?
        .ok_or(DomainError::OrganizationNotFound)?;
    let role = repo::orgs::member_role(db, org_id, user_id)
        .await?
        .ok_or(DomainError::NotMember)?;
    Ok((org, role))
}

async fn require_owner(
    db: &DatabaseConnection,
    user_id: Uuid,
    org_id: Uuid,
) -> CrmResult<orgs::Model> {
    let (org, role) = require_role(db, user_id, org_id).await?;
    if role != MemberRole::Owner {
        return Err(DomainError::NotOwner.into());
    }
    Ok(org)
}

/// Assignable roles: member or manager.
fn assignable_role(raw: Option<&str>, default: Option<MemberRole>) -> CrmResult<MemberRole> {
    let role = match non_blank(raw) {
        Some(raw) => MemberRole::parse(&raw).ok_or(DomainError::InvalidRole)?,
        None => default.ok_or(DomainError::InvalidRole)?,
    };
    if role == MemberRole::Owner {
        return Err(DomainError::CannotAssignOwner.into());
    }
    Ok(role)
}

/// `aci_` plus 32 random bytes, URL-safe base64 without padding.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    format!("{API_KEY_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

pub async fn list_mine(db: &DatabaseConnection, user_id: Uuid) -> CrmResult<Vec<OrganizationDto>> {
    let rows = repo::orgs::list_for_user(db, user_id).await?;
    Ok(rows
        .into_iter()
        .map(|(org, role)| OrganizationDto::new(org, role))
        .collect())
}

pub async fn get(
    db: &DatabaseConnection,
    user_id: Uuid,
    org_id: Uuid,
) -> CrmResult<OrganizationDto> {
    let (org, role) = require_role(db, user_id, org_id).await?;
    Ok(OrganizationDto::new(org, role))
}

/// New organization owned by the caller, seeded with a default sales pipeline.
pub async fn create(
    db: &DatabaseConnection,
    user_id: Uuid,
    input: CreateOrganization,
) -> CrmResult<OrganizationDto> {
    let name = non_blank(input.name.as_deref()).unwrap_or_else(|| DEFAULT_ORG_NAME.to_string());
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "Organization name must be at most {NAME_MAX_LEN} characters"
        ))
        .into());
    }
    if repo::users::find(db, user_id).await?.is_none() {
        return Err(DomainError::UserNotFound.into());
    }

    let created_at = now();
    let txn = db.begin().await?;
    let org = repo::orgs::insert(
        &txn,
        orgs::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            owner_user_id: Set(user_id),
            created_at: Set(created_at),
            webhook_api_key: Set(None),
            webhook_api_key_created_at: Set(None),
        },
    )
    .await?;
    repo::orgs::add_member(
        &txn,
        memberships::ActiveModel {
            organization_id: Set(org.id),
            user_id: Set(user_id),
            role: Set(MemberRole::Owner),
            joined_at: Set(created_at),
        },
    )
    .await?;
    let pipeline = pipelines::seed_default(&txn, org.id).await?;
    txn.commit().await?;

    info!(org_id = %org.id, owner = %user_id, pipeline_id = %pipeline.id, "organization created");
    Ok(OrganizationDto::new(org, MemberRole::Owner))
}

pub async fn members(
    db: &DatabaseConnection,
    user_id: Uuid,
    org_id: Uuid,
) -> CrmResult<Vec<MemberDto>> {
    require_role(db, user_id, org_id).await?;
    let memberships = repo::orgs::members(db, org_id).await?;
    let users = repo::users::find_many(db, memberships.iter().map(|m| m.user_id).collect()).await?;
    Ok(memberships
        .into_iter()
        .filter_map(|m| {
            let user = users.iter().find(|u| u.id == m.user_id)?;
            Some(MemberDto {
                user_id: m.user_id,
                name: user.name.clone(),
                email: user.email.clone(),
                role: m.role.as_str(),
                joined_at: m.joined_at,
            })
        })
        .collect())
}

pub async fn add_member(
    db: &DatabaseConnection,
    user_id: Uuid,
    org_id: Uuid,
    input: AddMember,
) -> CrmResult<MemberDto> {
    require_owner(db, user_id, org_id).await?;
    let role = assignable_role(input.role.as_deref(), Some(MemberRole::Member))?;
    let email = non_blank(input.email.as_deref()).ok_or(DomainError::EmailNotFound)?;
    let user = repo::users::find_by_email(db, &email)
        .await?
        .ok_or(DomainError::EmailNotFound)?;
    if repo::orgs::find_membership(db, org_id, user.id).await?.is_some() {
        return Err(DomainError::AlreadyMember.into());
    }
    let membership = repo::orgs::add_member(
        db,
        memberships::ActiveModel {
            organization_id: Set(org_id),
            user_id: Set(user.id),
            role: Set(role),
            joined_at: Set(now()),
        },
    )
    .await?;
    info!(org_id = %org_id, member = %user.id, role = role.as_str(), "member added");
    Ok(MemberDto {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: membership.role.as_str(),
        joined_at: membership.joined_at,
    })
}

pub async fn change_role(
    db: &DatabaseConnection,
    user_id: Uuid,
    org_id: Uuid,
    member_id: Uuid,
    input: ChangeRole,
) -> CrmResult<MemberDto> {
    let org = require_owner(db, user_id, org_id).await?;
    let role = assignable_role(input.role.as_deref(), None)?;
    let membership = repo::orgs::find_membership(db, org_id, member_id)
        .await?
        .ok_or(DomainError::MemberNotFound)?;
    if member_id == org.owner_user_id || membership.role == MemberRole::Owner {
        return Err(DomainError::CannotChangeOwnerRole.into());
    }
    let mut active: memberships::ActiveModel = membership.into();
    active.role = Set(role);
    let updated = repo::orgs::update_member(db, active).await?;
    let user = repo::users::find(db, member_id)
        .await?
        .ok_or(DomainError::MemberNotFound)?;
    info!(org_id = %org_id, member = %member_id, role = role.as_str(), "member role changed");
    Ok(MemberDto {
        user_id: member_id,
        name: user.name,
        email: user.email,
        role: updated.role.as_str(),
        joined_at: updated.joined_at,
    })
}

pub async fn remove_member(
    db: &DatabaseConnection,
    user_id: Uuid,
    org_id: Uuid,
    member_id: Uuid,
) -> CrmResult<()> {
    let org = require_owner(db, user_id, org_id).await?;
    let membership = repo::orgs::find_membership(db, org_id, member_id)
        .await?
        .ok_or(DomainError::MemberNotFound)?;
    if member_id == org.owner_user_id || membership.role == MemberRole::Owner {
        return Err(DomainError::CannotRemoveOwner.into());
    }
    repo::orgs::remove_member(db, org_id, member_id).await?;
    info!(org_id = %org_id, member = %member_id, "member removed");
    Ok(())
}

pub async fn webhook_info(
    db: &DatabaseConnection,
    user_id: Uuid,
    org_id: Uuid,
) -> CrmResult<WebhookInfo> {
    let (org, _) = require_role(db, user_id, org_id).await?;
    Ok(WebhookInfo {
        webhook_url: WEBHOOK_URL,
        has_api_key: org.webhook_api_key.is_some(),
        api_key: org.webhook_api_key,
        api_key_created_at: org.webhook_api_key_created_at,
    })
}

/// Replaces the webhook key; the previous key stops working immediately.
pub async fn regenerate_webhook_key(
    db: &DatabaseConnection,
    user_id: Uuid,
    org_id: Uuid,
) -> CrmResult<WebhookInfo> {
    let (org, role) = require_role(db, user_id, org_id).await?;
    if !role.can_edit_pipelines() {
        return Err(DomainError::NotOwnerOrManager.into());
    }
    let mut active: orgs::ActiveModel = org.into();
    active.webhook_api_key = Set(Some(generate_api_key()));
    active.webhook_api_key_created_at = Set(Some(now()));
    let org = repo::orgs::update(db, active).await?;
    info!(org_id = %org_id, by = %user_id, "webhook api key regenerated");
    Ok(WebhookInfo {
        webhook_url: WEBHOOK_URL,
        has_api_key: true,
        api_key: org.webhook_api_key,
        api_key_created_at: org.webhook_api_key_created_at,
    })
}
