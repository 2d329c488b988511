//! Use cases. Each function validates input, enforces ownership and role
//! rules, and maps entities to camelCase DTOs.

use entity::memberships::MemberRole;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::error::{CrmResult, DomainError};
use crate::repo;
use crate::scope::Actor;

pub mod activities;
pub mod auth;
pub mod board;
pub mod companies;
pub mod contacts;
pub mod deals;
pub mod leads;
pub mod orgs;
pub mod pipelines;
pub mod reporting;
pub mod search;
pub mod sequences;
pub mod tasks;
pub mod webhook;

/// Selected organization and the caller's role in it.
pub(crate) async fn require_member<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
) -> CrmResult<(Uuid, MemberRole)> {
    let org_id = actor.require_org()?;
    let role = repo::orgs::member_role(db, org_id, actor.user_id)
        .await?
        .ok_or(DomainError::NotMember)?;
    Ok((org_id, role))
}

/// Like [`require_member`], but only owners and managers pass.
pub(crate) async fn require_editor<C: ConnectionTrait>(db: &C, actor: &Actor) -> CrmResult<Uuid> {
    let (org_id, role) = require_member(db, actor).await?;
    if !role.can_edit_pipelines() {
        return Err(DomainError::NotOwnerOrManager.into());
    }
    Ok(org_id)
}
