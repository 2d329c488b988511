use chrono::{DateTime, FixedOffset};
use entity::activities::{self, Kind};
use sea_orm::ActiveValue::Set;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CrmResult, DomainError};
use crate::paging::{PagedResult, PaginationParams};
use crate::repo::activities::ActivityFilter;
use crate::repo::{self, now};
use crate::scope::Actor;
use crate::validation::non_blank;

pub const SUBJECT_MAX_LEN: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDto {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub contact_id: Option<Uuid>,
    pub deal_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub user_id: Uuid,
    pub created_at: DateTime<FixedOffset>,
}

impl From<activities::Model> for ActivityDto {
    fn from(m: activities::Model) -> Self {
        Self {
            id: m.id,
            kind: m.kind.as_str(),
            subject: m.subject,
            body: m.body,
            contact_id: m.contact_id,
            deal_id: m.deal_id,
            lead_id: m.lead_id,
            user_id: m.user_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInput {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub contact_id: Option<Uuid>,
    pub deal_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
}

pub async fn list_paged(
    db: &DatabaseConnection,
    actor: &Actor,
    params: PaginationParams,
    filter: ActivityFilter,
) -> CrmResult<PagedResult<ActivityDto>> {
    let (items, total) = repo::activities::list_paged(db, actor, params, filter).await?;
    Ok(PagedResult::from_params(items, params, total).map(ActivityDto::from))
}

pub async fn get(
    db: &DatabaseConnection,
    actor: &Actor,
    activity_id: Uuid,
) -> CrmResult<ActivityDto> {
    repo::activities::find_visible(db, activity_id, actor)
        .await?
        .map(ActivityDto::from)
        .ok_or_else(|| DomainError::ActivityNotFound.into())
}

/// Logs a hand-written activity. Stage changes are recorded by the deal service only.
pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: ActivityInput,
) -> CrmResult<ActivityDto> {
    let kind = input
        .kind
        .as_deref()
        .and_then(Kind::parse_user_kind)
        .ok_or(DomainError::ActivityInvalidType)?;
    if input.contact_id.is_none() && input.deal_id.is_none() && input.lead_id.is_none() {
        return Err(DomainError::ActivityNoRelatedEntity.into());
    }
    let subject = non_blank(input.subject.as_deref());
    if subject.as_ref().is_some_and(|s| s.chars().count() > SUBJECT_MAX_LEN) {
        return Err(DomainError::Validation(format!(
            "Subject must be at most {SUBJECT_MAX_LEN} characters"
        ))
        .into());
    }

    let mut linked = true;
    if let Some(deal_id) = input.deal_id {
        linked &= repo::deals::find_visible(db, deal_id, actor).await?.is_some();
    }
    if let Some(contact_id) = input.contact_id {
        linked &= repo::contacts::find_visible(db, contact_id, actor).await?.is_some();
    }
    if let Some(lead_id) = input.lead_id {
        linked &= repo::leads::find_visible(db, lead_id, actor).await?.is_some();
    }
    if !linked {
        return Err(DomainError::ActivityRelatedEntityNotFound.into());
    }

    let model = activities::Model {
        id: Uuid::new_v4(),
        user_id: actor.user_id,
        organization_id: actor.org_id,
        kind,
        subject,
        body: non_blank(input.body.as_deref()),
        contact_id: input.contact_id,
        deal_id: input.deal_id,
        lead_id: input.lead_id,
        created_at: now(),
    };
    repo::activities::insert(
        db,
        activities::ActiveModel {
            id: Set(model.id),
            user_id: Set(model.user_id),
            organization_id: Set(model.organization_id),
            kind: Set(model.kind),
            subject: Set(model.subject.clone()),
            body: Set(model.body.clone()),
            contact_id: Set(model.contact_id),
            deal_id: Set(model.deal_id),
            lead_id: Set(model.lead_id),
            created_at: Set(model.created_at),
        },
    )
    .await?;
    Ok(model.into())
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, activity_id: Uuid) -> CrmResult<()> {
    if !repo::activities::delete_visible(db, activity_id, actor).await? {
        return Err(DomainError::ActivityNotFound.into());
    }
    Ok(())
}
