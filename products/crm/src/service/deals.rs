//! Deals and their stage placement.
//!
//! Every reassignment of `deal_stage_id` runs through [`apply_stage`] inside a
//! transaction, which appends the audit row and the `stage_change` activity.

use chrono::{DateTime, FixedOffset};
use entity::activities::{self, Kind};
use entity::{deal_stage_changes, deal_stages, deals};
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use super::require_member;
use crate::error::{CrmResult, DomainError};
use crate::paging::{PagedResult, PaginationParams};
use crate::repo::{self, now};
use crate::scope::Actor;
use crate::validation::{non_blank, parse_money};

pub const NAME_MAX_LEN: usize = 512;
pub const CURRENCY_MAX_LEN: usize = 8;
pub const SEARCH_LIMIT: u64 = 20;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDto {
    pub id: Uuid,
    pub name: String,
    pub value: String,
    pub currency: Option<String>,
    pub stage: Option<String>,
    pub pipeline_id: Option<Uuid>,
    pub deal_stage_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub expected_close_date: Option<DateTime<FixedOffset>>,
    pub is_won: Option<bool>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub last_activity_at: Option<DateTime<FixedOffset>>,
}

impl From<deals::Model> for DealDto {
    fn from(m: deals::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            value: m.value,
            currency: m.currency,
            stage: m.stage,
            pipeline_id: m.pipeline_id,
            deal_stage_id: m.deal_stage_id,
            company_id: m.company_id,
            contact_id: m.contact_id,
            assignee_id: m.assignee_id,
            expected_close_date: m.expected_close_date,
            is_won: m.is_won,
            created_at: m.created_at,
            updated_at: m.updated_at,
            last_activity_at: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageChangeDto {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub from_deal_stage_id: Option<Uuid>,
    pub from_stage_name: Option<String>,
    pub to_deal_stage_id: Option<Uuid>,
    pub to_stage_name: Option<String>,
    pub changed_by_user_id: Uuid,
    pub changed_at: DateTime<FixedOffset>,
}

impl From<deal_stage_changes::Model> for StageChangeDto {
    fn from(m: deal_stage_changes::Model) -> Self {
        Self {
            id: m.id,
            deal_id: m.deal_id,
            from_deal_stage_id: m.from_deal_stage_id,
            from_stage_name: m.from_stage_name,
            to_deal_stage_id: m.to_deal_stage_id,
            to_stage_name: m.to_stage_name,
            changed_by_user_id: m.changed_by_user_id,
            changed_at: m.changed_at,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeal {
    pub name: Option<String>,
    pub value: Option<String>,
    pub currency: Option<String>,
    pub stage: Option<String>,
    pub pipeline_id: Option<Uuid>,
    pub deal_stage_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub expected_close_date: Option<DateTime<FixedOffset>>,
}

/// Partial update; absent fields keep their value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeal {
    pub name: Option<String>,
    pub value: Option<String>,
    pub currency: Option<String>,
    pub stage: Option<String>,
    pub pipeline_id: Option<Uuid>,
    pub deal_stage_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub expected_close_date: Option<DateTime<FixedOffset>>,
}

fn deal_name(raw: Option<&str>) -> CrmResult<String> {
    let name = non_blank(raw).ok_or(DomainError::DealNameRequired)?;
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "Deal name must be at most {NAME_MAX_LEN} characters"
        ))
        .into());
    }
    Ok(name)
}

fn deal_value(raw: Option<&str>) -> CrmResult<String> {
    let value = non_blank(raw).ok_or(DomainError::DealValueRequired)?;
    if parse_money(&value).is_none() {
        return Err(DomainError::DealValueInvalid.into());
    }
    Ok(value)
}

fn currency(raw: Option<&str>) -> CrmResult<Option<String>> {
    let Some(code) = non_blank(raw) else {
        return Ok(None);
    };
    if code.chars().count() > CURRENCY_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "Currency must be at most {CURRENCY_MAX_LEN} characters"
        ))
        .into());
    }
    Ok(Some(code.to_uppercase()))
}

/// Won stages close a deal as won, lost stages as lost; open stages clear the flag.
fn outcome(stage: &deal_stages::Model) -> Option<bool> {
    if stage.is_won {
        Some(true)
    } else if stage.is_lost {
        Some(false)
    } else {
        None
    }
}

/// Pipelines and stages are only reachable by members of the selected organization.
async fn pipeline_in_org<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    pipeline_id: Uuid,
) -> CrmResult<Uuid> {
    let (org_id, _) = require_member(db, actor).await?;
    repo::pipelines::find_in_org(db, pipeline_id, org_id)
        .await?
        .map(|p| p.id)
        .ok_or_else(|| DomainError::DealPipelineNotFound.into())
}

async fn check_company<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    company_id: Option<Uuid>,
) -> CrmResult<()> {
    let Some(company_id) = company_id else {
        return Ok(());
    };
    if repo::companies::find_visible(db, company_id, actor).await?.is_none() {
        return Err(DomainError::CompanyNotFound.into());
    }
    Ok(())
}

/// Resolves a stage inside the caller's organization and checks it against
/// the pipeline the deal is (or will be) in.
async fn resolve_stage<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    stage_id: Uuid,
    pipeline_id: Option<Uuid>,
) -> CrmResult<deal_stages::Model> {
    let (org_id, _) = require_member(db, actor).await?;
    let stage = repo::deal_stages::find_in_org(db, stage_id, org_id)
        .await?
        .ok_or(DomainError::DealStageNotFound)?;
    if pipeline_id.is_some_and(|p| p != stage.pipeline_id) {
        return Err(DomainError::InvalidStage.into());
    }
    Ok(stage)
}

fn stage_change_activity(
    deal: &deals::Model,
    from: Option<&str>,
    to: Option<&str>,
    user_id: Uuid,
    at: DateTimeWithTimeZone,
) -> activities::ActiveModel {
    let subject = format!("Stage: {} -> {}", from.unwrap_or("(none)"), to.unwrap_or("(none)"));
    activities::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        organization_id: Set(deal.organization_id),
        kind: Set(Kind::StageChange),
        subject: Set(Some(subject)),
        body: Set(None),
        contact_id: Set(None),
        deal_id: Set(Some(deal.id)),
        lead_id: Set(None),
        created_at: Set(at),
    }
}

/// Moves `deal` into `stage` (or out of any stage when `None`) and records the move.
/// Callers own the transaction.
async fn apply_stage<C: ConnectionTrait>(
    db: &C,
    deal: deals::Model,
    stage: Option<&deal_stages::Model>,
    user_id: Uuid,
) -> Result<deals::Model, DbErr> {
    let at = now();
    let from_id = deal.deal_stage_id;
    let from_name = deal.stage.clone();

    let mut active: deals::ActiveModel = deal.into();
    active.deal_stage_id = Set(stage.map(|s| s.id));
    if let Some(stage) = stage {
        active.pipeline_id = Set(Some(stage.pipeline_id));
        active.stage = Set(Some(stage.name.clone()));
        active.is_won = Set(outcome(stage));
    } else {
        active.stage = Set(None);
        active.is_won = Set(None);
    }
    active.updated_at = Set(Some(at));
    active.updated_by = Set(Some(user_id));
    let updated = repo::deals::update(db, active).await?;

    let change = deal_stage_changes::ActiveModel {
        id: Set(Uuid::new_v4()),
        deal_id: Set(updated.id),
        from_deal_stage_id: Set(from_id),
        from_stage_name: Set(from_name.clone()),
        to_deal_stage_id: Set(stage.map(|s| s.id)),
        to_stage_name: Set(stage.map(|s| s.name.clone())),
        changed_by_user_id: Set(user_id),
        changed_at: Set(at),
    };
    repo::stage_changes::append(db, change).await?;

    let activity = stage_change_activity(
        &updated,
        from_name.as_deref(),
        stage.map(|s| s.name.as_str()),
        user_id,
        at,
    );
    repo::activities::insert(db, activity).await?;
    Ok(updated)
}

/// Takes every deal out of `stage_id` with an audit row each, ahead of the stage
/// being deleted.
pub(crate) async fn detach_from_stage<C: ConnectionTrait>(
    db: &C,
    stage_id: Uuid,
    user_id: Uuid,
) -> CrmResult<usize> {
    let placed = repo::deals::in_stage(db, stage_id).await?;
    let count = placed.len();
    for deal in placed {
        apply_stage(db, deal, None, user_id).await?;
    }
    Ok(count)
}

async fn with_last_activity<C: ConnectionTrait>(db: &C, deal: deals::Model) -> CrmResult<DealDto> {
    let last = repo::deals::last_activity_at(db, vec![deal.id]).await?;
    let mut dto = DealDto::from(deal);
    dto.last_activity_at = last.values().next().copied();
    Ok(dto)
}

pub async fn list_paged(
    db: &DatabaseConnection,
    actor: &Actor,
    params: PaginationParams,
    search: Option<&str>,
) -> CrmResult<PagedResult<DealDto>> {
    let (items, total) = repo::deals::list_paged(db, actor, params, search).await?;
    let ids = items.iter().map(|d| d.id).collect();
    let last = repo::deals::last_activity_at(db, ids).await?;
    let page = PagedResult::from_params(items, params, total).map(|deal| {
        let last_activity_at = last.get(&deal.id).copied();
        DealDto {
            last_activity_at,
            ..DealDto::from(deal)
        }
    });
    Ok(page)
}

pub async fn search(
    db: &DatabaseConnection,
    actor: &Actor,
    query: &str,
) -> CrmResult<Vec<DealDto>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let deals = repo::deals::search(db, actor, query, SEARCH_LIMIT).await?;
    Ok(deals.into_iter().map(DealDto::from).collect())
}

pub async fn get(db: &DatabaseConnection, actor: &Actor, deal_id: Uuid) -> CrmResult<DealDto> {
    let deal = repo::deals::find_visible(db, deal_id, actor)
        .await?
        .ok_or(DomainError::DealNotFound)?;
    with_last_activity(db, deal).await
}

/// Validates, inserts, and records the first placement when a stage is given.
pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: CreateDeal,
) -> CrmResult<DealDto> {
    let txn = db.begin().await?;
    let deal = create_in(&txn, actor, input).await?;
    txn.commit().await?;

    info!(deal_id = %deal.id, stage_id = ?deal.deal_stage_id, "deal created");
    Ok(deal.into())
}

/// [`create`] on a connection the caller already holds, usually an open transaction.
pub(crate) async fn create_in<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    input: CreateDeal,
) -> CrmResult<deals::Model> {
    let name = deal_name(input.name.as_deref())?;
    let value = deal_value(input.value.as_deref())?;
    let currency = currency(input.currency.as_deref())?;
    check_company(db, actor, input.company_id).await?;
    let pipeline_id = match input.pipeline_id {
        Some(id) => Some(pipeline_in_org(db, actor, id).await?),
        None => None,
    };
    let stage = match input.deal_stage_id {
        Some(stage_id) => Some(resolve_stage(db, actor, stage_id, pipeline_id).await?),
        None => None,
    };

    let created_at = now();
    let model = deals::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(actor.user_id),
        organization_id: Set(actor.org_id),
        name: Set(name),
        value: Set(value),
        currency: Set(currency),
        stage: Set(if stage.is_some() {
            None
        } else {
            non_blank(input.stage.as_deref())
        }),
        pipeline_id: Set(pipeline_id),
        deal_stage_id: Set(None),
        company_id: Set(input.company_id),
        contact_id: Set(input.contact_id),
        assignee_id: Set(input.assignee_id),
        expected_close_date: Set(input.expected_close_date),
        is_won: Set(None),
        created_at: Set(created_at),
        updated_at: Set(None),
        updated_by: Set(None),
    };

    let mut deal = repo::deals::insert(db, model).await?;
    if let Some(stage) = stage.as_ref() {
        deal = apply_stage(db, deal, Some(stage), actor.user_id).await?;
    }
    Ok(deal)
}

/// Partial update. A `deal_stage_id` goes through the stage rules, and moving the
/// deal to another pipeline drops a stage that does not belong there.
pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    deal_id: Uuid,
    input: UpdateDeal,
) -> CrmResult<DealDto> {
    let existing = repo::deals::find_visible(db, deal_id, actor)
        .await?
        .ok_or(DomainError::DealNotFound)?;
    let name = match input.name.as_deref() {
        Some(raw) => Some(deal_name(Some(raw))?),
        None => None,
    };
    let value = match input.value.as_deref() {
        Some(raw) => Some(deal_value(Some(raw))?),
        None => None,
    };
    let currency = match input.currency.as_deref() {
        Some(raw) => Some(currency(Some(raw))?),
        None => None,
    };
    check_company(db, actor, input.company_id).await?;
    let pipeline_id = match input.pipeline_id {
        Some(id) => Some(pipeline_in_org(db, actor, id).await?),
        None => None,
    };
    let target_pipeline = pipeline_id.or(existing.pipeline_id);
    let stage = match input.deal_stage_id {
        Some(stage_id) => Some(resolve_stage(db, actor, stage_id, target_pipeline).await?),
        None => None,
    };
    let moved_pipeline = pipeline_id.filter(|p| existing.pipeline_id != Some(*p));
    let stale_stage = match (moved_pipeline, existing.deal_stage_id, stage.is_none()) {
        (Some(new_pipeline), Some(current), true) => {
            let current = match actor.org_id {
                Some(org_id) => repo::deal_stages::find_in_org(db, current, org_id).await?,
                None => None,
            };
            current.is_none_or(|s| s.pipeline_id != new_pipeline)
        }
        _ => false,
    };

    let current_stage = existing.deal_stage_id;
    let mut active: deals::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(value) = value {
        active.value = Set(value);
    }
    if let Some(currency) = currency {
        active.currency = Set(currency);
    }
    if let (Some(stage_text), None) = (input.stage.as_deref(), stage.as_ref()) {
        active.stage = Set(non_blank(Some(stage_text)));
    }
    if let Some(pipeline_id) = pipeline_id {
        active.pipeline_id = Set(Some(pipeline_id));
    }
    if let Some(company_id) = input.company_id {
        active.company_id = Set(Some(company_id));
    }
    if let Some(contact_id) = input.contact_id {
        active.contact_id = Set(Some(contact_id));
    }
    if let Some(assignee_id) = input.assignee_id {
        active.assignee_id = Set(Some(assignee_id));
    }
    if let Some(close) = input.expected_close_date {
        active.expected_close_date = Set(Some(close));
    }
    active.updated_at = Set(Some(now()));
    active.updated_by = Set(Some(actor.user_id));

    let txn = db.begin().await?;
    let mut deal = repo::deals::update(&txn, active).await?;
    match stage.as_ref() {
        Some(stage) if current_stage != Some(stage.id) => {
            deal = apply_stage(&txn, deal, Some(stage), actor.user_id).await?;
        }
        None if stale_stage => {
            deal = apply_stage(&txn, deal, None, actor.user_id).await?;
        }
        _ => {}
    }
    txn.commit().await?;

    with_last_activity(db, deal).await
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, deal_id: Uuid) -> CrmResult<()> {
    if !repo::deals::delete_visible(db, deal_id, actor).await? {
        return Err(DomainError::DealNotFound.into());
    }
    info!(deal_id = %deal_id, "deal deleted");
    Ok(())
}

/// Places the deal in `stage_id`.
///
/// Checks run in order: the deal must be visible, the stage must resolve in the
/// caller's organization, and it must belong to the deal's pipeline (a deal
/// without a pipeline adopts the stage's). Moving into the current stage writes
/// nothing.
pub async fn change_stage(
    db: &DatabaseConnection,
    actor: &Actor,
    deal_id: Uuid,
    stage_id: Uuid,
) -> CrmResult<DealDto> {
    let span = info_span!("crm.deals.change_stage", deal_id = %deal_id, stage_id = %stage_id);
    async move {
        let deal = repo::deals::find_visible(db, deal_id, actor)
            .await?
            .ok_or(DomainError::DealNotFound)?;
        let stage = resolve_stage(db, actor, stage_id, deal.pipeline_id).await?;
        if deal.deal_stage_id == Some(stage.id) {
            return with_last_activity(db, deal).await;
        }

        let from = deal.deal_stage_id;
        let txn = db.begin().await?;
        let updated = apply_stage(&txn, deal, Some(&stage), actor.user_id).await?;
        txn.commit().await?;

        info!(from = ?from, to = %stage.id, stage = %stage.name, "deal stage changed");
        with_last_activity(db, updated).await
    }
    .instrument(span)
    .await
}

/// Audit trail of one deal, newest first.
pub async fn stage_history(
    db: &DatabaseConnection,
    actor: &Actor,
    deal_id: Uuid,
) -> CrmResult<Vec<StageChangeDto>> {
    if repo::deals::find_visible(db, deal_id, actor).await?.is_none() {
        return Err(DomainError::DealNotFound.into());
    }
    let rows = repo::stage_changes::history(db, deal_id).await?;
    Ok(rows.into_iter().map(StageChangeDto::from).collect())
}
