use std::collections::HashMap;

use entity::{deal_stages, pipelines};
use sea_orm::ActiveValue::Set;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{deals, require_editor, require_member};
use crate::error::{CrmResult, DomainError};
use crate::kanban::FALLBACK_STAGES;
use crate::repo;
use crate::repo::deal_stages::StagePatch;
use crate::scope::Actor;
use crate::validation::non_blank;

pub const NAME_MAX_LEN: usize = 128;
pub const DEFAULT_PIPELINE_NAME: &str = "Sales";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealStageDto {
    pub id: Uuid,
    pub pipeline_id: Uuid,
    pub name: String,
    pub display_order: i32,
    pub is_won: bool,
    pub is_lost: bool,
}

impl From<deal_stages::Model> for DealStageDto {
    fn from(m: deal_stages::Model) -> Self {
        Self {
            id: m.id,
            pipeline_id: m.pipeline_id,
            name: m.name,
            display_order: m.display_order,
            is_won: m.is_won,
            is_lost: m.is_lost,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDto {
    pub id: Uuid,
    pub name: String,
    pub display_order: i32,
    pub deal_stages: Vec<DealStageDto>,
}

impl PipelineDto {
    fn new(pipeline: pipelines::Model, stages: Vec<deal_stages::Model>) -> Self {
        Self {
            id: pipeline.id,
            name: pipeline.name,
            display_order: pipeline.display_order,
            deal_stages: stages.into_iter().map(DealStageDto::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageInput {
    pub name: Option<String>,
    pub display_order: Option<i32>,
    #[serde(default)]
    pub is_won: bool,
    #[serde(default)]
    pub is_lost: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePipeline {
    pub name: Option<String>,
    pub display_order: Option<i32>,
    #[serde(default)]
    pub stages: Vec<StageInput>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePipeline {
    pub name: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDealStage {
    pub pipeline_id: Uuid,
    pub name: Option<String>,
    pub display_order: Option<i32>,
    #[serde(default)]
    pub is_won: bool,
    #[serde(default)]
    pub is_lost: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDealStage {
    pub name: Option<String>,
    pub display_order: Option<i32>,
    pub is_won: Option<bool>,
    pub is_lost: Option<bool>,
}

fn pipeline_name(raw: Option<&str>) -> CrmResult<String> {
    let name = non_blank(raw).ok_or(DomainError::PipelineNameRequired)?;
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "Pipeline name must be at most {NAME_MAX_LEN} characters"
        ))
        .into());
    }
    Ok(name)
}

fn stage_name(raw: Option<&str>) -> CrmResult<String> {
    let name = non_blank(raw).ok_or(DomainError::DealStageNameRequired)?;
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "Stage name must be at most {NAME_MAX_LEN} characters"
        ))
        .into());
    }
    Ok(name)
}

fn check_outcome(is_won: bool, is_lost: bool) -> CrmResult<()> {
    if is_won && is_lost {
        return Err(DomainError::ConflictingOutcome.into());
    }
    Ok(())
}

pub async fn list(db: &DatabaseConnection, actor: &Actor) -> CrmResult<Vec<PipelineDto>> {
    let (org_id, _) = require_member(db, actor).await?;
    let pipelines = repo::pipelines::list_for_org(db, org_id).await?;
    let ids = pipelines.iter().map(|p| p.id).collect();
    let mut by_pipeline: HashMap<Uuid, Vec<deal_stages::Model>> = HashMap::new();
    for stage in repo::deal_stages::stages_for_pipelines(db, ids).await? {
        by_pipeline.entry(stage.pipeline_id).or_default().push(stage);
    }
    Ok(pipelines
        .into_iter()
        .map(|p| {
            let stages = by_pipeline.remove(&p.id).unwrap_or_default();
            PipelineDto::new(p, stages)
        })
        .collect())
}

pub async fn get(
    db: &DatabaseConnection,
    actor: &Actor,
    pipeline_id: Uuid,
) -> CrmResult<PipelineDto> {
    let (org_id, _) = require_member(db, actor).await?;
    let pipeline = repo::pipelines::find_in_org(db, pipeline_id, org_id)
        .await?
        .ok_or(DomainError::PipelineNotFound)?;
    let stages = repo::deal_stages::stages_by_pipeline(db, pipeline.id).await?;
    Ok(PipelineDto::new(pipeline, stages))
}

/// Creates the pipeline and any inline stages in one transaction.
pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: CreatePipeline,
) -> CrmResult<PipelineDto> {
    let org_id = require_editor(db, actor).await?;
    let name = pipeline_name(input.name.as_deref())?;
    let mut stage_rows = Vec::with_capacity(input.stages.len());
    for (idx, stage) in input.stages.iter().enumerate() {
        check_outcome(stage.is_won, stage.is_lost)?;
        stage_rows.push((
            stage_name(stage.name.as_deref())?,
            stage.display_order.unwrap_or(idx as i32),
            stage.is_won,
            stage.is_lost,
        ));
    }
    let display_order = match input.display_order {
        Some(order) => order,
        None => repo::pipelines::max_display_order(db, org_id).await? + 1,
    };

    let txn = db.begin().await?;
    let pipeline = insert_pipeline(&txn, org_id, name, display_order).await?;
    let mut stages = Vec::with_capacity(stage_rows.len());
    for (name, order, is_won, is_lost) in stage_rows {
        stages.push(insert_stage(&txn, pipeline.id, name, order, is_won, is_lost).await?);
    }
    txn.commit().await?;

    info!(pipeline_id = %pipeline.id, org_id = %org_id, stages = stages.len(), "pipeline created");
    Ok(PipelineDto::new(pipeline, stages))
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    pipeline_id: Uuid,
    input: UpdatePipeline,
) -> CrmResult<PipelineDto> {
    let org_id = require_editor(db, actor).await?;
    let existing = repo::pipelines::find_in_org(db, pipeline_id, org_id)
        .await?
        .ok_or(DomainError::PipelineNotFound)?;
    let mut active: pipelines::ActiveModel = existing.into();
    if input.name.is_some() {
        active.name = Set(pipeline_name(input.name.as_deref())?);
    }
    if let Some(order) = input.display_order {
        active.display_order = Set(order);
    }
    let updated = repo::pipelines::update(db, active).await?;
    let stages = repo::deal_stages::stages_by_pipeline(db, updated.id).await?;
    Ok(PipelineDto::new(updated, stages))
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, pipeline_id: Uuid) -> CrmResult<()> {
    let org_id = require_editor(db, actor).await?;
    if repo::pipelines::find_in_org(db, pipeline_id, org_id).await?.is_none() {
        return Err(DomainError::PipelineNotFound.into());
    }
    if repo::pipelines::count_deals(db, pipeline_id).await? > 0 {
        return Err(DomainError::PipelineHasDeals.into());
    }
    if !repo::pipelines::delete_in_org(db, pipeline_id, org_id).await? {
        return Err(DomainError::PipelineNotFound.into());
    }
    info!(pipeline_id = %pipeline_id, org_id = %org_id, "pipeline deleted");
    Ok(())
}

pub async fn list_stages(
    db: &DatabaseConnection,
    actor: &Actor,
    pipeline_id: Uuid,
) -> CrmResult<Vec<DealStageDto>> {
    let (org_id, _) = require_member(db, actor).await?;
    if repo::pipelines::find_in_org(db, pipeline_id, org_id).await?.is_none() {
        return Err(DomainError::PipelineNotFound.into());
    }
    let stages = repo::deal_stages::stages_by_pipeline(db, pipeline_id).await?;
    Ok(stages.into_iter().map(DealStageDto::from).collect())
}

pub async fn get_stage(
    db: &DatabaseConnection,
    actor: &Actor,
    stage_id: Uuid,
) -> CrmResult<DealStageDto> {
    let (org_id, _) = require_member(db, actor).await?;
    repo::deal_stages::find_in_org(db, stage_id, org_id)
        .await?
        .map(DealStageDto::from)
        .ok_or_else(|| DomainError::DealStageNotFound.into())
}

pub async fn create_stage(
    db: &DatabaseConnection,
    actor: &Actor,
    input: CreateDealStage,
) -> CrmResult<DealStageDto> {
    let org_id = require_editor(db, actor).await?;
    let name = stage_name(input.name.as_deref())?;
    check_outcome(input.is_won, input.is_lost)?;
    if repo::pipelines::find_in_org(db, input.pipeline_id, org_id).await?.is_none() {
        return Err(DomainError::PipelineNotFound.into());
    }
    let display_order = match input.display_order {
        Some(order) => order,
        None => repo::deal_stages::max_display_order(db, input.pipeline_id).await? + 1,
    };
    let stage = insert_stage(
        db,
        input.pipeline_id,
        name,
        display_order,
        input.is_won,
        input.is_lost,
    )
    .await?;
    Ok(stage.into())
}

/// A stage in another organization's pipeline reads as missing; nothing is written.
pub async fn update_stage(
    db: &DatabaseConnection,
    actor: &Actor,
    stage_id: Uuid,
    input: UpdateDealStage,
) -> CrmResult<DealStageDto> {
    let org_id = require_editor(db, actor).await?;
    let existing = repo::deal_stages::find_in_org(db, stage_id, org_id)
        .await?
        .ok_or(DomainError::DealStageNotFound)?;
    let name = match input.name.as_deref() {
        Some(raw) => Some(stage_name(Some(raw))?),
        None => None,
    };
    check_outcome(
        input.is_won.unwrap_or(existing.is_won),
        input.is_lost.unwrap_or(existing.is_lost),
    )?;
    let patch = StagePatch {
        name,
        display_order: input.display_order,
        is_won: input.is_won,
        is_lost: input.is_lost,
    };
    repo::deal_stages::update_in_org(db, stage_id, org_id, patch)
        .await?
        .map(DealStageDto::from)
        .ok_or_else(|| DomainError::DealStageNotFound.into())
}

/// Deals still placed in the stage are moved out first, each leaving a history row.
pub async fn delete_stage(db: &DatabaseConnection, actor: &Actor, stage_id: Uuid) -> CrmResult<()> {
    let org_id = require_editor(db, actor).await?;
    if repo::deal_stages::find_in_org(db, stage_id, org_id).await?.is_none() {
        return Err(DomainError::DealStageNotFound.into());
    }
    let txn = db.begin().await?;
    let detached = deals::detach_from_stage(&txn, stage_id, actor.user_id).await?;
    if !repo::deal_stages::delete_in_org(&txn, stage_id, org_id).await? {
        return Err(DomainError::DealStageNotFound.into());
    }
    txn.commit().await?;
    info!(stage_id = %stage_id, org_id = %org_id, detached, "deal stage deleted");
    Ok(())
}

/// Default pipeline for a new organization: the fallback stage names, last two closing.
pub(crate) async fn seed_default<C: ConnectionTrait>(
    db: &C,
    org_id: Uuid,
) -> CrmResult<pipelines::Model> {
    let pipeline = insert_pipeline(db, org_id, DEFAULT_PIPELINE_NAME.to_string(), 0).await?;
    let last = FALLBACK_STAGES.len() - 1;
    for (idx, name) in FALLBACK_STAGES.iter().enumerate() {
        insert_stage(
            db,
            pipeline.id,
            name.to_string(),
            idx as i32,
            idx + 1 == last,
            idx == last,
        )
        .await?;
    }
    Ok(pipeline)
}

async fn insert_pipeline<C: ConnectionTrait>(
    db: &C,
    org_id: Uuid,
    name: String,
    display_order: i32,
) -> CrmResult<pipelines::Model> {
    let model = pipelines::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(org_id),
        name: Set(name),
        display_order: Set(display_order),
    };
    Ok(repo::pipelines::insert(db, model).await?)
}

async fn insert_stage<C: ConnectionTrait>(
    db: &C,
    pipeline_id: Uuid,
    name: String,
    display_order: i32,
    is_won: bool,
    is_lost: bool,
) -> CrmResult<deal_stages::Model> {
    let model = deal_stages::ActiveModel {
        id: Set(Uuid::new_v4()),
        pipeline_id: Set(pipeline_id),
        name: Set(name),
        display_order: Set(display_order),
        is_won: Set(is_won),
        is_lost: Set(is_lost),
    };
    Ok(repo::deal_stages::insert(db, model).await?)
}
