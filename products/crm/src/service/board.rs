use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use super::require_member;
use crate::error::{CrmResult, DomainError};
use crate::kanban::{self, BoardColumn, DealCard, StageRef};
use crate::repo;
use crate::scope::Actor;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub pipeline_id: Uuid,
    pub pipeline_name: String,
    pub stages: Vec<StageRef>,
    pub columns: Vec<BoardColumn>,
    pub total_count: usize,
    pub total_value: f64,
}

/// Kanban columns for one pipeline: the caller's deals placed there plus
/// legacy deals without a pipeline, matched by stage name.
pub async fn board(db: &DatabaseConnection, actor: &Actor, pipeline_id: Uuid) -> CrmResult<Board> {
    let span = info_span!("crm.board.build", pipeline_id = %pipeline_id);
    async move {
        let (org_id, _) = require_member(db, actor).await?;
        let pipeline = repo::pipelines::find_in_org(db, pipeline_id, org_id)
            .await?
            .ok_or(DomainError::PipelineNotFound)?;
        let stages = repo::deal_stages::stages_by_pipeline(db, pipeline.id).await?;
        let deals = repo::deals::for_board(db, actor, pipeline.id).await?;

        let stage_list = kanban::stage_list(&stages);
        let cards: Vec<DealCard> = deals.iter().map(DealCard::from).collect();
        let columns = kanban::group_deals(&cards, &stage_list);
        debug!(stages = stage_list.len(), deals = cards.len(), "board grouped");

        Ok(Board {
            pipeline_id: pipeline.id,
            pipeline_name: pipeline.name,
            stages: stage_list,
            total_count: columns.iter().map(|c| c.count).sum(),
            total_value: columns.iter().map(|c| c.value_total).sum(),
            columns,
        })
    }
    .instrument(span)
    .await
}
