use chrono::{DateTime, FixedOffset};
use entity::tasks::{self, Priority, Status};
use sea_orm::ActiveValue::Set;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CrmResult, DomainError};
use crate::paging::{PagedResult, PaginationParams};
use crate::repo::tasks::TaskFilter;
use crate::repo::{self, now};
use crate::scope::Actor;
use crate::validation::non_blank;

pub const TITLE_MAX_LEN: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<DateTime<FixedOffset>>,
    pub reminder_at: Option<DateTime<FixedOffset>>,
    pub reminder_sent_at: Option<DateTime<FixedOffset>>,
    pub status: &'static str,
    pub priority: &'static str,
    pub lead_id: Option<Uuid>,
    pub deal_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
}

impl From<tasks::Model> for TaskDto {
    fn from(m: tasks::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            due_at: m.due_at,
            reminder_at: m.reminder_at,
            reminder_sent_at: m.reminder_sent_at,
            status: m.status.as_str(),
            priority: m.priority.as_str(),
            lead_id: m.lead_id,
            deal_id: m.deal_id,
            contact_id: m.contact_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
            completed_at: m.completed_at,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_at: Option<DateTime<FixedOffset>>,
    pub reminder_at: Option<DateTime<FixedOffset>>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub lead_id: Option<Uuid>,
    pub deal_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub deal_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub status: Option<String>,
}

fn title(raw: Option<&str>) -> CrmResult<String> {
    let title = non_blank(raw).ok_or(DomainError::TaskTitleRequired)?;
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "Task title must be at most {TITLE_MAX_LEN} characters"
        ))
        .into());
    }
    Ok(title)
}

fn status(raw: &str) -> CrmResult<Status> {
    Status::parse(raw).ok_or_else(|| DomainError::TaskInvalidStatus.into())
}

fn priority(raw: &str) -> CrmResult<Priority> {
    Priority::parse(raw).ok_or_else(|| DomainError::TaskInvalidPriority.into())
}

/// `completed_at` after moving from `from` to `to`: stamped on entering
/// completed, cleared on leaving it, otherwise kept.
fn completed_at_after(
    from: Status,
    to: Status,
    current: Option<DateTime<FixedOffset>>,
) -> Option<DateTime<FixedOffset>> {
    match (from == Status::Completed, to == Status::Completed) {
        (false, true) => Some(now()),
        (true, false) => None,
        _ => current,
    }
}

async fn check_links<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    input: &TaskInput,
) -> CrmResult<()> {
    if let Some(deal_id) = input.deal_id {
        if repo::deals::find_visible(db, deal_id, actor).await?.is_none() {
            return Err(DomainError::DealNotFound.into());
        }
    }
    if let Some(lead_id) = input.lead_id {
        if repo::leads::find_visible(db, lead_id, actor).await?.is_none() {
            return Err(DomainError::LeadNotFound.into());
        }
    }
    if let Some(contact_id) = input.contact_id {
        if repo::contacts::find_visible(db, contact_id, actor).await?.is_none() {
            return Err(DomainError::ContactNotFound.into());
        }
    }
    Ok(())
}

pub async fn list_paged(
    db: &DatabaseConnection,
    actor: &Actor,
    params: PaginationParams,
    query: TaskQuery,
) -> CrmResult<PagedResult<TaskDto>> {
    let status = match non_blank(query.status.as_deref()) {
        Some(raw) => Some(status(&raw)?),
        None => None,
    };
    let filter = TaskFilter {
        deal_id: query.deal_id,
        lead_id: query.lead_id,
        contact_id: query.contact_id,
        status,
    };
    let (items, total) = repo::tasks::list_paged(db, actor, params, filter).await?;
    Ok(PagedResult::from_params(items, params, total).map(TaskDto::from))
}

pub async fn get(db: &DatabaseConnection, actor: &Actor, task_id: Uuid) -> CrmResult<TaskDto> {
    repo::tasks::find_visible(db, task_id, actor)
        .await?
        .map(TaskDto::from)
        .ok_or_else(|| DomainError::TaskNotFound.into())
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: TaskInput,
) -> CrmResult<TaskDto> {
    let title = title(input.title.as_deref())?;
    let status = match non_blank(input.status.as_deref()) {
        Some(raw) => status(&raw)?,
        None => Status::Todo,
    };
    let priority = match non_blank(input.priority.as_deref()) {
        Some(raw) => priority(&raw)?,
        None => Priority::Unset,
    };
    check_links(db, actor, &input).await?;

    let created_at = now();
    let task = repo::tasks::insert(
        db,
        tasks::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(actor.user_id),
            organization_id: Set(actor.org_id),
            title: Set(title),
            description: Set(non_blank(input.description.as_deref())),
            due_at: Set(input.due_at),
            reminder_at: Set(input.reminder_at),
            reminder_sent_at: Set(None),
            status: Set(status),
            priority: Set(priority),
            lead_id: Set(input.lead_id),
            deal_id: Set(input.deal_id),
            contact_id: Set(input.contact_id),
            created_at: Set(created_at),
            updated_at: Set(None),
            completed_at: Set((status == Status::Completed).then_some(created_at)),
        },
    )
    .await?;
    Ok(task.into())
}

/// Partial update. A new `reminder_at` re-arms the reminder.
pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    task_id: Uuid,
    input: TaskInput,
) -> CrmResult<TaskDto> {
    let existing = repo::tasks::find_visible(db, task_id, actor)
        .await?
        .ok_or(DomainError::TaskNotFound)?;
    let title = match input.title.as_deref() {
        Some(raw) => Some(title(Some(raw))?),
        None => None,
    };
    let status = match non_blank(input.status.as_deref()) {
        Some(raw) => Some(status(&raw)?),
        None => None,
    };
    let priority = match non_blank(input.priority.as_deref()) {
        Some(raw) => Some(priority(&raw)?),
        None => None,
    };
    check_links(db, actor, &input).await?;

    let (from, completed_at) = (existing.status, existing.completed_at);
    let mut active: tasks::ActiveModel = existing.into();
    if let Some(title) = title {
        active.title = Set(title);
    }
    if let Some(description) = input.description.as_deref() {
        active.description = Set(non_blank(Some(description)));
    }
    if let Some(due_at) = input.due_at {
        active.due_at = Set(Some(due_at));
    }
    if let Some(reminder_at) = input.reminder_at {
        active.reminder_at = Set(Some(reminder_at));
        active.reminder_sent_at = Set(None);
    }
    if let Some(status) = status {
        active.status = Set(status);
        active.completed_at = Set(completed_at_after(from, status, completed_at));
    }
    if let Some(priority) = priority {
        active.priority = Set(priority);
    }
    if let Some(lead_id) = input.lead_id {
        active.lead_id = Set(Some(lead_id));
    }
    if let Some(deal_id) = input.deal_id {
        active.deal_id = Set(Some(deal_id));
    }
    if let Some(contact_id) = input.contact_id {
        active.contact_id = Set(Some(contact_id));
    }
    active.updated_at = Set(Some(now()));
    Ok(repo::tasks::update(db, active).await?.into())
}

pub async fn update_status(
    db: &DatabaseConnection,
    actor: &Actor,
    task_id: Uuid,
    raw_status: &str,
) -> CrmResult<TaskDto> {
    let status = status(raw_status)?;
    let existing = repo::tasks::find_visible(db, task_id, actor)
        .await?
        .ok_or(DomainError::TaskNotFound)?;
    let (from, completed_at) = (existing.status, existing.completed_at);
    let mut active: tasks::ActiveModel = existing.into();
    active.status = Set(status);
    active.completed_at = Set(completed_at_after(from, status, completed_at));
    active.updated_at = Set(Some(now()));
    Ok(repo::tasks::update(db, active).await?.into())
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, task_id: Uuid) -> CrmResult<()> {
    if !repo::tasks::delete_visible(db, task_id, actor).await? {
        return Err(DomainError::TaskNotFound.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_at_follows_status() {
        let earlier = Some(now());
        assert!(completed_at_after(Status::Todo, Status::Completed, None).is_some());
        assert_eq!(completed_at_after(Status::Completed, Status::Todo, earlier), None);
        assert_eq!(
            completed_at_after(Status::Completed, Status::Completed, earlier),
            earlier
        );
        assert_eq!(completed_at_after(Status::Todo, Status::InProgress, None), None);
    }
}
