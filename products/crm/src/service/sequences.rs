//! Email sequences: ordered steps plus per-recipient enrollments.
//!
//! Enrollment status moves only along active -> paused -> active; unenrolling
//! removes the row.

use chrono::{DateTime, FixedOffset};
use entity::email_sequence_enrollments::{self as enrollments, EnrollmentStatus};
use entity::email_sequence_steps as steps;
use entity::email_sequences as sequences;
use sea_orm::ActiveValue::Set;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{CrmResult, DomainError};
use crate::repo::{self, now};
use crate::scope::Actor;
use crate::validation::{is_valid_email, non_blank};

pub const NAME_MAX_LEN: usize = 200;
pub const DEFAULT_COPY_TYPE: &str = "sales-email";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_shared_with_organization: bool,
    pub is_owner: bool,
    pub step_count: u64,
    pub active_enrollment_count: u64,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl SequenceDto {
    fn new(m: sequences::Model, actor: &Actor, counts: (u64, u64)) -> Self {
        Self {
            id: m.id,
            is_owner: m.user_id == actor.user_id,
            name: m.name,
            description: m.description,
            is_active: m.is_active,
            is_shared_with_organization: m.is_shared_with_organization,
            step_count: counts.0,
            active_enrollment_count: counts.1,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDto {
    pub id: Uuid,
    pub step_order: i32,
    pub subject: String,
    pub body: String,
    pub copy_type: String,
    pub delay_days: i32,
    pub delay_hours: i32,
    pub stop_on_reply: bool,
}

impl From<steps::Model> for StepDto {
    fn from(m: steps::Model) -> Self {
        Self {
            id: m.id,
            step_order: m.step_order,
            subject: m.subject,
            body: m.body,
            copy_type: m.copy_type,
            delay_days: m.delay_days,
            delay_hours: m.delay_hours,
            stop_on_reply: m.stop_on_reply,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDto {
    pub id: Uuid,
    pub sequence_id: Uuid,
    pub contact_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub current_step: i32,
    pub status: &'static str,
    pub enrolled_at: DateTime<FixedOffset>,
    pub last_sent_at: Option<DateTime<FixedOffset>>,
    pub next_send_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
}

impl From<enrollments::Model> for EnrollmentDto {
    fn from(m: enrollments::Model) -> Self {
        Self {
            id: m.id,
            sequence_id: m.sequence_id,
            contact_id: m.contact_id,
            lead_id: m.lead_id,
            recipient_email: m.recipient_email,
            recipient_name: m.recipient_name,
            current_step: m.current_step,
            status: m.status.as_str(),
            enrolled_at: m.enrolled_at,
            last_sent_at: m.last_sent_at,
            next_send_at: m.next_send_at,
            completed_at: m.completed_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceDetail {
    #[serde(flatten)]
    pub sequence: SequenceDto,
    pub steps: Vec<StepDto>,
    pub enrollments: Vec<EnrollmentDto>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub is_shared_with_organization: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub copy_type: Option<String>,
    pub delay_days: Option<i32>,
    pub delay_hours: Option<i32>,
    pub stop_on_reply: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollInput {
    pub contact_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
}

fn sequence_name(raw: Option<&str>) -> CrmResult<String> {
    let name = non_blank(raw).ok_or(DomainError::SequenceNameRequired)?;
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "Sequence name must be at most {NAME_MAX_LEN} characters"
        ))
        .into());
    }
    Ok(name)
}

/// The target status, or the transition error when `from` does not allow it.
fn transition(from: EnrollmentStatus, to: EnrollmentStatus) -> CrmResult<EnrollmentStatus> {
    let allowed = matches!(
        (from, to),
        (EnrollmentStatus::Active, EnrollmentStatus::Paused)
            | (EnrollmentStatus::Paused, EnrollmentStatus::Active)
    );
    if !allowed {
        return Err(DomainError::SequenceInvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        }
        .into());
    }
    Ok(to)
}

async fn visible_sequence(
    db: &DatabaseConnection,
    actor: &Actor,
    sequence_id: Uuid,
) -> CrmResult<sequences::Model> {
    repo::sequences::find_visible(db, sequence_id, actor)
        .await?
        .ok_or_else(|| DomainError::SequenceNotFound.into())
}

/// Shared sequences are readable by the organization but only the owner edits them.
async fn owned_sequence(
    db: &DatabaseConnection,
    actor: &Actor,
    sequence_id: Uuid,
) -> CrmResult<sequences::Model> {
    let sequence = visible_sequence(db, actor, sequence_id).await?;
    if sequence.user_id != actor.user_id {
        return Err(DomainError::SequenceNotFound.into());
    }
    Ok(sequence)
}

pub async fn list(db: &DatabaseConnection, actor: &Actor) -> CrmResult<Vec<SequenceDto>> {
    let rows = repo::sequences::list_visible(db, actor).await?;
    let counts = repo::sequences::counts(db, rows.iter().map(|s| s.id).collect()).await?;
    Ok(rows
        .into_iter()
        .map(|s| {
            let c = counts.get(&s.id).copied().unwrap_or_default();
            SequenceDto::new(s, actor, c)
        })
        .collect())
}

pub async fn get(
    db: &DatabaseConnection,
    actor: &Actor,
    sequence_id: Uuid,
) -> CrmResult<SequenceDetail> {
    let sequence = visible_sequence(db, actor, sequence_id).await?;
    let steps = repo::sequences::list_steps(db, sequence.id).await?;
    let enrollments = repo::sequences::list_enrollments(db, sequence.id).await?;
    let active = enrollments
        .iter()
        .filter(|e| e.status == EnrollmentStatus::Active)
        .count() as u64;
    Ok(SequenceDetail {
        sequence: SequenceDto::new(sequence, actor, (steps.len() as u64, active)),
        steps: steps.into_iter().map(StepDto::from).collect(),
        enrollments: enrollments.into_iter().map(EnrollmentDto::from).collect(),
    })
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: SequenceInput,
) -> CrmResult<SequenceDto> {
    let name = sequence_name(input.name.as_deref())?;
    let sequence = repo::sequences::insert(
        db,
        sequences::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(actor.user_id),
            organization_id: Set(actor.org_id),
            name: Set(name),
            description: Set(non_blank(input.description.as_deref())),
            is_active: Set(input.is_active.unwrap_or(true)),
            is_shared_with_organization: Set(input.is_shared_with_organization.unwrap_or(false)),
            created_at: Set(now()),
            updated_at: Set(None),
        },
    )
    .await?;
    Ok(SequenceDto::new(sequence, actor, (0, 0)))
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    sequence_id: Uuid,
    input: SequenceInput,
) -> CrmResult<SequenceDto> {
    let existing = owned_sequence(db, actor, sequence_id).await?;
    let name = match input.name.as_deref() {
        Some(raw) => Some(sequence_name(Some(raw))?),
        None => None,
    };
    let mut active: sequences::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(description) = input.description.as_deref() {
        active.description = Set(non_blank(Some(description)));
    }
    if let Some(flag) = input.is_active {
        active.is_active = Set(flag);
    }
    if let Some(flag) = input.is_shared_with_organization {
        active.is_shared_with_organization = Set(flag);
    }
    active.updated_at = Set(Some(now()));
    let updated = repo::sequences::update(db, active).await?;
    let counts = repo::sequences::counts(db, vec![updated.id]).await?;
    let c = counts.get(&updated.id).copied().unwrap_or_default();
    Ok(SequenceDto::new(updated, actor, c))
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, sequence_id: Uuid) -> CrmResult<()> {
    let sequence = owned_sequence(db, actor, sequence_id).await?;
    repo::sequences::delete(db, sequence.id).await?;
    info!(sequence_id = %sequence.id, "email sequence deleted");
    Ok(())
}

/// Appends a step after the current last one.
pub async fn add_step(
    db: &DatabaseConnection,
    actor: &Actor,
    sequence_id: Uuid,
    input: StepInput,
) -> CrmResult<StepDto> {
    let sequence = owned_sequence(db, actor, sequence_id).await?;
    let subject = non_blank(input.subject.as_deref())
        .ok_or_else(|| DomainError::Validation("Step subject is required".into()))?;
    let body = non_blank(input.body.as_deref())
        .ok_or_else(|| DomainError::Validation("Step body is required".into()))?;
    let delay_days = input.delay_days.unwrap_or(0);
    let delay_hours = input.delay_hours.unwrap_or(0);
    if delay_days < 0 || delay_hours < 0 {
        return Err(DomainError::Validation("Step delays cannot be negative".into()).into());
    }
    let step_order = repo::sequences::max_step_order(db, sequence.id).await? + 1;
    let step = repo::sequences::insert_step(
        db,
        steps::ActiveModel {
            id: Set(Uuid::new_v4()),
            sequence_id: Set(sequence.id),
            step_order: Set(step_order),
            subject: Set(subject),
            body: Set(body),
            copy_type: Set(non_blank(input.copy_type.as_deref())
                .unwrap_or_else(|| DEFAULT_COPY_TYPE.to_string())),
            delay_days: Set(delay_days),
            delay_hours: Set(delay_hours),
            stop_on_reply: Set(input.stop_on_reply.unwrap_or(true)),
        },
    )
    .await?;
    Ok(step.into())
}

pub async fn remove_step(
    db: &DatabaseConnection,
    actor: &Actor,
    sequence_id: Uuid,
    step_id: Uuid,
) -> CrmResult<()> {
    let sequence = owned_sequence(db, actor, sequence_id).await?;
    if !repo::sequences::delete_step(db, sequence.id, step_id).await? {
        return Err(DomainError::SequenceStepNotFound.into());
    }
    Ok(())
}

/// Starts a recipient at step 1, due immediately. Contact and lead links
/// fill in the recipient's address and name.
pub async fn enroll(
    db: &DatabaseConnection,
    actor: &Actor,
    sequence_id: Uuid,
    input: EnrollInput,
) -> CrmResult<EnrollmentDto> {
    let sequence = visible_sequence(db, actor, sequence_id).await?;
    let mut email = non_blank(input.recipient_email.as_deref());
    let mut name = non_blank(input.recipient_name.as_deref());
    if let Some(contact_id) = input.contact_id {
        let contact = repo::contacts::find_visible(db, contact_id, actor)
            .await?
            .ok_or(DomainError::ContactNotFound)?;
        email = email.or(Some(contact.email));
        name = name.or(Some(contact.name));
    }
    if let Some(lead_id) = input.lead_id {
        let lead = repo::leads::find_visible(db, lead_id, actor)
            .await?
            .ok_or(DomainError::LeadNotFound)?;
        email = email.or(Some(lead.email));
        name = name.or(Some(lead.name));
    }
    let email = email.ok_or(DomainError::SequenceRecipientRequired)?;
    if !is_valid_email(&email) {
        return Err(DomainError::Validation("Recipient email format is invalid".into()).into());
    }

    let enrolled_at = now();
    let enrollment = repo::sequences::insert_enrollment(
        db,
        enrollments::ActiveModel {
            id: Set(Uuid::new_v4()),
            sequence_id: Set(sequence.id),
            user_id: Set(actor.user_id),
            contact_id: Set(input.contact_id),
            lead_id: Set(input.lead_id),
            recipient_email: Set(Some(email.to_lowercase())),
            recipient_name: Set(name),
            current_step: Set(1),
            status: Set(EnrollmentStatus::Active),
            enrolled_at: Set(enrolled_at),
            last_sent_at: Set(None),
            next_send_at: Set(Some(enrolled_at)),
            completed_at: Set(None),
        },
    )
    .await?;
    info!(sequence_id = %sequence.id, enrollment_id = %enrollment.id, "recipient enrolled");
    Ok(enrollment.into())
}

async fn set_status(
    db: &DatabaseConnection,
    actor: &Actor,
    sequence_id: Uuid,
    enrollment_id: Uuid,
    to: EnrollmentStatus,
) -> CrmResult<EnrollmentDto> {
    let sequence = visible_sequence(db, actor, sequence_id).await?;
    let enrollment = repo::sequences::find_enrollment(db, sequence.id, enrollment_id)
        .await?
        .ok_or(DomainError::EnrollmentNotFound)?;
    let status = transition(enrollment.status, to)?;
    let mut active: enrollments::ActiveModel = enrollment.into();
    active.status = Set(status);
    if status == EnrollmentStatus::Active {
        active.next_send_at = Set(Some(now()));
    }
    Ok(repo::sequences::update_enrollment(db, active).await?.into())
}

pub async fn pause(
    db: &DatabaseConnection,
    actor: &Actor,
    sequence_id: Uuid,
    enrollment_id: Uuid,
) -> CrmResult<EnrollmentDto> {
    set_status(db, actor, sequence_id, enrollment_id, EnrollmentStatus::Paused).await
}

pub async fn resume(
    db: &DatabaseConnection,
    actor: &Actor,
    sequence_id: Uuid,
    enrollment_id: Uuid,
) -> CrmResult<EnrollmentDto> {
    set_status(db, actor, sequence_id, enrollment_id, EnrollmentStatus::Active).await
}

pub async fn unenroll(
    db: &DatabaseConnection,
    actor: &Actor,
    sequence_id: Uuid,
    enrollment_id: Uuid,
) -> CrmResult<()> {
    let sequence = visible_sequence(db, actor, sequence_id).await?;
    if repo::sequences::find_enrollment(db, sequence.id, enrollment_id)
        .await?
        .is_none()
    {
        return Err(DomainError::EnrollmentNotFound.into());
    }
    repo::sequences::delete_enrollment(db, enrollment_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pause_and_resume_are_allowed() {
        use EnrollmentStatus::*;
        assert!(transition(Active, Paused).is_ok());
        assert!(transition(Paused, Active).is_ok());
        let rejected = [
            (Paused, Paused),
            (Active, Active),
            (Completed, Active),
            (Replied, Paused),
        ];
        for (from, to) in rejected {
            let err = transition(from, to).unwrap_err();
            assert!(matches!(
                err.domain(),
                Some(DomainError::SequenceInvalidTransition { .. })
            ));
        }
    }
}
