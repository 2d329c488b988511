use chrono::{DateTime, FixedOffset};
use entity::leads;
use sea_orm::ActiveValue::Set;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::contacts::{self, ContactInput};
use super::deals::{self, CreateDeal};
use crate::error::{CrmResult, DomainError};
use crate::paging::{PagedResult, PaginationParams};
use crate::repo::leads::LeadFilter;
use crate::repo::{self, now};
use crate::scope::Actor;
use crate::validation::{is_valid_email, is_valid_phone, non_blank};

pub const DEFAULT_STATUS: &str = "New";
pub const CONVERTED_STATUS: &str = "Converted";
pub const NAME_MAX_LEN: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_id: Option<Uuid>,
    pub source: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub is_converted: bool,
    pub converted_at: Option<DateTime<FixedOffset>>,
    pub converted_to_contact_id: Option<Uuid>,
    pub converted_to_deal_id: Option<Uuid>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<leads::Model> for LeadDto {
    fn from(m: leads::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            company_id: m.company_id,
            source: m.source,
            status: m.status,
            description: m.description,
            is_converted: m.is_converted,
            converted_at: m.converted_at,
            converted_to_contact_id: m.converted_to_contact_id,
            converted_to_deal_id: m.converted_to_deal_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Option<Uuid>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertLead {
    #[serde(default)]
    pub create_deal: bool,
    pub deal_name: Option<String>,
    pub deal_value: Option<String>,
    pub pipeline_id: Option<Uuid>,
    pub deal_stage_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedLead {
    pub lead: LeadDto,
    pub contact_id: Uuid,
    pub deal_id: Option<Uuid>,
}

fn lead_name(raw: Option<&str>) -> CrmResult<String> {
    let name = non_blank(raw).ok_or(DomainError::LeadNameRequired)?;
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "Lead name must be at most {NAME_MAX_LEN} characters"
        ))
        .into());
    }
    Ok(name)
}

fn lead_email(raw: Option<&str>) -> CrmResult<String> {
    let email = non_blank(raw).ok_or(DomainError::LeadEmailRequired)?;
    if !is_valid_email(&email) {
        return Err(DomainError::LeadEmailInvalid.into());
    }
    Ok(email.to_lowercase())
}

fn phone(raw: Option<&str>) -> CrmResult<Option<String>> {
    match non_blank(raw) {
        Some(p) if !is_valid_phone(&p) => Err(DomainError::LeadPhoneInvalid.into()),
        other => Ok(other),
    }
}

pub async fn list_paged(
    db: &DatabaseConnection,
    actor: &Actor,
    params: PaginationParams,
    filter: &LeadFilter,
) -> CrmResult<PagedResult<LeadDto>> {
    let (items, total) = repo::leads::list_paged(db, actor, params, filter).await?;
    Ok(PagedResult::from_params(items, params, total).map(LeadDto::from))
}

pub async fn get(db: &DatabaseConnection, actor: &Actor, lead_id: Uuid) -> CrmResult<LeadDto> {
    repo::leads::find_visible(db, lead_id, actor)
        .await?
        .map(LeadDto::from)
        .ok_or_else(|| DomainError::LeadNotFound.into())
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: LeadInput,
) -> CrmResult<LeadDto> {
    Ok(insert(db, actor, input).await?.into())
}

pub(crate) async fn insert<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    input: LeadInput,
) -> CrmResult<leads::Model> {
    let name = lead_name(input.name.as_deref())?;
    let email = lead_email(input.email.as_deref())?;
    let phone = phone(input.phone.as_deref())?;
    if let Some(company_id) = input.company_id {
        if repo::companies::find_visible(db, company_id, actor).await?.is_none() {
            return Err(DomainError::CompanyNotFound.into());
        }
    }
    let lead = repo::leads::insert(
        db,
        leads::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(actor.user_id),
            organization_id: Set(actor.org_id),
            name: Set(name),
            email: Set(email),
            phone: Set(phone),
            company_id: Set(input.company_id),
            source: Set(non_blank(input.source.as_deref())),
            status: Set(non_blank(input.status.as_deref())
                .unwrap_or_else(|| DEFAULT_STATUS.to_string())),
            description: Set(non_blank(input.description.as_deref())),
            is_converted: Set(false),
            converted_at: Set(None),
            converted_to_contact_id: Set(None),
            converted_to_deal_id: Set(None),
            created_at: Set(now()),
            updated_at: Set(None),
        },
    )
    .await?;
    Ok(lead)
}

/// Converted leads are read-only.
pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    lead_id: Uuid,
    input: LeadInput,
) -> CrmResult<LeadDto> {
    let existing = repo::leads::find_visible(db, lead_id, actor)
        .await?
        .ok_or(DomainError::LeadNotFound)?;
    if existing.is_converted {
        return Err(DomainError::LeadAlreadyConverted.into());
    }
    let name = match input.name.as_deref() {
        Some(raw) => Some(lead_name(Some(raw))?),
        None => None,
    };
    let email = match input.email.as_deref() {
        Some(raw) => Some(lead_email(Some(raw))?),
        None => None,
    };
    let phone = match input.phone.as_deref() {
        Some(raw) => Some(phone(Some(raw))?),
        None => None,
    };

    let mut active: leads::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(phone) = phone {
        active.phone = Set(phone);
    }
    if let Some(company_id) = input.company_id {
        active.company_id = Set(Some(company_id));
    }
    if let Some(source) = input.source.as_deref() {
        active.source = Set(non_blank(Some(source)));
    }
    if let Some(status) = non_blank(input.status.as_deref()) {
        active.status = Set(status);
    }
    if let Some(description) = input.description.as_deref() {
        active.description = Set(non_blank(Some(description)));
    }
    active.updated_at = Set(Some(now()));
    Ok(repo::leads::update(db, active).await?.into())
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, lead_id: Uuid) -> CrmResult<()> {
    if !repo::leads::delete_visible(db, lead_id, actor).await? {
        return Err(DomainError::LeadNotFound.into());
    }
    Ok(())
}

/// Turns a lead into a contact (reusing one with the same email) and
/// optionally a deal, then marks the lead converted. All of it commits or none.
pub async fn convert(
    db: &DatabaseConnection,
    actor: &Actor,
    lead_id: Uuid,
    input: ConvertLead,
) -> CrmResult<ConvertedLead> {
    let lead = repo::leads::find_visible(db, lead_id, actor)
        .await?
        .ok_or(DomainError::LeadNotFound)?;
    if lead.is_converted {
        return Err(DomainError::LeadAlreadyConverted.into());
    }

    let txn = db.begin().await?;
    let contact_id = match repo::contacts::find_by_email(&txn, &lead.email, actor).await? {
        Some(existing) => existing.id,
        None => {
            let input = ContactInput {
                name: Some(lead.name.clone()),
                email: Some(lead.email.clone()),
                phone: lead.phone.clone(),
                company_id: lead.company_id,
                ..ContactInput::default()
            };
            contacts::insert(&txn, actor, input, Some(lead.id)).await?.id
        }
    };

    let deal_id = if input.create_deal {
        let deal = deals::create_in(
            &txn,
            actor,
            CreateDeal {
                name: non_blank(input.deal_name.as_deref()).or_else(|| Some(lead.name.clone())),
                value: non_blank(input.deal_value.as_deref()).or_else(|| Some("0".to_string())),
                pipeline_id: input.pipeline_id,
                deal_stage_id: input.deal_stage_id,
                company_id: lead.company_id,
                contact_id: Some(contact_id),
                ..CreateDeal::default()
            },
        )
        .await?;
        Some(deal.id)
    } else {
        None
    };

    let mut active: leads::ActiveModel = lead.into();
    let at = now();
    active.is_converted = Set(true);
    active.status = Set(CONVERTED_STATUS.to_string());
    active.converted_at = Set(Some(at));
    active.converted_to_contact_id = Set(Some(contact_id));
    active.converted_to_deal_id = Set(deal_id);
    active.updated_at = Set(Some(at));
    let lead = repo::leads::update(&txn, active).await?;
    txn.commit().await?;

    info!(lead_id = %lead.id, contact_id = %contact_id, deal_id = ?deal_id, "lead converted");
    Ok(ConvertedLead {
        lead: lead.into(),
        contact_id,
        deal_id,
    })
}
