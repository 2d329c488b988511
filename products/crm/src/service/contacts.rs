use chrono::{DateTime, FixedOffset};
use entity::contacts;
use sea_orm::ActiveValue::Set;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CrmResult, DomainError};
use crate::paging::{PagedResult, PaginationParams};
use crate::repo::{self, now};
use crate::scope::Actor;
use crate::validation::{is_valid_email, is_valid_phone, non_blank};

pub const NAME_MAX_LEN: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub company_id: Option<Uuid>,
    pub do_not_contact: bool,
    pub converted_from_lead_id: Option<Uuid>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<contacts::Model> for ContactDto {
    fn from(m: contacts::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            job_title: m.job_title,
            company_id: m.company_id,
            do_not_contact: m.do_not_contact,
            converted_from_lead_id: m.converted_from_lead_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub company_id: Option<Uuid>,
    pub do_not_contact: Option<bool>,
}

fn contact_name(raw: Option<&str>) -> CrmResult<String> {
    let name = non_blank(raw).ok_or(DomainError::ContactNameRequired)?;
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "Contact name must be at most {NAME_MAX_LEN} characters"
        ))
        .into());
    }
    Ok(name)
}

fn contact_email(raw: Option<&str>) -> CrmResult<String> {
    let email = non_blank(raw).ok_or(DomainError::ContactEmailRequired)?;
    if !is_valid_email(&email) {
        return Err(DomainError::ContactEmailInvalid.into());
    }
    Ok(email.to_lowercase())
}

fn phone(raw: Option<&str>) -> CrmResult<Option<String>> {
    match non_blank(raw) {
        Some(p) if !is_valid_phone(&p) => Err(DomainError::ContactPhoneInvalid.into()),
        other => Ok(other),
    }
}

async fn check_company<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    company_id: Option<Uuid>,
) -> CrmResult<()> {
    if let Some(company_id) = company_id {
        if repo::companies::find_visible(db, company_id, actor).await?.is_none() {
            return Err(DomainError::CompanyNotFound.into());
        }
    }
    Ok(())
}

pub async fn list_paged(
    db: &DatabaseConnection,
    actor: &Actor,
    params: PaginationParams,
    search: Option<&str>,
) -> CrmResult<PagedResult<ContactDto>> {
    let (items, total) = repo::contacts::list_paged(db, actor, params, search).await?;
    Ok(PagedResult::from_params(items, params, total).map(ContactDto::from))
}

pub async fn get(
    db: &DatabaseConnection,
    actor: &Actor,
    contact_id: Uuid,
) -> CrmResult<ContactDto> {
    repo::contacts::find_visible(db, contact_id, actor)
        .await?
        .map(ContactDto::from)
        .ok_or_else(|| DomainError::ContactNotFound.into())
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: ContactInput,
) -> CrmResult<ContactDto> {
    let contact = insert(db, actor, input, None).await?;
    Ok(contact.into())
}

/// Shared by plain creation and lead conversion.
pub(crate) async fn insert<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    input: ContactInput,
    converted_from_lead_id: Option<Uuid>,
) -> CrmResult<contacts::Model> {
    let name = contact_name(input.name.as_deref())?;
    let email = contact_email(input.email.as_deref())?;
    let phone = phone(input.phone.as_deref())?;
    check_company(db, actor, input.company_id).await?;
    if repo::contacts::find_by_email(db, &email, actor).await?.is_some() {
        return Err(DomainError::ContactDuplicateEmail.into());
    }
    let contact = repo::contacts::insert(
        db,
        contacts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(actor.user_id),
            organization_id: Set(actor.org_id),
            name: Set(name),
            email: Set(email),
            phone: Set(phone),
            job_title: Set(non_blank(input.job_title.as_deref())),
            company_id: Set(input.company_id),
            do_not_contact: Set(input.do_not_contact.unwrap_or(false)),
            converted_from_lead_id: Set(converted_from_lead_id),
            created_at: Set(now()),
            updated_at: Set(None),
        },
    )
    .await?;
    Ok(contact)
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    contact_id: Uuid,
    input: ContactInput,
) -> CrmResult<ContactDto> {
    let existing = repo::contacts::find_visible(db, contact_id, actor)
        .await?
        .ok_or(DomainError::ContactNotFound)?;
    let name = match input.name.as_deref() {
        Some(raw) => Some(contact_name(Some(raw))?),
        None => None,
    };
    let email = match input.email.as_deref() {
        Some(raw) => Some(contact_email(Some(raw))?),
        None => None,
    };
    if let Some(email) = email.as_deref().filter(|e| *e != existing.email) {
        if repo::contacts::find_by_email(db, email, actor).await?.is_some() {
            return Err(DomainError::ContactDuplicateEmail.into());
        }
    }
    let phone = match input.phone.as_deref() {
        Some(raw) => Some(phone(Some(raw))?),
        None => None,
    };
    check_company(db, actor, input.company_id).await?;

    let mut active: contacts::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(phone) = phone {
        active.phone = Set(phone);
    }
    if let Some(title) = input.job_title.as_deref() {
        active.job_title = Set(non_blank(Some(title)));
    }
    if let Some(company_id) = input.company_id {
        active.company_id = Set(Some(company_id));
    }
    if let Some(flag) = input.do_not_contact {
        active.do_not_contact = Set(flag);
    }
    active.updated_at = Set(Some(now()));
    Ok(repo::contacts::update(db, active).await?.into())
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, contact_id: Uuid) -> CrmResult<()> {
    if !repo::contacts::delete_visible(db, contact_id, actor).await? {
        return Err(DomainError::ContactNotFound.into());
    }
    Ok(())
}
