use chrono::{DateTime, FixedOffset};
use entity::companies;
use sea_orm::ActiveValue::Set;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CrmResult, DomainError};
use crate::paging::{PagedResult, PaginationParams};
use crate::repo::{self, now};
use crate::scope::Actor;
use crate::validation::{is_valid_domain, non_blank};

pub const NAME_MAX_LEN: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDto {
    pub id: Uuid,
    pub name: String,
    pub domain: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<companies::Model> for CompanyDto {
    fn from(m: companies::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            domain: m.domain,
            industry: m.industry,
            size: m.size,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInput {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
}

fn company_name(raw: Option<&str>) -> CrmResult<String> {
    let name = non_blank(raw).ok_or(DomainError::CompanyNameRequired)?;
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "Company name must be at most {NAME_MAX_LEN} characters"
        ))
        .into());
    }
    Ok(name)
}

fn domain(raw: Option<&str>) -> CrmResult<Option<String>> {
    match non_blank(raw) {
        Some(d) if !is_valid_domain(&d) => Err(DomainError::CompanyDomainInvalid.into()),
        other => Ok(other.map(|d| d.to_lowercase())),
    }
}

pub async fn list_paged(
    db: &DatabaseConnection,
    actor: &Actor,
    params: PaginationParams,
    search: Option<&str>,
) -> CrmResult<PagedResult<CompanyDto>> {
    let (items, total) = repo::companies::list_paged(db, actor, params, search).await?;
    Ok(PagedResult::from_params(items, params, total).map(CompanyDto::from))
}

pub async fn get(
    db: &DatabaseConnection,
    actor: &Actor,
    company_id: Uuid,
) -> CrmResult<CompanyDto> {
    repo::companies::find_visible(db, company_id, actor)
        .await?
        .map(CompanyDto::from)
        .ok_or_else(|| DomainError::CompanyNotFound.into())
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: CompanyInput,
) -> CrmResult<CompanyDto> {
    let name = company_name(input.name.as_deref())?;
    let domain = domain(input.domain.as_deref())?;
    if repo::companies::find_by_name(db, &name, actor).await?.is_some() {
        return Err(DomainError::CompanyDuplicateName.into());
    }
    let company = repo::companies::insert(
        db,
        companies::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(actor.user_id),
            organization_id: Set(actor.org_id),
            name: Set(name),
            domain: Set(domain),
            industry: Set(non_blank(input.industry.as_deref())),
            size: Set(non_blank(input.size.as_deref())),
            created_at: Set(now()),
            updated_at: Set(None),
            updated_by: Set(None),
        },
    )
    .await?;
    Ok(company.into())
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    company_id: Uuid,
    input: CompanyInput,
) -> CrmResult<CompanyDto> {
    let existing = repo::companies::find_visible(db, company_id, actor)
        .await?
        .ok_or(DomainError::CompanyNotFound)?;
    let name = match input.name.as_deref() {
        Some(raw) => Some(company_name(Some(raw))?),
        None => None,
    };
    if let Some(name) = name.as_deref() {
        let clash = repo::companies::find_by_name(db, name, actor).await?;
        if clash.is_some_and(|c| c.id != existing.id) {
            return Err(DomainError::CompanyDuplicateName.into());
        }
    }
    let domain = match input.domain.as_deref() {
        Some(raw) => Some(domain(Some(raw))?),
        None => None,
    };

    let mut active: companies::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(domain) = domain {
        active.domain = Set(domain);
    }
    if let Some(industry) = input.industry.as_deref() {
        active.industry = Set(non_blank(Some(industry)));
    }
    if let Some(size) = input.size.as_deref() {
        active.size = Set(non_blank(Some(size)));
    }
    active.updated_at = Set(Some(now()));
    active.updated_by = Set(Some(actor.user_id));
    Ok(repo::companies::update(db, active).await?.into())
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, company_id: Uuid) -> CrmResult<()> {
    if !repo::companies::delete_visible(db, company_id, actor).await? {
        return Err(DomainError::CompanyNotFound.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_is_optional_but_checked() {
        assert_eq!(domain(None).ok(), Some(None));
        assert_eq!(domain(Some("  ")).ok(), Some(None));
        assert_eq!(domain(Some("Acme.COM")).ok(), Some(Some("acme.com".into())));
        assert!(domain(Some("acme corp.com")).is_err());
    }
}
