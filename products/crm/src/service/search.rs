//! One query across leads, contacts, companies and deals.

use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::info;

use super::companies::CompanyDto;
use super::contacts::ContactDto;
use super::deals::DealDto;
use super::leads::LeadDto;
use crate::error::CrmResult;
use crate::paging::PaginationParams;
use crate::repo::{self, leads::LeadFilter};
use crate::scope::Actor;

pub const MAX_PER_KIND: u64 = 10;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSearchResult {
    pub leads: Vec<LeadDto>,
    pub contacts: Vec<ContactDto>,
    pub companies: Vec<CompanyDto>,
    pub deals: Vec<DealDto>,
}

/// At most [`MAX_PER_KIND`] visible matches of each kind. A blank query matches nothing.
pub async fn global(
    db: &DatabaseConnection,
    actor: &Actor,
    query: &str,
) -> CrmResult<GlobalSearchResult> {
    let q = query.trim();
    if q.is_empty() {
        return Ok(GlobalSearchResult::default());
    }
    let first_page = PaginationParams::new(Some(1), Some(MAX_PER_KIND as i64));
    let filter = LeadFilter {
        search: Some(q.to_string()),
        status: None,
    };

    let (leads, _) = repo::leads::list_paged(db, actor, first_page, &filter).await?;
    let (contacts, _) = repo::contacts::list_paged(db, actor, first_page, Some(q)).await?;
    let (companies, _) = repo::companies::list_paged(db, actor, first_page, Some(q)).await?;
    let deals = repo::deals::search(db, actor, q, MAX_PER_KIND).await?;

    let result = GlobalSearchResult {
        leads: leads.into_iter().map(LeadDto::from).collect(),
        contacts: contacts.into_iter().map(ContactDto::from).collect(),
        companies: companies.into_iter().map(CompanyDto::from).collect(),
        deals: deals.into_iter().map(DealDto::from).collect(),
    };
    info!(
        user_id = %actor.user_id,
        leads = result.leads.len(),
        contacts = result.contacts.len(),
        companies = result.companies.len(),
        deals = result.deals.len(),
        "global search completed"
    );
    Ok(result)
}
