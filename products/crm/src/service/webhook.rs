use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::companies::{self, CompanyInput};
use super::leads::{self, DEFAULT_STATUS, LeadInput};
use crate::error::{CrmResult, DomainError};
use crate::repo;
use crate::scope::Actor;
use crate::validation::non_blank;

pub const DEFAULT_SOURCE: &str = "webhook";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookLead {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(alias = "company_name")]
    pub company_name: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookLeadCreated {
    pub id: Uuid,
    pub message: &'static str,
}

/// Creates a lead in the organization that owns `api_key`, acting as its owner.
pub async fn ingest_lead(
    db: &DatabaseConnection,
    api_key: Option<&str>,
    input: WebhookLead,
) -> CrmResult<WebhookLeadCreated> {
    let api_key = non_blank(api_key).ok_or(DomainError::WebhookKeyMissing)?;
    let Some(org) = repo::orgs::find_by_api_key(db, &api_key).await? else {
        warn!("webhook called with unknown api key");
        return Err(DomainError::WebhookKeyInvalid.into());
    };
    let actor = Actor::new(org.owner_user_id, Some(org.id));

    if non_blank(input.name.as_deref()).is_none() || non_blank(input.email.as_deref()).is_none() {
        return Err(DomainError::Validation("Name and Email are required".into()).into());
    }

    let company_id = match non_blank(input.company_name.as_deref()) {
        Some(name) => Some(match repo::companies::find_by_name(db, &name, &actor).await? {
            Some(existing) => existing.id,
            None => {
                let company = CompanyInput {
                    name: Some(name),
                    ..CompanyInput::default()
                };
                companies::create(db, &actor, company).await?.id
            }
        }),
        None => None,
    };

    let lead = leads::insert(
        db,
        &actor,
        LeadInput {
            name: input.name,
            email: input.email,
            phone: input.phone,
            company_id,
            source: Some(
                non_blank(input.source.as_deref()).unwrap_or_else(|| DEFAULT_SOURCE.into()),
            ),
            status: Some(DEFAULT_STATUS.to_string()),
            description: input.description,
        },
    )
    .await?;
    info!(org_id = %org.id, lead_id = %lead.id, "lead received via webhook");
    Ok(WebhookLeadCreated {
        id: lead.id,
        message: "Lead created successfully",
    })
}
