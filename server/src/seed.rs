//! Demo fixtures: one user, an organization with its default pipeline, and a few deals.

use anyhow::{Context, Result};
use crm::Actor;
use crm::service::auth::{self, RegisterRequest};
use crm::service::deals::{self, CreateDeal};
use crm::service::orgs::{self, CreateOrganization};
use crm::service::pipelines;
use platform_authn::TokenConfig;
use platform_db::DbPool;
use tracing::info;

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "demo-password";

const DEMO_DEALS: [(&str, &str, &str); 4] = [
    ("Northwind renewal", "12000", "Qualification"),
    ("Contoso expansion", "48000", "Proposal"),
    ("Fabrikam pilot", "7500", "Negotiation"),
    ("Tailspin onboarding", "21000", "Closed Won"),
];

/// Skips everything when the demo user already exists.
pub async fn run(db: &DbPool, tokens: &TokenConfig) -> Result<()> {
    if crm::repo::users::find_by_email(db, DEMO_EMAIL).await?.is_some() {
        info!(email = DEMO_EMAIL, "demo data already present");
        return Ok(());
    }

    let registered = auth::register(
        db,
        tokens,
        RegisterRequest {
            name: Some("Demo User".into()),
            email: Some(DEMO_EMAIL.into()),
            password: Some(DEMO_PASSWORD.into()),
        },
    )
    .await
    .context("failed to create demo user")?;
    let user_id = registered.user.id;

    let org = orgs::create(
        db,
        user_id,
        CreateOrganization {
            name: Some("Demo Sales".into()),
        },
    )
    .await
    .context("failed to create demo organization")?;
    let actor = Actor::new(user_id, Some(org.id));

    let pipeline = pipelines::list(db, &actor)
        .await?
        .into_iter()
        .next()
        .context("default pipeline missing")?;

    for (name, value, stage_name) in DEMO_DEALS {
        let stage_id = pipeline
            .deal_stages
            .iter()
            .find(|stage| stage.name == stage_name)
            .map(|stage| stage.id);
        deals::create(
            db,
            &actor,
            CreateDeal {
                name: Some(name.into()),
                value: Some(value.into()),
                pipeline_id: Some(pipeline.id),
                deal_stage_id: stage_id,
                ..CreateDeal::default()
            },
        )
        .await
        .with_context(|| format!("failed to create deal {name}"))?;
    }

    info!(org_id = %org.id, email = DEMO_EMAIL, deals = DEMO_DEALS.len(), "demo data seeded");
    Ok(())
}
