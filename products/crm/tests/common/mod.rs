#![allow(dead_code)]

use chrono::Utc;
use crm::service::orgs::{self, CreateOrganization};
use crm::service::pipelines::{self, DealStageDto, PipelineDto};
use crm::{Actor, CrmError, DomainError};
use entity::users;
use migration::{Migrator, MigratorTrait};
use sea_orm::ActiveValue::Set;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

/// Fresh in-memory database with every migration applied. One connection, so
/// the schema lives as long as the pool.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn create_user(db: &DatabaseConnection, email: &str) -> Uuid {
    let user = crm::repo::users::insert(
        db,
        users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(email.split('@').next().unwrap_or(email).to_string()),
            email: Set(email.to_string()),
            password_hash: Set(None),
            created_at: Set(Utc::now().into()),
            last_login_at: Set(None),
        },
    )
    .await
    .unwrap();
    user.id
}

/// A user owning a new organization, acting inside it.
pub async fn owner_with_org(db: &DatabaseConnection, email: &str) -> Actor {
    let user_id = create_user(db, email).await;
    let org = orgs::create(
        db,
        user_id,
        CreateOrganization {
            name: Some(format!("{email} org")),
        },
    )
    .await
    .unwrap();
    Actor::new(user_id, Some(org.id))
}

/// The seeded "Sales" pipeline of the actor's organization.
pub async fn default_pipeline(db: &DatabaseConnection, actor: &Actor) -> PipelineDto {
    pipelines::list(db, actor)
        .await
        .unwrap()
        .into_iter()
        .next()
        .expect("seeded pipeline")
}

pub fn stage<'a>(pipeline: &'a PipelineDto, name: &str) -> &'a DealStageDto {
    pipeline
        .deal_stages
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("stage {name} missing"))
}

pub fn domain_err<T: std::fmt::Debug>(result: Result<T, CrmError>) -> DomainError {
    match result {
        Err(err) => err
            .domain()
            .cloned()
            .unwrap_or_else(|| panic!("expected domain error, got {err}")),
        Ok(value) => panic!("expected error, got {value:?}"),
    }
}
