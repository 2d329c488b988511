use chrono::{DateTime, FixedOffset, Utc};
use entity::users;
use platform_authn::{TokenConfig, hash_password, issue_token, verify_password};
use sea_orm::ActiveValue::Set;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{CrmResult, DomainError};
use crate::repo::{self, now};
use crate::validation::{is_valid_email, non_blank};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const NAME_MAX_LEN: usize = 200;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<FixedOffset>,
    pub last_login_at: Option<DateTime<FixedOffset>>,
}

impl From<users::Model> for UserDto {
    fn from(m: users::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            created_at: m.created_at,
            last_login_at: m.last_login_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserDto,
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn respond(tokens: &TokenConfig, user: users::Model) -> CrmResult<AuthResponse> {
    let issued = issue_token(tokens, user.id, &user.email)?;
    Ok(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: user.into(),
    })
}

pub async fn register(
    db: &DatabaseConnection,
    tokens: &TokenConfig,
    input: RegisterRequest,
) -> CrmResult<AuthResponse> {
    let name = non_blank(input.name.as_deref()).ok_or(DomainError::AuthNameRequired)?;
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "Name must be at most {NAME_MAX_LEN} characters"
        ))
        .into());
    }
    let email = input
        .email
        .as_deref()
        .map(repo::users::normalize_email)
        .filter(|e| is_valid_email(e))
        .ok_or(DomainError::AuthEmailInvalid)?;
    let password = input.password.unwrap_or_default();
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::PasswordTooWeak.into());
    }
    if repo::users::find_by_email(db, &email).await?.is_some() {
        return Err(DomainError::EmailAlreadyExists.into());
    }

    let user = repo::users::insert(
        db,
        users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            email: Set(email),
            password_hash: Set(Some(hash_password(&password)?)),
            created_at: Set(now()),
            last_login_at: Set(None),
        },
    )
    .await?;
    info!(user_id = %user.id, "user registered");
    respond(tokens, user)
}

/// Unknown email, missing hash and wrong password all fail the same way.
pub async fn login(
    db: &DatabaseConnection,
    tokens: &TokenConfig,
    input: LoginRequest,
) -> CrmResult<AuthResponse> {
    let email = input.email.unwrap_or_default();
    let password = input.password.unwrap_or_default();
    let user = repo::users::find_by_email(db, &email)
        .await?
        .ok_or(DomainError::InvalidCredentials)?;
    let verified = user
        .password_hash
        .as_deref()
        .is_some_and(|hash| verify_password(&password, hash));
    if !verified {
        return Err(DomainError::InvalidCredentials.into());
    }

    let mut active: users::ActiveModel = user.into();
    active.last_login_at = Set(Some(now()));
    let user = repo::users::update(db, active).await?;
    info!(user_id = %user.id, "user logged in");
    respond(tokens, user)
}

pub async fn me(db: &DatabaseConnection, user_id: Uuid) -> CrmResult<UserDto> {
    repo::users::find(db, user_id)
        .await?
        .map(UserDto::from)
        .ok_or_else(|| DomainError::UserNotFound.into())
}
