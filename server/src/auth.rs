//! Request extractors: bearer token identity and the tenant header.

use std::future::Future;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use crm::Actor;
use platform_api::ApiError;
use platform_authn::{Claims, decode_token};
use tracing::debug;
use uuid::Uuid;

use crate::http::AppState;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";
pub const API_KEY_HEADER: &str = "x-api-key";

/// Claims of a valid `Authorization: Bearer <jwt>` header.
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    #[allow(clippy::manual_async_fn)]
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let token = parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(bearer_token)
                .ok_or(ApiError::Unauthorized)?;
            let claims = decode_token(&state.tokens, token).map_err(|err| {
                debug!(error = %err, "bearer token rejected");
                ApiError::Unauthorized
            })?;
            Ok(AuthUser(claims))
        }
    }
}

/// Authenticated caller plus the optional `X-Organization-Id` tenant.
pub struct RequestActor(pub Actor);

impl FromRequestParts<AppState> for RequestActor {
    type Rejection = ApiError;

    #[allow(clippy::manual_async_fn)]
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
            let org_id = organization_id(parts)?;
            Ok(RequestActor(Actor::new(claims.sub, org_id)))
        }
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn organization_id(parts: &Parts) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = parts.headers.get(ORGANIZATION_HEADER) else {
        return Ok(None);
    };
    let raw = value.to_str().map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(raw)
        .map(Some)
        .map_err(|_| ApiError::InvalidInput("X-Organization-Id must be a UUID".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(name: &str, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[test]
    fn organization_header_must_be_a_uuid() {
        let id = Uuid::new_v4();
        let parts = parts_with("X-Organization-Id", &id.to_string());
        assert_eq!(organization_id(&parts).unwrap(), Some(id));

        let parts = parts_with("X-Organization-Id", "acme");
        assert!(matches!(organization_id(&parts), Err(ApiError::InvalidInput(_))));

        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert_eq!(organization_id(&parts).unwrap(), None);
    }
}
