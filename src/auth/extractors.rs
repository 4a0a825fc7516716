use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::{
    gate::{AuthorizationGate, Identity, Role},
    jwt::JwtKeys,
};
use crate::{error::ApiError, state::AppState};

/// Any caller holding a valid session.
pub struct AuthUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let subject = JwtKeys::from_ref(state).session_subject(&parts.headers);
        let identity = AuthorizationGate::new(state.directory.as_ref())
            .require_authenticated(subject)
            .await?;
        Ok(AuthUser(identity))
    }
}

/// Caller holding a valid session whose `admin_users` role is admin.
///
/// Authentication is resolved first, so an anonymous caller always sees 401, never 403.
pub struct RequireAdmin(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        AuthorizationGate::new(state.directory.as_ref())
            .require_role(&identity, Role::Admin)
            .await?;
        Ok(RequireAdmin(identity))
    }
}
