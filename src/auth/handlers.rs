use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, MeResponse, RefreshRequest},
    extractors::AuthUser,
    gate::{AuthorizationGate, Identity},
    jwt::JwtKeys,
    password::{verify_decoy, verify_password},
};
use crate::{
    error::{ApiError, ApiResult},
    extract::ApiJson,
    state::AppState,
    validation::{present, require_email},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

async fn session_response(state: &AppState, identity: Identity) -> ApiResult<AuthResponse> {
    let role = AuthorizationGate::new(state.directory.as_ref())
        .effective_role(&identity)
        .await?;
    let tokens = JwtKeys::from_ref(state).sign_pair(identity.id)?;
    Ok(AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: MeResponse {
            id: identity.id,
            email: identity.email,
            role,
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = require_email(payload.email.as_deref())?;
    let password =
        present(payload.password.as_deref()).ok_or_else(|| ApiError::invalid("Password is required"))?;

    let Some(record) = state.identities.find_by_email(&email).await? else {
        verify_decoy(password);
        warn!(%email, "login unknown email");
        return Err(ApiError::Unauthenticated);
    };
    if !verify_password(password, &record.password_hash)? {
        warn!(%email, identity_id = %record.id, "login invalid password");
        return Err(ApiError::Unauthenticated);
    }

    info!(identity_id = %record.id, %email, "logged in");
    let identity = Identity {
        id: record.id,
        email: record.email,
    };
    Ok(Json(session_response(&state, identity).await?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let claims = JwtKeys::from_ref(&state)
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            ApiError::Unauthenticated
        })?;
    let identity = AuthorizationGate::new(state.directory.as_ref())
        .require_authenticated(Some(claims.sub))
        .await?;
    Ok(Json(session_response(&state, identity).await?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> ApiResult<Json<MeResponse>> {
    let role = AuthorizationGate::new(state.directory.as_ref())
        .effective_role(&identity)
        .await?;
    Ok(Json(MeResponse {
        id: identity.id,
        email: identity.email,
        role,
    }))
}
