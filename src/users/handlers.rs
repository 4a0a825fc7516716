use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{AdminUser, CreateUserRequest, DeletedResponse, UserList},
    services::AdminAccounts,
};
use crate::{
    auth::extractors::RequireAdmin,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

fn accounts(state: &AppState) -> AdminAccounts<'_> {
    AdminAccounts::new(state.identities.as_ref(), state.admins.as_ref())
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", delete(delete_user))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> ApiResult<Json<UserList>> {
    let users = state.admins.list().await?;
    let admins = users.iter().filter(|u| u.role == "admin").count();
    Ok(Json(UserList {
        admins,
        staff: users.len() - admins,
        users,
    }))
}

#[instrument(skip(state, _admin, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> ApiResult<Json<AdminUser>> {
    let new = payload.validate()?;
    Ok(Json(accounts(&state).provision(new).await?))
}

#[instrument(skip(state, _admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeletedResponse>> {
    accounts(&state).remove(id).await?;
    Ok(Json(DeletedResponse { success: true }))
}
