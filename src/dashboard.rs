use anyhow::Context;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use crate::{
    auth::{
        extractors::AuthUser,
        gate::{AuthorizationGate, Role},
    },
    blogs::dto::BlogPost,
    error::ApiResult,
    leads::Appointment,
    state::AppState,
};

const RECENT_LIMIT: i64 = 5;

#[derive(Debug, Default, Serialize, FromRow)]
pub struct Counts {
    pub blogs: i64,
    pub appointments: i64,
    pub new_appointments: i64,
    pub newsletters: i64,
    pub offers: i64,
    pub used_offers: i64,
    pub admin_users: i64,
}

#[derive(Debug, Serialize)]
pub struct Overview {
    pub role: Role,
    pub counts: Counts,
    pub recent_blogs: Vec<BlogPost>,
    pub recent_appointments: Vec<Appointment>,
}

async fn counts(db: &PgPool) -> anyhow::Result<Counts> {
    sqlx::query_as::<_, Counts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM blogs)                                    AS blogs,
            (SELECT COUNT(*) FROM appointment_emails)                       AS appointments,
            (SELECT COUNT(*) FROM appointment_emails WHERE status = 'new')  AS new_appointments,
            (SELECT COUNT(*) FROM newsletter_emails)                        AS newsletters,
            (SELECT COUNT(*) FROM offer_emails)                             AS offers,
            (SELECT COUNT(*) FROM offer_emails WHERE is_used)               AS used_offers,
            (SELECT COUNT(*) FROM admin_users)                              AS admin_users
        "#,
    )
    .fetch_one(db)
    .await
    .context("dashboard counts")
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(overview))
}

#[instrument(skip(state, identity))]
pub async fn overview(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> ApiResult<Json<Overview>> {
    let role = AuthorizationGate::new(state.directory.as_ref())
        .effective_role(&identity)
        .await?;
    Ok(Json(Overview {
        role,
        counts: counts(&state.db).await?,
        recent_blogs: state.blogs.recent(RECENT_LIMIT).await?,
        recent_appointments: state.leads.recent_appointments(RECENT_LIMIT).await?,
    }))
}
