use axum::{
    extract::State,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        Appointment, AppointmentList, AppointmentQuery, AppointmentRequest, NewsletterList,
        NewsletterQuery, NewsletterRequest, NewsletterSubscriber, PatchedLead, SubmitResponse,
    },
    status::{AppointmentStatus, LeadPatch},
};
use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
    validation::present,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/submit/appointment", post(submit_appointment))
        .route("/submit/newsletter", post(submit_newsletter))
}

pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments))
        .route("/newsletters", get(list_newsletters))
        .route("/emails/:table/:id", patch(update_status))
}

#[instrument(skip(state, payload))]
pub async fn submit_appointment(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AppointmentRequest>,
) -> ApiResult<Json<SubmitResponse<Appointment>>> {
    let appointment = payload.validate()?;
    let row = state.leads.insert_appointment(&appointment).await?;
    info!(appointment_id = %row.id, "appointment request received");
    Ok(Json(SubmitResponse {
        success: true,
        data: row,
    }))
}

#[instrument(skip(state, payload))]
pub async fn submit_newsletter(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewsletterRequest>,
) -> ApiResult<Json<SubmitResponse<NewsletterSubscriber>>> {
    let email = payload.validate()?;
    let row = state.leads.subscribe(&email).await?;
    info!(subscriber_id = %row.id, "newsletter signup");
    Ok(Json(SubmitResponse {
        success: true,
        data: row,
    }))
}

#[instrument(skip(state, _identity))]
pub async fn list_appointments(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
    ApiQuery(q): ApiQuery<AppointmentQuery>,
) -> ApiResult<Json<AppointmentList>> {
    let status = AppointmentStatus::parse_filter(q.filter.as_deref())?;
    let appointments = state
        .leads
        .list_appointments(status, present(q.search.as_deref()))
        .await?;
    let count = |s: &str| appointments.iter().filter(|a| a.status == s).count();
    Ok(Json(AppointmentList {
        total: appointments.len(),
        new: count("new"),
        booked: count("booked"),
        appointments,
    }))
}

#[instrument(skip(state, _identity))]
pub async fn list_newsletters(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
    ApiQuery(q): ApiQuery<NewsletterQuery>,
) -> ApiResult<Json<NewsletterList>> {
    let subscribers = state.leads.list_newsletters(present(q.search.as_deref())).await?;
    Ok(Json(NewsletterList {
        total: subscribers.len(),
        subscribed: subscribers
            .iter()
            .filter(|s| s.status == "subscribed")
            .count(),
        subscribers,
    }))
}

/// PATCH /emails/:table/:id
#[instrument(skip(state, identity, body))]
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath((table, id)): ApiPath<(String, Uuid)>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<PatchedLead>> {
    let patch = LeadPatch::parse(&table, body)?;
    let row = state
        .leads
        .apply_patch(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))?;
    info!(%table, %id, ?patch, by = %identity.email, "lead status updated");
    Ok(Json(row))
}
