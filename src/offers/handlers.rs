use axum::{
    extract::State,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    code::normalize_code,
    dto::{OfferList, OfferSignupRequest, OfferSignupResponse, SearchQuery, ValidateQuery},
    issuer::UniqueCodeIssuer,
    store::{OfferCode, Redemption},
};
use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
    validation::present,
};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/submit/offer", post(submit_offer))
}

pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/offers", get(list_offers))
        .route("/codes/validate", get(validate_code))
        .route("/codes/:id/mark-used", patch(mark_used))
}

#[instrument(skip(state, payload))]
pub async fn submit_offer(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<OfferSignupRequest>,
) -> ApiResult<Json<OfferSignupResponse>> {
    let offer = UniqueCodeIssuer::new(state.offers.as_ref())
        .issue(payload.email.as_deref())
        .await?;
    Ok(Json(OfferSignupResponse {
        success: true,
        data: offer,
    }))
}

#[instrument(skip(state, identity))]
pub async fn validate_code(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiQuery(q): ApiQuery<ValidateQuery>,
) -> ApiResult<Json<OfferCode>> {
    let code = present(q.code.as_deref())
        .map(normalize_code)
        .ok_or_else(|| ApiError::invalid("Code is required"))?;

    match state.offers.find_by_code(&code).await? {
        Some(offer) => Ok(Json(offer)),
        None => {
            warn!(%code, checked_by = %identity.email, "offer code not found");
            Err(ApiError::not_found(format!("Code \"{code}\" not found")))
        }
    }
}

#[instrument(skip(state, identity))]
pub async fn mark_used(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<OfferCode>> {
    match state.offers.redeem(id).await? {
        Redemption::Redeemed(offer) => {
            info!(offer_id = %offer.id, code = %offer.code, redeemed_by = %identity.email, "offer code redeemed");
            Ok(Json(offer))
        }
        Redemption::AlreadyUsed(offer) => {
            warn!(offer_id = %offer.id, code = %offer.code, "offer code already redeemed");
            Err(ApiError::Conflict(format!(
                "Code \"{}\" has already been used",
                offer.code
            )))
        }
        Redemption::Missing => Err(ApiError::not_found("Offer code not found")),
    }
}

#[instrument(skip(state, _identity))]
pub async fn list_offers(
    State(state): State<AppState>,
    AuthUser(_identity): AuthUser,
    ApiQuery(q): ApiQuery<SearchQuery>,
) -> ApiResult<Json<OfferList>> {
    let offers = state.offers.list(present(q.search.as_deref())).await?;
    let used = offers.iter().filter(|o| o.is_used).count();
    Ok(Json(OfferList {
        used,
        unused: offers.len() - used,
        offers,
    }))
}
