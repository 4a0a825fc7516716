//! Offer code issuance.
//!
//! Uniqueness is checked before insert and backed by the table's unique
//! constraints; two concurrent signups drawing the same suffix can still
//! race past the check, which surfaces as a `Conflict`.

use tracing::{debug, info, warn};

use super::{
    code::generate_code,
    store::{InsertOutcome, OfferCode, OfferStore},
};
use crate::{
    error::{ApiError, ApiResult},
    validation::require_email,
};

pub const MAX_ATTEMPTS: usize = 10;

pub struct UniqueCodeIssuer<'a> {
    store: &'a dyn OfferStore,
}

impl<'a> UniqueCodeIssuer<'a> {
    pub fn new(store: &'a dyn OfferStore) -> Self {
        Self { store }
    }

    /// Issues a code for `email`, or returns the one it already holds.
    pub async fn issue(&self, email: Option<&str>) -> ApiResult<OfferCode> {
        let email = require_email(email)?;
        let code = self.unclaimed_code().await?;

        match self.store.insert(&email, &code).await? {
            InsertOutcome::Created(offer) => {
                info!(offer_id = %offer.id, %email, code = %offer.code, "offer code issued");
                Ok(offer)
            }
            InsertOutcome::EmailTaken => {
                debug!(%email, "email already signed up; returning existing code");
                self.store.find_by_email(&email).await?.ok_or_else(|| {
                    ApiError::Conflict("Email already signed up".into())
                })
            }
            InsertOutcome::CodeTaken => {
                warn!(%code, "offer code claimed concurrently");
                Err(ApiError::Conflict("Offer code collided, please retry".into()))
            }
        }
    }

    async fn unclaimed_code(&self) -> ApiResult<String> {
        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = generate_code(&mut rand::thread_rng());
            if !self.store.code_exists(&candidate).await? {
                return Ok(candidate);
            }
            debug!(attempt, %candidate, "offer code already taken");
        }
        warn!(attempts = MAX_ATTEMPTS, "offer code space exhausted");
        Err(ApiError::CodeGenerationExhausted)
    }
}
