//! Closed set of status edits the dashboard may apply to lead rows.
//!
//! `PATCH /emails/:table/:id` names a table and sends a JSON body. Only the
//! tables and values listed here are accepted; everything else is rejected
//! before a query is built.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    New,
    Contacted,
    Booked,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    #[default]
    New,
    CodeSent,
    CodeUsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NewsletterStatus {
    #[default]
    Subscribed,
    Unsubscribed,
}

impl AppointmentStatus {
    /// Parses a list filter value. Blank and `all` mean no filter.
    pub fn parse_filter(raw: Option<&str>) -> ApiResult<Option<Self>> {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(v) => serde_json::from_value(serde_json::Value::String(v.to_string()))
                .map(Some)
                .map_err(|_| ApiError::invalid(format!("Unknown status filter \"{v}\""))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StatusBody<S> {
    status: S,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadPatch {
    Appointment(AppointmentStatus),
    Offer(OfferStatus),
    Newsletter(NewsletterStatus),
}

fn status_from<S: DeserializeOwned>(body: serde_json::Value) -> ApiResult<S> {
    serde_json::from_value::<StatusBody<S>>(body)
        .map(|b| b.status)
        .map_err(|e| ApiError::invalid(format!("Invalid update: {e}")))
}

impl LeadPatch {
    pub fn parse(table: &str, body: serde_json::Value) -> ApiResult<Self> {
        match table {
            "appointment_emails" => status_from(body).map(Self::Appointment),
            "offer_emails" => status_from(body).map(Self::Offer),
            "newsletter_emails" => status_from(body).map(Self::Newsletter),
            other => Err(ApiError::not_found(format!("Unknown table \"{other}\""))),
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::Appointment(_) => "appointment_emails",
            Self::Offer(_) => "offer_emails",
            Self::Newsletter(_) => "newsletter_emails",
        }
    }
}
