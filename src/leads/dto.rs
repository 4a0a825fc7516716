use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    offers::store::OfferCode,
    validation::{is_valid_email, present, require_email},
};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: Option<String>,
    pub message: Option<String>,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NewsletterSubscriber {
    pub id: Uuid,
    pub email: String,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Row returned by a status patch, shaped like the table it came from.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PatchedLead {
    Appointment(Appointment),
    Offer(OfferCode),
    Newsletter(NewsletterSubscriber),
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service: Option<String>,
    pub message: Option<String>,
}

impl AppointmentRequest {
    pub fn validate(self) -> ApiResult<NewAppointment> {
        let (Some(name), Some(email), Some(phone)) = (
            present(self.name.as_deref()),
            present(self.email.as_deref()),
            present(self.phone.as_deref()),
        ) else {
            return Err(ApiError::invalid("Name, email, and phone are required"));
        };
        let email = email.to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::invalid("Invalid email"));
        }
        Ok(NewAppointment {
            name: name.to_string(),
            email,
            phone: phone.to_string(),
            service: present(self.service.as_deref()).map(str::to_string),
            message: present(self.message.as_deref()).map(str::to_string),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsletterRequest {
    pub email: Option<String>,
}

impl NewsletterRequest {
    pub fn validate(self) -> ApiResult<String> {
        require_email(self.email.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentQuery {
    pub filter: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsletterQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentList {
    pub total: usize,
    pub new: usize,
    pub booked: usize,
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Serialize)]
pub struct NewsletterList {
    pub total: usize,
    pub subscribed: usize,
    pub subscribers: Vec<NewsletterSubscriber>,
}
