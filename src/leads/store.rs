use async_trait::async_trait;
use uuid::Uuid;

use super::{
    dto::{Appointment, NewAppointment, NewsletterSubscriber, PatchedLead},
    status::{AppointmentStatus, LeadPatch},
};

/// Appointment requests and newsletter signups, plus status edits across the lead tables.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert_appointment(&self, appointment: &NewAppointment) -> anyhow::Result<Appointment>;
    /// Subscribes `email`, reactivating an earlier unsubscribe. Returns the single row for that email.
    async fn subscribe(&self, email: &str) -> anyhow::Result<NewsletterSubscriber>;
    /// Newest first. `search` matches email, name or phone, case-insensitively.
    async fn list_appointments(
        &self,
        status: Option<AppointmentStatus>,
        search: Option<&str>,
    ) -> anyhow::Result<Vec<Appointment>>;
    async fn list_newsletters(&self, search: Option<&str>) -> anyhow::Result<Vec<NewsletterSubscriber>>;
    async fn recent_appointments(&self, limit: i64) -> anyhow::Result<Vec<Appointment>>;
    /// `None` when no row in the patched table has that id.
    async fn apply_patch(&self, id: Uuid, patch: LeadPatch) -> anyhow::Result<Option<PatchedLead>>;
}
