use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    dto::{Appointment, NewAppointment, NewsletterSubscriber, PatchedLead},
    status::{AppointmentStatus, LeadPatch},
    store::LeadStore,
};
use crate::{db::contains_pattern, offers::store::OfferCode};

const APPOINTMENT_COLUMNS: &str = "id, name, email, phone, service, message, status, created_at";
const NEWSLETTER_COLUMNS: &str = "id, email, status, created_at";
const OFFER_COLUMNS: &str = "id, email, code, is_used, status, created_at, used_at";

pub struct PgLeadStore {
    db: PgPool,
}

impl PgLeadStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn insert_appointment(&self, a: &NewAppointment) -> anyhow::Result<Appointment> {
        let row = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            INSERT INTO appointment_emails (name, email, phone, service, message, status)
            VALUES ($1, $2, $3, $4, $5, 'new')
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        ))
        .bind(&a.name)
        .bind(&a.email)
        .bind(&a.phone)
        .bind(&a.service)
        .bind(&a.message)
        .fetch_one(&self.db)
        .await
        .context("insert appointment")?;
        Ok(row)
    }

    async fn subscribe(&self, email: &str) -> anyhow::Result<NewsletterSubscriber> {
        let row = sqlx::query_as::<_, NewsletterSubscriber>(&format!(
            r#"
            INSERT INTO newsletter_emails (email)
            VALUES ($1)
            ON CONFLICT (email) DO UPDATE SET status = 'subscribed'
            RETURNING {NEWSLETTER_COLUMNS}
            "#
        ))
        .bind(email)
        .fetch_one(&self.db)
        .await
        .context("subscribe newsletter email")?;
        Ok(row)
    }

    async fn list_appointments(
        &self,
        status: Option<AppointmentStatus>,
        search: Option<&str>,
    ) -> anyhow::Result<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
              FROM appointment_emails
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::text IS NULL OR email ILIKE $2 OR name ILIKE $2 OR phone ILIKE $2)
             ORDER BY created_at DESC
            "#
        ))
        .bind(status)
        .bind(search.map(contains_pattern))
        .fetch_all(&self.db)
        .await
        .context("list appointments")?;
        Ok(rows)
    }

    async fn list_newsletters(&self, search: Option<&str>) -> anyhow::Result<Vec<NewsletterSubscriber>> {
        let rows = sqlx::query_as::<_, NewsletterSubscriber>(&format!(
            r#"
            SELECT {NEWSLETTER_COLUMNS}
              FROM newsletter_emails
             WHERE $1::text IS NULL OR email ILIKE $1
             ORDER BY created_at DESC
            "#
        ))
        .bind(search.map(contains_pattern))
        .fetch_all(&self.db)
        .await
        .context("list newsletter subscribers")?;
        Ok(rows)
    }

    async fn recent_appointments(&self, limit: i64) -> anyhow::Result<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointment_emails ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("recent appointments")?;
        Ok(rows)
    }

    async fn apply_patch(&self, id: Uuid, patch: LeadPatch) -> anyhow::Result<Option<PatchedLead>> {
        let table = patch.table();
        let row = match patch {
            LeadPatch::Appointment(status) => sqlx::query_as::<_, Appointment>(&format!(
                "UPDATE appointment_emails SET status = $2 WHERE id = $1 RETURNING {APPOINTMENT_COLUMNS}"
            ))
            .bind(id)
            .bind(status)
            .fetch_optional(&self.db)
            .await
            .map(|r| r.map(PatchedLead::Appointment)),
            LeadPatch::Offer(status) => sqlx::query_as::<_, OfferCode>(&format!(
                "UPDATE offer_emails SET status = $2 WHERE id = $1 RETURNING {OFFER_COLUMNS}"
            ))
            .bind(id)
            .bind(status)
            .fetch_optional(&self.db)
            .await
            .map(|r| r.map(PatchedLead::Offer)),
            LeadPatch::Newsletter(status) => sqlx::query_as::<_, NewsletterSubscriber>(&format!(
                "UPDATE newsletter_emails SET status = $2 WHERE id = $1 RETURNING {NEWSLETTER_COLUMNS}"
            ))
            .bind(id)
            .bind(status)
            .fetch_optional(&self.db)
            .await
            .map(|r| r.map(PatchedLead::Newsletter)),
        };
        row.with_context(|| format!("update {table} status"))
    }
}
