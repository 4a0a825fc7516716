use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{InsertOutcome, OfferCode, OfferStore, Redemption};
use crate::db::{contains_pattern, is_unique_violation};

const COLUMNS: &str = "id, email, code, is_used, status, created_at, used_at";

pub struct PgOfferStore {
    db: PgPool,
}

impl PgOfferStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<OfferCode>> {
        let row = sqlx::query_as::<_, OfferCode>(&format!(
            "SELECT {COLUMNS} FROM offer_emails WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find offer by id")?;
        Ok(row)
    }
}

#[async_trait]
impl OfferStore for PgOfferStore {
    async fn code_exists(&self, code: &str) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM offer_emails WHERE code = $1)",
        )
        .bind(code)
        .fetch_one(&self.db)
        .await
        .context("check offer code")?;
        Ok(exists)
    }

    async fn insert(&self, email: &str, code: &str) -> anyhow::Result<InsertOutcome> {
        let res = sqlx::query_as::<_, OfferCode>(&format!(
            r#"
            INSERT INTO offer_emails (email, code, is_used)
            VALUES ($1, $2, FALSE)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(email)
        .bind(code)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(row) => Ok(InsertOutcome::Created(row)),
            Err(e) if is_unique_violation(&e, "offer_emails_email_key") => {
                Ok(InsertOutcome::EmailTaken)
            }
            Err(e) if is_unique_violation(&e, "offer_emails_code_key") => {
                Ok(InsertOutcome::CodeTaken)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert offer code")),
        }
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<OfferCode>> {
        let row = sqlx::query_as::<_, OfferCode>(&format!(
            "SELECT {COLUMNS} FROM offer_emails WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find offer by email")?;
        Ok(row)
    }

    async fn find_by_code(&self, code: &str) -> anyhow::Result<Option<OfferCode>> {
        let row = sqlx::query_as::<_, OfferCode>(&format!(
            "SELECT {COLUMNS} FROM offer_emails WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.db)
        .await
        .context("find offer by code")?;
        Ok(row)
    }

    async fn redeem(&self, id: Uuid) -> anyhow::Result<Redemption> {
        let updated = sqlx::query_as::<_, OfferCode>(&format!(
            r#"
            UPDATE offer_emails
               SET is_used = TRUE, used_at = now()
             WHERE id = $1 AND is_used = FALSE
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("redeem offer code")?;

        if let Some(row) = updated {
            return Ok(Redemption::Redeemed(row));
        }
        Ok(match self.find_by_id(id).await? {
            Some(row) => Redemption::AlreadyUsed(row),
            None => Redemption::Missing,
        })
    }

    async fn list(&self, search: Option<&str>) -> anyhow::Result<Vec<OfferCode>> {
        let rows = sqlx::query_as::<_, OfferCode>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM offer_emails
            WHERE $1::text IS NULL OR email ILIKE $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(search.map(contains_pattern))
        .fetch_all(&self.db)
        .await
        .context("list offer codes")?;
        Ok(rows)
    }
}
