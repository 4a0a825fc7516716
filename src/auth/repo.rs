use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::gate::{AccessDirectory, Identity, Role};

/// Identity record owned by the session provider.
#[derive(Debug, Clone, FromRow)]
pub struct IdentityRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

/// Write side of the session provider: credentials and revocation.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<IdentityRecord>>;
    /// `None` when the email is already registered.
    async fn create(&self, email: &str, password_hash: &str)
        -> anyhow::Result<Option<IdentityRecord>>;
    /// Revokes an identity; its outstanding tokens stop resolving. `false` when it was already gone.
    async fn revoke(&self, id: Uuid) -> anyhow::Result<bool>;
}

pub struct PgDirectory {
    db: PgPool,
}

impl PgDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccessDirectory for PgDirectory {
    async fn find_identity(&self, id: Uuid) -> anyhow::Result<Option<Identity>> {
        let row = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, email FROM identities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find identity")?;
        Ok(row.map(|(id, email)| Identity { id, email }))
    }

    async fn find_role(&self, identity_id: Uuid) -> anyhow::Result<Option<Role>> {
        let role = sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM admin_users
            WHERE auth_user_id = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(identity_id)
        .fetch_optional(&self.db)
        .await
        .context("find role")?;

        role.map(|r| r.parse::<Role>().map_err(anyhow::Error::msg))
            .transpose()
    }
}

#[async_trait]
impl IdentityStore for PgDirectory {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<IdentityRecord>> {
        let row = sqlx::query_as::<_, IdentityRecord>(
            r#"
            SELECT id, email, password_hash
            FROM identities
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find identity by email")?;
        Ok(row)
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<IdentityRecord>> {
        let row = sqlx::query_as::<_, IdentityRecord>(
            r#"
            INSERT INTO identities (email, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password_hash
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await
        .context("insert identity")?;
        Ok(row)
    }

    async fn revoke(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete identity")?;
        Ok(res.rows_affected() > 0)
    }
}
