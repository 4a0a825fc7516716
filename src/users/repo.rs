use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{dto::AdminUser, store::AdminStore};
use crate::auth::gate::Role;

const COLUMNS: &str = "id, email, role, auth_user_id, created_at";

pub struct PgAdminStore {
    db: PgPool,
}

impl PgAdminStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AdminStore for PgAdminStore {
    async fn list(&self) -> anyhow::Result<Vec<AdminUser>> {
        let rows = sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {COLUMNS} FROM admin_users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list admin users")?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<AdminUser>> {
        let row = sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {COLUMNS} FROM admin_users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find admin user")?;
        Ok(row)
    }

    async fn insert(&self, email: &str, role: Role, auth_user_id: Uuid) -> anyhow::Result<AdminUser> {
        let row = sqlx::query_as::<_, AdminUser>(&format!(
            r#"
            INSERT INTO admin_users (email, role, auth_user_id)
            VALUES ($1, $2, $3)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(email)
        .bind(role.as_str())
        .bind(auth_user_id)
        .fetch_one(&self.db)
        .await
        .context("insert admin user")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM admin_users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete admin user")?;
        Ok(res.rows_affected() > 0)
    }

    async fn admin_exists(&self) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM admin_users WHERE role = 'admin')",
        )
        .fetch_one(&self.db)
        .await
        .context("check for admin user")?;
        Ok(exists)
    }
}
