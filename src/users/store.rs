use async_trait::async_trait;
use uuid::Uuid;

use super::dto::AdminUser;
use crate::auth::gate::Role;

/// The `admin_users` table: one role row per provisioned back-office user.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Newest first.
    async fn list(&self) -> anyhow::Result<Vec<AdminUser>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<AdminUser>>;
    async fn insert(&self, email: &str, role: Role, auth_user_id: Uuid) -> anyhow::Result<AdminUser>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn admin_exists(&self) -> anyhow::Result<bool>;
}
