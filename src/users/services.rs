use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    dto::{AdminUser, NewAdmin},
    store::AdminStore,
};
use crate::{
    auth::{gate::Role, password::hash_password, repo::IdentityStore},
    config::BootstrapAdmin,
    error::{ApiError, ApiResult},
};

/// Keeps login identities and `admin_users` role rows in step.
pub struct AdminAccounts<'a> {
    identities: &'a dyn IdentityStore,
    admins: &'a dyn AdminStore,
}

impl<'a> AdminAccounts<'a> {
    pub fn new(identities: &'a dyn IdentityStore, admins: &'a dyn AdminStore) -> Self {
        Self { identities, admins }
    }

    /// Creates the login identity, then the role row linking to it.
    /// A failure between the two steps leaves an identity without a role row,
    /// which the gate treats as read-only staff.
    pub async fn provision(&self, new: NewAdmin) -> ApiResult<AdminUser> {
        let hash = hash_password(&new.password)?;
        let identity = self
            .identities
            .create(&new.email, &hash)
            .await?
            .ok_or_else(|| ApiError::Conflict("A user with this email already exists".into()))?;
        let user = self.admins.insert(&new.email, new.role, identity.id).await?;
        info!(user_id = %user.id, identity_id = %identity.id, role = %new.role, "admin user provisioned");
        Ok(user)
    }

    /// Deletes the role row, then revokes the linked identity. Revocation
    /// failures are logged and the removal still succeeds.
    pub async fn remove(&self, id: Uuid) -> ApiResult<AdminUser> {
        let user = self
            .admins
            .find(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        if !self.admins.delete(id).await? {
            return Err(ApiError::not_found("User not found"));
        }

        if let Some(identity_id) = user.auth_user_id {
            match self.identities.revoke(identity_id).await {
                Ok(true) => {}
                Ok(false) => warn!(%identity_id, "identity already gone"),
                Err(e) => error!(error = %format!("{e:#}"), %identity_id, "failed to revoke identity"),
            }
        }
        info!(user_id = %id, email = %user.email, "admin user removed");
        Ok(user)
    }

    /// Provisions the configured admin when no admin row exists yet.
    /// An identity that already exists for the email is linked rather than recreated.
    pub async fn ensure_bootstrap(&self, cfg: &BootstrapAdmin) -> anyhow::Result<()> {
        if self.admins.admin_exists().await? {
            return Ok(());
        }
        let email = cfg.email.trim().to_lowercase();

        let identity_id = match self.identities.find_by_email(&email).await? {
            Some(existing) => existing.id,
            None => {
                let hash = hash_password(&cfg.password)?;
                self.identities
                    .create(&email, &hash)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("bootstrap identity raced with another insert"))?
                    .id
            }
        };
        self.admins.insert(&email, Role::Admin, identity_id).await?;
        info!(%email, "bootstrap admin provisioned");
        Ok(())
    }
}
