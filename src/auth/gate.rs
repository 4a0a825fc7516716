//! Authorization policy shared by every route.
//!
//! Identity comes from the session token; the role comes from `admin_users`
//! and is re-read on every request. A valid identity without an
//! `admin_users` row reads as [`Role::Staff`] but may not mutate anything.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// An authenticated caller as known to the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// Read side of the session provider and role table.
#[async_trait]
pub trait AccessDirectory: Send + Sync {
    /// `None` when the identity never existed or has been revoked.
    async fn find_identity(&self, id: Uuid) -> anyhow::Result<Option<Identity>>;
    /// Role recorded in `admin_users` for the identity, if any row links to it.
    async fn find_role(&self, identity_id: Uuid) -> anyhow::Result<Option<Role>>;
}

pub struct AuthorizationGate<'a> {
    directory: &'a dyn AccessDirectory,
}

impl<'a> AuthorizationGate<'a> {
    pub fn new(directory: &'a dyn AccessDirectory) -> Self {
        Self { directory }
    }

    pub async fn require_authenticated(&self, subject: Option<Uuid>) -> ApiResult<Identity> {
        let Some(id) = subject else {
            return Err(ApiError::Unauthenticated);
        };
        match self.directory.find_identity(id).await? {
            Some(identity) => Ok(identity),
            None => {
                warn!(identity_id = %id, "session for unknown or revoked identity");
                Err(ApiError::Unauthenticated)
            }
        }
    }

    /// Fails with `Forbidden` when no role row exists, regardless of the read-side default.
    pub async fn require_role(&self, identity: &Identity, required: Role) -> ApiResult<()> {
        match self.directory.find_role(identity.id).await? {
            Some(role) if role == required => Ok(()),
            found => {
                warn!(
                    identity_id = %identity.id,
                    role = ?found,
                    required = %required,
                    "role check failed"
                );
                Err(ApiError::Forbidden)
            }
        }
    }

    /// Role used for read surfaces.
    pub async fn effective_role(&self, identity: &Identity) -> ApiResult<Role> {
        let role = self
            .directory
            .find_role(identity.id)
            .await?
            .unwrap_or(Role::Staff);
        debug!(identity_id = %identity.id, %role, "effective role resolved");
        Ok(role)
    }
}
