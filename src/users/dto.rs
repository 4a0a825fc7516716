use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{gate::Role, password::check_new_password},
    error::{ApiError, ApiResult},
    validation::{present, require_email},
};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub auth_user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl CreateUserRequest {
    pub fn validate(self) -> ApiResult<NewAdmin> {
        let email = require_email(self.email.as_deref())?;
        let password = self.password.unwrap_or_default();
        check_new_password(&password)?;
        let role = match present(self.role.as_deref()) {
            None => Role::Staff,
            Some(r) => r.parse::<Role>().map_err(ApiError::InvalidInput)?,
        };
        Ok(NewAdmin {
            email,
            password,
            role,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub admins: usize,
    pub staff: usize,
    pub users: Vec<AdminUser>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}
