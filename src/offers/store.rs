use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A discount code tied to one email address.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OfferCode {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub is_used: bool,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub used_at: Option<OffsetDateTime>,
}

#[derive(Debug)]
pub enum InsertOutcome {
    Created(OfferCode),
    /// The email already holds a code.
    EmailTaken,
    /// Another signup claimed the same code between check and insert.
    CodeTaken,
}

#[derive(Debug)]
pub enum Redemption {
    Redeemed(OfferCode),
    AlreadyUsed(OfferCode),
    Missing,
}

#[async_trait]
pub trait OfferStore: Send + Sync {
    async fn code_exists(&self, code: &str) -> anyhow::Result<bool>;
    async fn insert(&self, email: &str, code: &str) -> anyhow::Result<InsertOutcome>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<OfferCode>>;
    async fn find_by_code(&self, code: &str) -> anyhow::Result<Option<OfferCode>>;
    /// Flips `is_used` once; an already used code is reported, not rewritten.
    async fn redeem(&self, id: Uuid) -> anyhow::Result<Redemption>;
    /// Newest first, optionally filtered by a case-insensitive email fragment.
    async fn list(&self, search: Option<&str>) -> anyhow::Result<Vec<OfferCode>>;
}
