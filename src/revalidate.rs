use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::RevalidateConfig;

/// Invalidates cached public pages after content changes.
#[async_trait]
pub trait PageRevalidator: Send + Sync {
    async fn revalidate(&self, paths: &[String]) -> anyhow::Result<()>;
}

/// Fire-and-log wrapper used by handlers; revalidation never fails a write.
pub async fn revalidate_best_effort(revalidator: &dyn PageRevalidator, paths: Vec<String>) {
    if let Err(e) = revalidator.revalidate(&paths).await {
        warn!(error = %format!("{e:#}"), ?paths, "page revalidation failed");
    }
}

#[derive(Serialize)]
struct RevalidateRequest<'a> {
    paths: &'a [String],
}

pub struct WebhookRevalidator {
    http: Client,
    url: String,
    secret: Option<String>,
}

impl WebhookRevalidator {
    pub fn new(cfg: &RevalidateConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("build revalidation http client")?;
        Ok(Self {
            http,
            url: cfg.url.clone(),
            secret: cfg.secret.clone(),
        })
    }
}

#[async_trait]
impl PageRevalidator for WebhookRevalidator {
    async fn revalidate(&self, paths: &[String]) -> anyhow::Result<()> {
        let mut req = self.http.post(&self.url).json(&RevalidateRequest { paths });
        if let Some(secret) = &self.secret {
            req = req.header("x-revalidate-secret", secret);
        }
        req.send()
            .await
            .context("send revalidation request")?
            .error_for_status()
            .context("revalidation webhook rejected request")?;
        debug!(?paths, "pages revalidated");
        Ok(())
    }
}

/// Used when no webhook is configured.
pub struct NoopRevalidator;

#[async_trait]
impl PageRevalidator for NoopRevalidator {
    async fn revalidate(&self, paths: &[String]) -> anyhow::Result<()> {
        debug!(?paths, "revalidation webhook not configured; skipping");
        Ok(())
    }
}
