use async_trait::async_trait;
use uuid::Uuid;

use super::dto::{BlogFields, BlogPost};

#[derive(Debug)]
pub enum BlogWrite {
    Created(BlogPost),
    /// Another post already owns the slug.
    SlugTaken,
}

#[derive(Debug)]
pub enum BlogUpdate {
    /// Carries the slug the post had before the write so both URLs can be revalidated.
    Updated { previous_slug: String, post: BlogPost },
    SlugTaken,
    Missing,
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Newest first.
    async fn list(&self) -> anyhow::Result<Vec<BlogPost>>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<BlogPost>>;
    async fn create(&self, fields: &BlogFields) -> anyhow::Result<BlogWrite>;
    async fn update(&self, id: Uuid, fields: &BlogFields) -> anyhow::Result<BlogUpdate>;
    /// Slug of the removed post, `None` when no post has that id.
    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<String>>;
    async fn recent(&self, limit: i64) -> anyhow::Result<Vec<BlogPost>>;
}
