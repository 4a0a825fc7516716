use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    dto::{BlogFields, BlogPost},
    store::{BlogStore, BlogUpdate, BlogWrite},
};
use crate::db::is_unique_violation;

const COLUMNS: &str = "id, slug, title, excerpt, content, author, date, category, image, \
                       read_time, tags, created_at, updated_at";
const SLUG_KEY: &str = "blogs_slug_key";

pub struct PgBlogStore {
    db: PgPool,
}

impl PgBlogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlogStore for PgBlogStore {
    async fn list(&self) -> anyhow::Result<Vec<BlogPost>> {
        let rows = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {COLUMNS} FROM blogs ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list blog posts")?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<BlogPost>> {
        let row =
            sqlx::query_as::<_, BlogPost>(&format!("SELECT {COLUMNS} FROM blogs WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.db)
                .await
                .context("get blog post")?;
        Ok(row)
    }

    async fn create(&self, f: &BlogFields) -> anyhow::Result<BlogWrite> {
        let res = sqlx::query_as::<_, BlogPost>(&format!(
            r#"
            INSERT INTO blogs (slug, title, excerpt, content, author, date, category, image, read_time, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&f.slug)
        .bind(&f.title)
        .bind(&f.excerpt)
        .bind(&f.content)
        .bind(&f.author)
        .bind(f.date)
        .bind(&f.category)
        .bind(&f.image)
        .bind(&f.read_time)
        .bind(&f.tags)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(post) => Ok(BlogWrite::Created(post)),
            Err(e) if is_unique_violation(&e, SLUG_KEY) => Ok(BlogWrite::SlugTaken),
            Err(e) => Err(anyhow::Error::new(e).context("insert blog post")),
        }
    }

    async fn update(&self, id: Uuid, f: &BlogFields) -> anyhow::Result<BlogUpdate> {
        let mut tx = self.db.begin().await.context("begin blog update")?;
        let previous =
            sqlx::query_scalar::<_, String>("SELECT slug FROM blogs WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .context("lock blog post")?;
        let Some(previous_slug) = previous else {
            return Ok(BlogUpdate::Missing);
        };

        let res = sqlx::query_as::<_, BlogPost>(&format!(
            r#"
            UPDATE blogs
               SET slug = $2, title = $3, excerpt = $4, content = $5, author = $6, date = $7,
                   category = $8, image = $9, read_time = $10, tags = $11, updated_at = now()
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&f.slug)
        .bind(&f.title)
        .bind(&f.excerpt)
        .bind(&f.content)
        .bind(&f.author)
        .bind(f.date)
        .bind(&f.category)
        .bind(&f.image)
        .bind(&f.read_time)
        .bind(&f.tags)
        .fetch_one(&mut *tx)
        .await;

        let post = match res {
            Ok(post) => post,
            Err(e) if is_unique_violation(&e, SLUG_KEY) => return Ok(BlogUpdate::SlugTaken),
            Err(e) => return Err(anyhow::Error::new(e).context("update blog post")),
        };
        tx.commit().await.context("commit blog update")?;
        Ok(BlogUpdate::Updated {
            previous_slug,
            post,
        })
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<String>> {
        let slug =
            sqlx::query_scalar::<_, String>("DELETE FROM blogs WHERE id = $1 RETURNING slug")
                .bind(id)
                .fetch_optional(&self.db)
                .await
                .context("delete blog post")?;
        Ok(slug)
    }

    async fn recent(&self, limit: i64) -> anyhow::Result<Vec<BlogPost>> {
        let rows = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {COLUMNS} FROM blogs ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("recent blog posts")?;
        Ok(rows)
    }
}
