use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    validation::present,
};

time::serde::format_description!(blog_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BlogPost {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    #[serde(with = "blog_date")]
    pub date: Date,
    pub category: String,
    pub image: String,
    pub read_time: Option<String>,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Body of create and update requests. The dashboard sends `readTime`.
#[derive(Debug, Default, Deserialize)]
pub struct BlogRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    #[serde(alias = "readTime")]
    pub read_time: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A validated blog write.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogFields {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    pub date: Date,
    pub category: String,
    pub image: String,
    pub read_time: Option<String>,
    pub tags: Vec<String>,
}

fn owned(value: Option<&str>) -> String {
    present(value).unwrap_or_default().to_string()
}

impl BlogRequest {
    pub fn validate(self) -> ApiResult<BlogFields> {
        let slug = present(self.slug.as_deref())
            .ok_or_else(|| ApiError::invalid("Slug is required"))?
            .to_lowercase();
        if slug.contains(char::is_whitespace) || slug.contains('/') {
            return Err(ApiError::invalid("Slug may not contain spaces or slashes"));
        }
        let title = present(self.title.as_deref())
            .ok_or_else(|| ApiError::invalid("Title is required"))?
            .to_string();
        let content = present(self.content.as_deref())
            .ok_or_else(|| ApiError::invalid("Content is required"))?
            .to_string();

        let date = match present(self.date.as_deref()) {
            Some(raw) => Date::parse(
                raw,
                time::macros::format_description!("[year]-[month]-[day]"),
            )
            .map_err(|_| ApiError::invalid("Date must be YYYY-MM-DD"))?,
            None => OffsetDateTime::now_utc().date(),
        };

        let tags = self
            .tags
            .iter()
            .filter_map(|t| present(Some(t.as_str())))
            .map(str::to_string)
            .collect();

        Ok(BlogFields {
            slug,
            title,
            excerpt: owned(self.excerpt.as_deref()),
            content,
            author: owned(self.author.as_deref()),
            date,
            category: owned(self.category.as_deref()),
            image: owned(self.image.as_deref()),
            read_time: present(self.read_time.as_deref()).map(str::to_string),
            tags,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}
