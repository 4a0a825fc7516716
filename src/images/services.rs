use bytes::Bytes;
use rand::Rng;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    storage::StorageClient,
};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const NAME_SUFFIX_LEN: usize = 7;
const BASE36_LOWER: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub struct UploadItem<'a> {
    pub body: Bytes,
    pub content_type: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub url: String,
    pub path: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Checks type and size, returning the file extension to store under.
pub fn validate_image(item: &UploadItem<'_>) -> ApiResult<&'static str> {
    let ext = ext_from_mime(item.content_type).ok_or_else(|| {
        ApiError::invalid("Invalid file type. Only JPEG, PNG, WebP, and GIF are allowed.")
    })?;
    if item.body.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::invalid(
            "File size too large. Maximum size is 5MB.",
        ));
    }
    Ok(ext)
}

/// `<unix millis>-<7 random base36 chars>.<ext>`
fn object_name(ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..NAME_SUFFIX_LEN)
        .map(|_| BASE36_LOWER[rng.gen_range(0..BASE36_LOWER.len())] as char)
        .collect();
    format!("{millis}-{suffix}.{ext}")
}

pub async fn upload_blog_image(
    storage: &dyn StorageClient,
    item: UploadItem<'_>,
) -> ApiResult<UploadedImage> {
    let ext = validate_image(&item)?;
    let key = object_name(ext);
    let size = item.body.len();
    storage.put_object(&key, item.body, item.content_type).await?;
    info!(%key, size, content_type = item.content_type, "blog image uploaded");
    Ok(UploadedImage {
        url: storage.public_url(&key),
        path: key,
    })
}

#[cfg(test)]
mod image_tests {
    use super::*;
    use crate::testing::FakeStorage;

    fn item(len: usize, ct: &str) -> UploadItem<'_> {
        UploadItem {
            body: Bytes::from(vec![0u8; len]),
            content_type: ct,
        }
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/gif"), Some("gif"));
        assert_eq!(ext_from_mime("image/bmp"), None);
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn validate_enforces_type_and_size() {
        assert_eq!(validate_image(&item(2 * 1024 * 1024, "image/png")).unwrap(), "png");
        assert_eq!(validate_image(&item(MAX_IMAGE_BYTES, "image/gif")).unwrap(), "gif");
        assert!(validate_image(&item(6 * 1024 * 1024, "image/png")).is_err());
        assert!(validate_image(&item(1024, "image/bmp")).is_err());
    }

    #[test]
    fn object_names_are_timestamped() {
        let name = object_name("webp");
        let (stamp, rest) = name.split_once('-').unwrap();
        assert!(stamp.parse::<i64>().unwrap() > 1_600_000_000_000);
        let (suffix, ext) = rest.split_once('.').unwrap();
        assert_eq!(suffix.len(), NAME_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| BASE36_LOWER.contains(&b)));
        assert_eq!(ext, "webp");
    }

    #[tokio::test]
    async fn upload_stores_object_and_returns_public_url() {
        let storage = FakeStorage::default();
        let uploaded = upload_blog_image(&storage, item(2048, "image/jpeg"))
            .await
            .unwrap();
        assert!(uploaded.path.ends_with(".jpg"));
        assert_eq!(uploaded.url, format!("https://cdn.test/blog-images/{}", uploaded.path));
        assert_eq!(storage.keys(), vec![uploaded.path]);
    }

    #[tokio::test]
    async fn rejected_upload_stores_nothing() {
        let storage = FakeStorage::default();
        assert!(upload_blog_image(&storage, item(10, "image/bmp")).await.is_err());
        assert!(storage.keys().is_empty());
    }
}
