use axum::{extract::State, routing::get, Json, Router};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{BlogPost, BlogRequest, DeletedResponse},
    store::{BlogUpdate, BlogWrite},
};
use crate::{
    auth::extractors::RequireAdmin,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    revalidate::revalidate_best_effort,
    state::AppState,
};

/// Reads are public; every write goes through [`RequireAdmin`].
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_blogs).post(create_blog))
        .route(
            "/blogs/:id",
            get(get_blog).put(update_blog).delete(delete_blog),
        )
}

/// Pages that render blog content, plus the post's own page for each slug given.
fn affected_paths<'a>(slugs: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut paths = vec!["/".to_string(), "/blog".to_string(), "/api/blogs".to_string()];
    for slug in slugs {
        let p = format!("/blog/{slug}");
        if !paths.contains(&p) {
            paths.push(p);
        }
    }
    paths
}

fn slug_taken() -> ApiError {
    ApiError::Conflict("A post with this slug already exists".into())
}

fn post_not_found() -> ApiError {
    ApiError::not_found("Blog post not found")
}

#[instrument(skip(state))]
pub async fn list_blogs(State(state): State<AppState>) -> ApiResult<Json<Vec<BlogPost>>> {
    Ok(Json(state.blogs.list().await?))
}

#[instrument(skip(state))]
pub async fn get_blog(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<BlogPost>> {
    state
        .blogs
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(post_not_found)
}

#[instrument(skip(state, admin, payload))]
pub async fn create_blog(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(payload): ApiJson<BlogRequest>,
) -> ApiResult<Json<BlogPost>> {
    let fields = payload.validate()?;
    let post = match state.blogs.create(&fields).await? {
        BlogWrite::Created(post) => post,
        BlogWrite::SlugTaken => return Err(slug_taken()),
    };
    info!(blog_id = %post.id, slug = %post.slug, by = %admin.email, "blog post created");
    revalidate_best_effort(state.revalidator.as_ref(), affected_paths([post.slug.as_str()])).await;
    Ok(Json(post))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_blog(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<BlogRequest>,
) -> ApiResult<Json<BlogPost>> {
    let fields = payload.validate()?;
    let (previous_slug, post) = match state.blogs.update(id, &fields).await? {
        BlogUpdate::Updated {
            previous_slug,
            post,
        } => (previous_slug, post),
        BlogUpdate::SlugTaken => return Err(slug_taken()),
        BlogUpdate::Missing => return Err(post_not_found()),
    };
    info!(blog_id = %post.id, slug = %post.slug, by = %admin.email, "blog post updated");
    revalidate_best_effort(
        state.revalidator.as_ref(),
        affected_paths([previous_slug.as_str(), post.slug.as_str()]),
    )
    .await;
    Ok(Json(post))
}

#[instrument(skip(state, admin))]
pub async fn delete_blog(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeletedResponse>> {
    let slug = state.blogs.delete(id).await?.ok_or_else(post_not_found)?;
    info!(blog_id = %id, %slug, by = %admin.email, "blog post deleted");
    revalidate_best_effort(state.revalidator.as_ref(), affected_paths([slug.as_str()])).await;
    Ok(Json(DeletedResponse { success: true }))
}
