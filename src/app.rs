use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth, blogs, dashboard, error::ApiError, images, leads, offers, state::AppState, users,
};

/// Site forms and session endpoints; no token required.
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(auth::handlers::auth_routes())
        .merge(leads::handlers::public_routes())
        .merge(offers::handlers::public_routes())
}

/// Any valid session, with or without an `admin_users` row.
fn staff_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::handlers::me_routes())
        .merge(dashboard::routes())
        .merge(leads::handlers::staff_routes())
        .merge(offers::handlers::staff_routes())
}

/// Every handler here takes `RequireAdmin`.
fn admin_routes() -> Router<AppState> {
    Router::new()
        .merge(users::handlers::admin_routes())
        .merge(images::handlers::write_routes())
}

pub fn build_app(state: AppState) -> Router {
    // Blog reads and writes share paths, so that router spans public and admin.
    let api = public_routes()
        .merge(staff_routes())
        .merge(admin_routes())
        .merge(blogs::handlers::routes());

    Router::new()
        .nest("/api", api)
        .fallback(|| async { ApiError::not_found("Route not found") })
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri(),
                        status = tracing::field::Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
