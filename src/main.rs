mod app;
mod auth;
mod blogs;
mod config;
mod dashboard;
mod db;
mod error;
mod extract;
mod images;
mod leads;
mod offers;
mod revalidate;
mod state;
mod storage;
mod users;
mod validation;

#[cfg(test)]
mod testing;

use crate::{app::build_app, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "eyesite_admin=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    if let Some(bootstrap) = &app_state.config.bootstrap_admin {
        let accounts = users::services::AdminAccounts::new(
            app_state.identities.as_ref(),
            app_state.admins.as_ref(),
        );
        if let Err(e) = accounts.ensure_bootstrap(bootstrap).await {
            tracing::error!(error = %format!("{e:#}"), "bootstrap admin provisioning failed");
        }
    }

    app::serve(build_app(app_state)).await
}
