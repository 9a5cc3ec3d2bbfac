mod admin;
mod app;
mod auth;
mod cache;
mod config;
mod error;
mod forms;
mod mail;
mod pagination;
mod posts;
mod repo;
mod state;
mod storage;
mod templates;
#[cfg(test)]
mod test_support;

use anyhow::{bail, Context};

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "yatube=debug,axum=info,tower_http=info".to_string());
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

    let config = AppConfig::from_env().context("loading configuration")?;
    let (app_state, db) = AppState::init(config).await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => app::serve(app::build_app(app_state)).await,
        [cmd, username] if cmd == "promote" => promote(&app_state, username).await,
        _ => bail!("usage: yatube [promote <username>]"),
    }
}

/// Grants the staff flag so the account can reach the admin pages.
async fn promote(state: &AppState, username: &str) -> anyhow::Result<()> {
    if !state.store.set_staff(username, true).await? {
        bail!("no user named {username}");
    }
    tracing::info!(%username, "user promoted to staff");
    Ok(())
}
