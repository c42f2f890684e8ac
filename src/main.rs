mod app;
mod auth;
mod clock;
mod config;
mod diet;
mod error;
mod exercise;
mod images;
mod members;
mod ownership;
mod state;
mod status;
mod storage;
mod sweeper;
mod window;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "healthtrack=debug,axum=info,tower_http=info".to_string());
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

    // daily reconciliation of overdue scheduled entries
    let _sweeper = sweeper::spawn(app_state.clone());

    let app = app::build_app(app_state);
    app::serve(app).await
}
