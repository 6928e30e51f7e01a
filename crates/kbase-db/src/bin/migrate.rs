//! Apply pending kbase schema migrations.
//!
//! Environment variables:
//!   DATABASE_URL  - PostgreSQL connection string (required)
//!   DB_*          - pool settings, see `kbase_db::config`
//!   LOG_FORMAT    - "json" or "text" (default: "text")
//!   RUST_LOG      - standard env filter (default: "kbase_db=info,kbase_migrate=info")

use std::time::Instant;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kbase_db::{Database, DbConfig};

fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kbase_db=info,kbase_migrate=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = DbConfig::from_env().context("Failed to load database configuration")?;
    let db = Database::from_config(&config)
        .await
        .context("Failed to connect to database")?;

    let start = Instant::now();
    db.migrate().await.context("Failed to run migrations")?;
    info!(
        subsystem = "db",
        component = "migrate",
        op = "run",
        duration_ms = start.elapsed().as_millis() as u64,
        "Migrations applied"
    );
    Ok(())
}
