//! Notification sweep runner
//!
//! Invoked on a schedule (e.g. a daily cron entry). Runs the due-date
//! reminder sweep and the reservation-expiry sweep once, then exits.
//! Overlapping runs are prevented by scheduling discipline, not locking.

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use biblioteca_server::{
    config::AppConfig,
    repository::Repository,
    services::{email::EmailService, reminders::RemindersService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().expect("Failed to load configuration");

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("biblioteca_server={}", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting notification sweeps");

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    let repository = Repository::new(pool);
    let notifier = Arc::new(EmailService::new(config.email.clone()));
    let reminders = RemindersService::new(repository, notifier, config.circulation.clone());

    let due = reminders.send_due_soon_reminders().await?;
    tracing::info!(
        "Due-date sweep done: {} matched, {} sent, {} failed",
        due.matched,
        due.sent,
        due.failed
    );

    let expired = reminders.send_expiry_notices().await?;
    tracing::info!(
        "Expiry sweep done: {} matched, {} sent, {} failed",
        expired.matched,
        expired.sent,
        expired.failed
    );

    Ok(())
}
