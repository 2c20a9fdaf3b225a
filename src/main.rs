use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursetable::identity::GuestSession;
use coursetable::services::table_manager::DEFAULT_TABLE_NAME;
use coursetable::services::{TableManager, TableStatus};
use coursetable::store::LocalStore;
use coursetable::table_api::{ApiConfig, CourseTableHttpClient};

/// Dev utility: resolve the guest course table for this machine, creating a
/// fresh one when none exists or the stored one has expired.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "coursetable=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://coursetable.db?mode=rwc".to_string());
    let store = LocalStore::connect(&database_url).await?;

    let config = ApiConfig::new_from_env()?;
    let api = Arc::new(CourseTableHttpClient::new(config)?);
    let semester = std::env::var("COURSETABLE_SEMESTER").unwrap_or_else(|_| "1102".to_string());

    let manager = TableManager::new(api, Arc::new(GuestSession), store);
    let table = match manager.resolve().await? {
        TableStatus::Ready(table) => table,
        TableStatus::Missing => {
            info!("no course table yet, creating one");
            manager.create(DEFAULT_TABLE_NAME, &semester).await?
        }
        TableStatus::Expired => {
            warn!("stored course table expired, creating a new one");
            manager.create(DEFAULT_TABLE_NAME, &semester).await?
        }
    };

    info!(
        table_id = %table.id,
        name = %table.name,
        courses = table.courses.len(),
        "course table ready"
    );

    Ok(())
}
