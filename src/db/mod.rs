use chrono::Utc;
use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    Database::connect(&config.database_url)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))
}

pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    migration::Migrator::up(db, None).await
}

/// Write-time timestamp. Every `created_at`/`updated_at` goes through here,
/// never through a value supplied by the caller.
pub fn server_timestamp() -> sea_orm::prelude::DateTimeWithTimeZone {
    Utc::now().into()
}
