use sqlx::PgPool;

use crate::error::GuildError;

/// Execute the schema DDL. Every statement is idempotent, so running it on an
/// existing database is safe.
pub async fn migrate(pool: &PgPool) -> Result<(), GuildError> {
    sqlx::raw_sql(include_str!("../../sql/schema.sql"))
        .execute(pool)
        .await?;
    tracing::info!("document schema applied");
    Ok(())
}
