//! Database migration command.
//!
//! Migrations live in `crates/server/migrations/` and are embedded in the
//! server library, so the CLI always applies the set the server was built
//! against.

use sqlx::PgPool;

use schoolmall_server::db::MIGRATOR;

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns the migrator's error if any migration fails.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!(
        available = MIGRATOR.iter().count(),
        "Running migrations..."
    );
    MIGRATOR.run(pool).await?;
    tracing::info!("Migrations complete!");
    Ok(())
}
