//! Embedded schema migrations.
//!
//! Migration SQL is embedded at compile time and applied in order over an
//! async connection; applied versions are tracked in
//! `__diesel_schema_migrations` so running twice is a no-op.

use std::collections::HashSet;

use diesel::sql_types::Text;
use diesel::QueryableByName;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use tracing::info;

use super::pool::{DbError, SqlitePool};

/// SQLite migration definitions (embedded at compile time).
static SQLITE_MIGRATION_FILES: &[(&str, &str)] = &[(
    "2026-01-01-000000",
    include_str!("../../migrations/sqlite/2026-01-01-000000_initial_schema/up.sql"),
)];

#[derive(QueryableByName)]
struct AppliedVersion {
    #[diesel(sql_type = Text)]
    version: String,
}

/// Run pending migrations. Returns how many were applied.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize, DbError> {
    let mut conn = pool.get().await?;

    conn.batch_execute(
        "CREATE TABLE IF NOT EXISTS __diesel_schema_migrations (
            version VARCHAR(50) PRIMARY KEY NOT NULL,
            run_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .await?;

    let applied: HashSet<String> =
        diesel::sql_query("SELECT version FROM __diesel_schema_migrations")
            .load::<AppliedVersion>(&mut conn)
            .await?
            .into_iter()
            .map(|row| row.version)
            .collect();

    let mut ran_count = 0;
    for (version, sql) in SQLITE_MIGRATION_FILES {
        if applied.contains(*version) {
            continue;
        }

        info!("Applying migration: {}", version);
        conn.batch_execute(sql).await?;
        diesel::sql_query("INSERT INTO __diesel_schema_migrations (version) VALUES (?)")
            .bind::<Text, _>(*version)
            .execute(&mut conn)
            .await?;
        ran_count += 1;
    }

    if ran_count == 0 {
        info!("No pending migrations");
    } else {
        info!("Applied {} migration(s)", ran_count);
    }

    Ok(ran_count)
}
