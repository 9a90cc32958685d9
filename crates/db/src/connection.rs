use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

/// Opens a pool against `database_url`, creating the database file when it is missing.
///
/// An in-memory database lives only as long as its connection, so it gets a
/// single connection that is never recycled.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let options = database_url.parse::<SqliteConnectOptions>()?.create_if_missing(true);
    let in_memory = database_url.contains(":memory:");

    let pool_options = SqlitePoolOptions::new()
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        });
    let pool_options = if in_memory {
        pool_options.max_connections(1).min_connections(1).idle_timeout(None).max_lifetime(None)
    } else {
        pool_options.max_connections(max_connections.max(1))
    };

    pool_options.connect_with(options).await
}

/// Round-trips a trivial query; used by readiness probes.
pub async fn ping(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
