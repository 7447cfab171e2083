//! Database connection pool management.
//!
//! This module provides connection pooling for SQLite using r2d2.
//! It handles pool initialization, connection customization, and running
//! migrations.

use kandan_common::{Error, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Initialize a new database pool with the given file path.
///
/// This function will:
/// - Create the SQLite database file if it doesn't exist
/// - Set up connection pooling with r2d2
/// - Enable foreign key constraints on all connections
/// - Run pending database migrations
///
/// # Example
///
/// ```no_run
/// use kandan_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/kandan/kandan.db").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        // Enable foreign key constraints on each new connection
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });

    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {}", e)))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for migrations: {}", e)))?;

    migrations::run_migrations(&conn)
        .map_err(|e| Error::database(format!("Failed to run migrations: {}", e)))?;

    Ok(pool)
}

/// Initialize an in-memory database pool for testing.
///
/// The database is lost when the pool is dropped. The pool is capped at a
/// single connection so that every test statement sees the same in-memory
/// database.
///
/// # Example
///
/// ```
/// use kandan_db::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });

    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create in-memory pool: {}", e)))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for migrations: {}", e)))?;

    migrations::run_migrations(&conn)
        .map_err(|e| Error::database(format!("Failed to run migrations: {}", e)))?;

    Ok(pool)
}

/// Get a connection from the pool.
///
/// Convenience wrapper around `pool.get()` that converts the r2d2 error
/// into our common Error type.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_memory_pool_works() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        // Foreign keys must be enabled
        let enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn migrations_run_on_init() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('videos', 'bindings')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn pool_reuses_connections() {
        let pool = init_memory_pool().unwrap();

        {
            let conn = get_conn(&pool).unwrap();
            conn.execute(
                "INSERT INTO videos (hash, file_name, file_path, file_size, duration_secs)
                 VALUES (?, ?, ?, ?, ?)",
                rusqlite::params!["ABC", "a.mkv", "/a.mkv", 100, 1440],
            )
            .unwrap();
        }

        let conn = get_conn(&pool).unwrap();
        let name: String = conn
            .query_row("SELECT file_name FROM videos WHERE hash = ?", ["ABC"], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(name, "a.mkv");
    }
}
