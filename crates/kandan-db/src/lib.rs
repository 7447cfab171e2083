//! Kandan-DB: database schema, migrations, and query operations.
//!
//! This crate is the persistence gateway for kandan, built on SQLite with
//! rusqlite and r2d2 connection pooling. It owns the `videos` and
//! `bindings` tables; the pipeline only ever holds transient in-memory
//! copies of the rows.
//!
//! # Modules
//!
//! - `migrations` - Embedded schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching the database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use kandan_db::pool::{init_pool, get_conn};
//! use kandan_db::queries::videos;
//!
//! let pool = init_pool("/var/lib/kandan/kandan.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let unbound = videos::list_unbound_videos(&conn).unwrap();
//! println!("{} videos need matching", unbound.len());
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
