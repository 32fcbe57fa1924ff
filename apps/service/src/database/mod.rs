//! Storage layer for monitored sites and registered principals.
//!
//! Everything the scheduler needs to resume after a restart lives here;
//! the sweep itself keeps no state of its own.

pub mod migrations;
pub mod models;
pub mod repository;

pub use repository::{LibsqlStore, Store};

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
