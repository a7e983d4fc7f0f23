//! Shared test utilities for `Neutron`.
//!
//! Every test gets its own in-memory `SQLite` database, so tests never share
//! tables or mirrors.

use crate::{
    database::Database,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness; safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("neutron_bot=trace"))
        .with_test_writer()
        .try_init();
}

/// Opens a fresh in-memory `SQLite` connection.
pub async fn connect_test_db() -> Result<DatabaseConnection> {
    sea_orm::Database::connect("sqlite::memory:")
        .await
        .map_err(|e| Error::Connection {
            message: e.to_string(),
        })
}

/// Creates an empty table registry on a fresh in-memory database.
/// This is the standard setup for table tests.
pub async fn setup_test_db() -> Result<Database> {
    Ok(Database::from_connection(connect_test_db().await?))
}
