//! Data-access layer: the shared connection pool and the registry of tables.
//!
//! A [`Database`] is created once at startup. Each table module declares a
//! [`TableSchema`] (and optionally a [`CachingSchema`]), wraps it in a
//! [`DbTable`] bound to the shared connection and registers it; registration
//! creates the table when missing and fills its mirror.

/// Table and caching declarations
pub mod schema;
/// Generic row access and the write-through mirror
pub mod table;
/// Mirrored values and their conversions
pub mod value;

pub use schema::{CacheRule, CachingSchema, TableSchema};
pub use table::DbTable;
pub use value::{CacheValue, ColumnKind, KeyKind, MirrorKey};

use crate::{
    config::database::DatabaseSettings,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, instrument};

/// A table module: its declaration plus the typed wrapper handed to callers.
pub trait Table: Sized {
    /// Column layout of the table.
    fn schema() -> TableSchema;

    /// Mirror declaration; `None` keeps the table uncached.
    fn caching() -> Option<CachingSchema> {
        None
    }

    /// Wraps the registered table.
    fn from_table(table: Arc<DbTable>) -> Self;
}

/// Shared connection pool and the tables registered on it.
#[derive(Debug)]
pub struct Database {
    connection: DatabaseConnection,
    tables: HashMap<String, Arc<DbTable>>,
}

impl Database {
    /// Opens the pool described by `settings`.
    #[instrument(skip(settings))]
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        debug!("Connecting to the database");
        let connection = sea_orm::Database::connect(settings.connect_options())
            .await
            .map_err(|e| Error::Connection {
                message: e.to_string(),
            })?;
        info!("Database connection pool established");
        Ok(Self::from_connection(connection))
    }

    /// Opens a pool for `url` with default options.
    pub async fn connect_url(url: &str) -> Result<Self> {
        let connection = sea_orm::Database::connect(url)
            .await
            .map_err(|e| Error::Connection {
                message: e.to_string(),
            })?;
        Ok(Self::from_connection(connection))
    }

    /// Wraps an already established connection.
    #[must_use]
    pub fn from_connection(connection: DatabaseConnection) -> Self {
        Self {
            connection,
            tables: HashMap::new(),
        }
    }

    /// The shared connection handle tables are bound to.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Registers `table`, creating it when missing and populating its mirror.
    ///
    /// Registration happens at startup, before the registry is shared, hence `&mut self`.
    #[instrument(skip(self, table), fields(table = %table.name()))]
    pub async fn add_table(&mut self, table: DbTable) -> Result<Arc<DbTable>> {
        let name = table.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(Error::DuplicateTable { name });
        }

        table.create().await?;
        table.populate().await?;

        let table = Arc::new(table);
        self.tables.insert(name, Arc::clone(&table));
        debug!(cached = table.is_cached(), "Table registered");
        Ok(table)
    }

    /// Declares, registers and wraps the table module `T`.
    pub async fn load_table<T: Table>(&mut self) -> Result<T> {
        let table = DbTable::new(self.connection.clone(), T::schema(), T::caching())?;
        let table = self.add_table(table).await?;
        Ok(T::from_table(table))
    }

    /// Looks up a registered table.
    pub fn get_table(&self, name: &str) -> Result<Arc<DbTable>> {
        self.tables
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| Error::UnknownTable {
                name: name.to_string(),
            })
    }

    /// Names of all registered tables, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Closes the pool. Tables still holding the connection fail afterwards.
    pub async fn disconnect(self) -> Result<()> {
        debug!("Closing connection to the database");
        self.connection.close().await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{init_test_tracing, setup_test_db};

    fn table(db: &Database, name: &str) -> Result<DbTable> {
        DbTable::new(
            db.connection().clone(),
            TableSchema::new(name).column("serverid", "BIGINT UNIQUE NOT NULL"),
            None,
        )
    }

    #[tokio::test]
    async fn test_duplicate_table_is_rejected() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;

        db.add_table(table(&db, "first")?).await?;
        let err = db.add_table(table(&db, "first")?).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateTable { ref name } if name == "first"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_table_lookup_fails() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        db.add_table(table(&db, "known")?).await?;

        assert_eq!(db.get_table("known")?.name(), "known");
        assert!(matches!(
            db.get_table("unknown"),
            Err(Error::UnknownTable { .. })
        ));
        assert_eq!(db.table_names(), vec!["known".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_registration_creates_table() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        let created = db.add_table(table(&db, "created")?).await?;
        assert!(!created.is_cached());

        let rows = created.db_fetch("SELECT serverid FROM created", Vec::new()).await?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_database_is_a_connection_error() {
        init_test_tracing();
        let err = Database::connect_url("sqlite:///nonexistent-dir/for/sure/neutron.sqlite")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }
}
