//! Generic row access for one relational table with an optional write-through mirror.
//!
//! Every statement is parameterized: only declared identifiers are spliced into
//! SQL, values always travel as bound parameters. Placeholders are `$1..$n`,
//! which both the PostgreSQL and SQLite backends accept.
//!
//! When a [`CachingSchema`] is declared the table keeps an in-memory mirror
//! keyed by the caching key column. Writes made through [`DbTable::db_upsert`]
//! and [`DbTable::db_set`] update the mirror from the values just written; the
//! database is never re-read for it, so defaults or triggers applied by the
//! database after the write are not reflected. Writes issued outside this type
//! (raw SQL through [`DbTable::db_execute`], other processes) do not touch the
//! mirror either.

use crate::{
    database::{
        schema::{CacheRule, CachingSchema, TableSchema, is_identifier},
        value::{CacheValue, MirrorKey, decode_cell, param_to_json},
    },
    errors::{Error, Result},
};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, QueryResult, Statement, TryGetable, Value,
};
use serde_json::Value as JsonValue;
use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::{debug, info, instrument, trace};

type Mirror = HashMap<MirrorKey, HashMap<String, CacheValue>>;

/// Pending mirror change computed before a write executes.
#[derive(Clone)]
enum CellUpdate {
    Store(String, CacheValue),
    Clear(String),
}

/// One registered table bound to the shared connection pool.
pub struct DbTable {
    schema: TableSchema,
    caching: Option<CachingSchema>,
    connection: DatabaseConnection,
    mirror: RwLock<Mirror>,
}

impl std::fmt::Debug for DbTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbTable")
            .field("name", &self.schema.name())
            .field("caching", &self.caching.is_some())
            .finish_non_exhaustive()
    }
}

impl DbTable {
    /// Binds a table declaration to a connection, validating both schemas.
    ///
    /// Nothing is executed yet: the table is created and its mirror populated
    /// when it is registered with [`Database::add_table`](crate::database::Database::add_table).
    pub fn new(
        connection: DatabaseConnection,
        schema: TableSchema,
        caching: Option<CachingSchema>,
    ) -> Result<Self> {
        schema.validate()?;
        if let Some(caching) = &caching {
            caching.validate(&schema)?;
        }
        Ok(Self {
            schema,
            caching,
            connection,
            mirror: RwLock::new(HashMap::new()),
        })
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Declared column layout.
    #[must_use]
    pub const fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Whether this table keeps a mirror.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        self.caching.is_some()
    }

    /// Issues the `CREATE TABLE IF NOT EXISTS` statement.
    pub(crate) async fn create(&self) -> Result<()> {
        let statement = self.schema.create_statement();
        debug!(table = self.name(), "{}", statement);
        self.db_execute(&statement, Vec::new()).await
    }

    /// Loads every existing row into the mirror. No-op without caching.
    #[instrument(skip(self), fields(table = %self.name()))]
    pub(crate) async fn populate(&self) -> Result<()> {
        let Some(caching) = &self.caching else {
            return Ok(());
        };

        // Typed columns are read as text so the same parse applies on every backend.
        let mut projection = vec![format!(
            "CAST({key} AS TEXT) AS {key}",
            key = caching.key_column()
        )];
        for (column, rule) in caching.rules() {
            projection.push(match rule {
                CacheRule::Typed { .. } => format!("CAST({column} AS TEXT) AS {column}"),
                CacheRule::Opaque => column.clone(),
            });
        }
        let statement = format!("SELECT {} FROM {}", projection.join(", "), self.name());
        let rows = self.db_fetch(&statement, Vec::new()).await?;

        let mut loaded = Mirror::new();
        for row in &rows {
            let raw_key = decode_cell(row, caching.key_column()).map_err(|e| self.query_error(e))?;
            let Some(key) = self.coerce_key(caching, &raw_key)? else {
                continue;
            };

            let mut entry = HashMap::new();
            for (column, rule) in caching.rules() {
                let raw = decode_cell(row, column).map_err(|e| self.query_error(e))?;
                if let Some(value) = self.coerce_cell(column, rule, &raw)? {
                    entry.insert(column.clone(), value);
                }
            }
            loaded.insert(key, entry);
        }

        let count = loaded.len();
        *self.write_mirror()? = loaded;
        info!("Populated cache of '{}' with {} entries", self.name(), count);
        Ok(())
    }

    /// Executes a statement, discarding its result.
    #[instrument(skip(self, args), fields(table = %self.name()))]
    pub async fn db_execute(&self, statement: &str, args: Vec<Value>) -> Result<()> {
        trace!("execute: {}", statement);
        self.connection
            .execute(self.statement(statement, args))
            .await
            .map(|_| ())
            .map_err(|e| self.query_error(e))
    }

    /// Runs a query and returns every row; an empty result is not an error.
    #[instrument(skip(self, args), fields(table = %self.name()))]
    pub async fn db_fetch(&self, statement: &str, args: Vec<Value>) -> Result<Vec<QueryResult>> {
        trace!("fetch: {}", statement);
        self.connection
            .query_all(self.statement(statement, args))
            .await
            .map_err(|e| self.query_error(e))
    }

    /// Runs a query and returns its first row, or `None` when nothing matched.
    #[instrument(skip(self, args), fields(table = %self.name()))]
    pub async fn db_fetchone(
        &self,
        statement: &str,
        args: Vec<Value>,
    ) -> Result<Option<QueryResult>> {
        trace!("fetchone: {}", statement);
        self.connection
            .query_one(self.statement(statement, args))
            .await
            .map_err(|e| self.query_error(e))
    }

    /// Inserts a row, or updates the supplied columns when `conflict_columns` collide.
    ///
    /// `columns` and `values` correspond by position. Columns that are not
    /// supplied keep their stored (or default) value in the database and their
    /// previous value in the mirror. At least one supplied column must lie
    /// outside `conflict_columns`.
    #[instrument(skip(self, values), fields(table = %self.name()))]
    pub async fn db_upsert(
        &self,
        columns: &[&str],
        values: Vec<Value>,
        conflict_columns: &[&str],
    ) -> Result<()> {
        if columns.is_empty() || columns.len() != values.len() {
            return Err(self.invalid(format!(
                "upsert needs matching columns and values, got {} columns and {} values",
                columns.len(),
                values.len()
            )));
        }
        if conflict_columns.is_empty() {
            return Err(self.invalid("upsert needs at least one conflict column".to_string()));
        }
        for column in columns.iter().chain(conflict_columns) {
            self.check_column(column)?;
        }

        let pending = self.plan_row_update(columns, &values)?;

        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("${i}")).collect();
        let updates: Vec<String> = columns
            .iter()
            .filter(|column| !conflict_columns.contains(column))
            .map(|column| format!("{column} = EXCLUDED.{column}"))
            .collect();
        if updates.is_empty() {
            return Err(self.invalid(
                "upsert needs at least one column outside the conflict columns".to_string(),
            ));
        }
        let statement = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO UPDATE SET {}",
            self.name(),
            columns.join(", "),
            placeholders.join(", "),
            conflict_columns.join(", "),
            updates.join(", ")
        );

        self.db_execute(&statement, values).await?;

        if let Some((key, updates)) = pending {
            self.apply(&key, updates)?;
        }
        Ok(())
    }

    /// Reads `columns` of the first row matching `specification`.
    ///
    /// `specification` is a `WHERE` clause using `$1..$n` for `args`.
    #[instrument(skip(self, args), fields(table = %self.name()))]
    pub async fn db_get(
        &self,
        columns: &[&str],
        specification: &str,
        args: Vec<Value>,
    ) -> Result<Option<QueryResult>> {
        if columns.is_empty() {
            return Err(self.invalid("get needs at least one column".to_string()));
        }
        for column in columns {
            self.check_column(column)?;
        }
        let statement = format!(
            "SELECT {} FROM {} WHERE {}",
            columns.join(", "),
            self.name(),
            specification
        );
        self.db_fetchone(&statement, args).await
    }

    /// Updates one column on every row matching `specification`.
    ///
    /// `specification` uses `$1..$n` for `args`; the new value is bound after
    /// them. With caching enabled the keys of the updated rows are returned by
    /// the statement itself and their mirror entries receive the written value.
    /// The caching key column itself cannot be set on a cached table.
    #[instrument(skip(self, value, args), fields(table = %self.name()))]
    pub async fn db_set(
        &self,
        column: &str,
        value: Value,
        specification: &str,
        mut args: Vec<Value>,
    ) -> Result<()> {
        self.check_column(column)?;

        let placeholder = args.len() + 1;
        let mut statement = format!(
            "UPDATE {} SET {} = ${} WHERE {}",
            self.name(),
            column,
            placeholder,
            specification
        );

        let Some(caching) = &self.caching else {
            args.push(value);
            return self.db_execute(&statement, args).await;
        };
        if column == caching.key_column() {
            return Err(self.invalid(format!(
                "cannot set cache key column '{column}', upsert the row under its new key instead"
            )));
        }

        let update = match caching.rule(column) {
            Some(rule) => Some(self.plan_cell(column, rule, &value)?),
            None => None,
        };
        args.push(value);

        let key_column = caching.key_column();
        statement.push_str(&format!(" RETURNING CAST({key_column} AS TEXT) AS {key_column}"));
        let rows = self.db_fetch(&statement, args).await?;

        let Some(update) = update else {
            return Ok(());
        };
        for row in &rows {
            let raw_key = decode_cell(row, key_column).map_err(|e| self.query_error(e))?;
            if let Some(key) = self.coerce_key(caching, &raw_key)? {
                self.apply(&key, vec![update.clone()])?;
            }
        }
        Ok(())
    }

    /// Decodes `column` of a row returned by this table, tagging failures with the table name.
    pub fn read<T: TryGetable>(&self, row: &QueryResult, column: &str) -> Result<T> {
        row.try_get::<T>("", column)
            .map_err(|e| self.query_error(e))
    }

    /// Returns the mirrored value of `column` for `key`.
    ///
    /// Falls back to the column's declared default; without one an absent key
    /// or column is a [`Error::CacheMiss`].
    pub fn cache_get(&self, key: impl Into<MirrorKey>, column: &str) -> Result<CacheValue> {
        let caching = self.caching()?;
        let key = key.into();

        if let Some(value) = self
            .read_mirror()?
            .get(&key)
            .and_then(|entry| entry.get(column))
        {
            return Ok(value.clone());
        }

        caching
            .rule(column)
            .and_then(CacheRule::default_value)
            .cloned()
            .ok_or_else(|| Error::CacheMiss {
                table: self.name().to_string(),
                key: key.to_string(),
                column: column.to_string(),
            })
    }

    /// Overwrites the mirrored value of `column` for `key` without touching the database.
    ///
    /// Pair this with a database write; on its own it makes the mirror diverge.
    pub fn cache_update(
        &self,
        key: impl Into<MirrorKey>,
        column: &str,
        value: CacheValue,
    ) -> Result<()> {
        self.caching()?;
        self.apply(
            &key.into(),
            vec![CellUpdate::Store(column.to_string(), value)],
        )
    }

    /// Number of keys currently mirrored.
    pub fn cache_len(&self) -> Result<usize> {
        self.caching()?;
        Ok(self.read_mirror()?.len())
    }

    fn statement(&self, sql: &str, args: Vec<Value>) -> Statement {
        Statement::from_sql_and_values(self.connection.get_database_backend(), sql, args)
    }

    fn caching(&self) -> Result<&CachingSchema> {
        self.caching.as_ref().ok_or_else(|| Error::CachingDisabled {
            table: self.name().to_string(),
        })
    }

    /// Converts the written row into mirror updates before anything executes,
    /// so an unconvertible value aborts the write instead of desynchronising.
    fn plan_row_update(
        &self,
        columns: &[&str],
        values: &[Value],
    ) -> Result<Option<(MirrorKey, Vec<CellUpdate>)>> {
        let Some(caching) = &self.caching else {
            return Ok(None);
        };

        let Some(key_position) = columns.iter().position(|c| *c == caching.key_column()) else {
            debug!(
                "Upsert on '{}' without key column '{}', cache left untouched",
                self.name(),
                caching.key_column()
            );
            return Ok(None);
        };
        let raw_key = self.to_json(caching.key_column(), &values[key_position])?;
        let Some(key) = self.coerce_key(caching, &raw_key)? else {
            return Ok(None);
        };

        let mut updates = Vec::new();
        for (column, value) in columns.iter().zip(values) {
            if let Some(rule) = caching.rule(column) {
                updates.push(self.plan_cell(column, rule, value)?);
            }
        }
        Ok(Some((key, updates)))
    }

    fn plan_cell(&self, column: &str, rule: &CacheRule, value: &Value) -> Result<CellUpdate> {
        let raw = self.to_json(column, value)?;
        Ok(match self.coerce_cell(column, rule, &raw)? {
            Some(value) => CellUpdate::Store(column.to_string(), value),
            None => CellUpdate::Clear(column.to_string()),
        })
    }

    fn apply(&self, key: &MirrorKey, updates: Vec<CellUpdate>) -> Result<()> {
        let mut mirror = self.write_mirror()?;
        let entry = mirror.entry(key.clone()).or_default();
        for update in updates {
            match update {
                CellUpdate::Store(column, value) => {
                    trace!("cache {}[{}].{} = {:?}", self.name(), key, column, value);
                    entry.insert(column, value);
                }
                CellUpdate::Clear(column) => {
                    entry.remove(&column);
                }
            }
        }
        Ok(())
    }

    fn coerce_key(&self, caching: &CachingSchema, raw: &JsonValue) -> Result<Option<MirrorKey>> {
        caching
            .key_kind()
            .coerce(raw)
            .map_err(|message| self.coercion_error(caching.key_column(), message))
    }

    fn coerce_cell(
        &self,
        column: &str,
        rule: &CacheRule,
        raw: &JsonValue,
    ) -> Result<Option<CacheValue>> {
        match rule {
            CacheRule::Typed { kind, default } => Ok(kind
                .coerce(raw)
                .map_err(|message| self.coercion_error(column, message))?
                .or_else(|| default.clone())),
            CacheRule::Opaque => Ok(Some(CacheValue::Raw(raw.clone()))),
        }
    }

    fn to_json(&self, column: &str, value: &Value) -> Result<JsonValue> {
        param_to_json(value).map_err(|message| self.coercion_error(column, message))
    }

    fn check_column(&self, column: &str) -> Result<()> {
        if is_identifier(column) && self.schema.has_column(column) {
            Ok(())
        } else {
            Err(self.invalid(format!("unknown column '{column}'")))
        }
    }

    fn read_mirror(&self) -> Result<RwLockReadGuard<'_, Mirror>> {
        self.mirror.read().map_err(|_| Error::LockPoisoned {
            table: self.name().to_string(),
        })
    }

    fn write_mirror(&self) -> Result<RwLockWriteGuard<'_, Mirror>> {
        self.mirror.write().map_err(|_| Error::LockPoisoned {
            table: self.name().to_string(),
        })
    }

    fn query_error(&self, source: DbErr) -> Error {
        Error::Query {
            table: self.name().to_string(),
            source,
        }
    }

    fn coercion_error(&self, column: &str, message: String) -> Error {
        Error::Coercion {
            table: self.name().to_string(),
            column: column.to_string(),
            message,
        }
    }

    fn invalid(&self, message: String) -> Error {
        Error::InvalidSchema {
            table: self.name().to_string(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        database::value::{ColumnKind, KeyKind},
        test_utils::{connect_test_db, init_test_tracing},
    };
    use serde_json::json;

    fn roles_schema() -> TableSchema {
        TableSchema::new("roles")
            .column("serverid", "NUMERIC UNIQUE NOT NULL")
            .column("staff", "NUMERIC DEFAULT 0")
    }

    fn roles_caching() -> CachingSchema {
        CachingSchema::new(KeyKind::Int, "serverid")
            .column("staff", CacheRule::with_default(ColumnKind::Int, 0))
    }

    async fn roles_table() -> Result<DbTable> {
        init_test_tracing();
        let connection = connect_test_db().await?;
        let table = DbTable::new(connection, roles_schema(), Some(roles_caching()))?;
        table.create().await?;
        table.populate().await?;
        Ok(table)
    }

    async fn count_rows(table: &DbTable, serverid: i64) -> Result<i64> {
        let row = table
            .db_fetchone(
                "SELECT COUNT(*) AS total FROM roles WHERE serverid = $1",
                vec![serverid.into()],
            )
            .await?
            .unwrap();
        Ok(row.try_get::<i64>("", "total").unwrap())
    }

    #[tokio::test]
    async fn test_upsert_updates_cache() -> Result<()> {
        let table = roles_table().await?;

        table
            .db_upsert(
                &["serverid", "staff"],
                vec![123_i64.into(), 456_i64.into()],
                &["serverid"],
            )
            .await?;

        assert_eq!(table.cache_get(123, "staff")?, CacheValue::Int(456));
        assert_eq!(count_rows(&table, 123).await?, 1);

        let row = table
            .db_get(&["staff"], "serverid = $1", vec![123_i64.into()])
            .await?
            .unwrap();
        assert_eq!(row.try_get::<i64>("", "staff").unwrap(), 456);
        Ok(())
    }

    #[tokio::test]
    async fn test_unwritten_key_returns_default() -> Result<()> {
        let table = roles_table().await?;
        assert_eq!(table.cache_get(999, "staff")?, CacheValue::Int(0));
        Ok(())
    }

    #[tokio::test]
    async fn test_reupsert_takes_conflict_path() -> Result<()> {
        let table = roles_table().await?;
        table
            .db_upsert(
                &["serverid", "staff"],
                vec![123_i64.into(), 456_i64.into()],
                &["serverid"],
            )
            .await?;
        table
            .db_upsert(
                &["serverid", "staff"],
                vec![123_i64.into(), 789_i64.into()],
                &["serverid"],
            )
            .await?;

        assert_eq!(table.cache_get(123, "staff")?, CacheValue::Int(789));
        assert_eq!(count_rows(&table, 123).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_miss_without_default() -> Result<()> {
        init_test_tracing();
        let connection = connect_test_db().await?;
        let table = DbTable::new(
            connection,
            TableSchema::new("prefixes")
                .column("serverid", "BIGINT UNIQUE NOT NULL")
                .column("prefix", "TEXT"),
            Some(
                CachingSchema::new(KeyKind::Int, "serverid")
                    .column("prefix", CacheRule::typed(ColumnKind::Text)),
            ),
        )?;
        table.create().await?;

        let err = table.cache_get(5, "prefix").unwrap_err();
        assert!(err.is_cache_miss());

        // Columns outside the caching schema are never mirrored.
        assert!(table.cache_get(5, "serverid").unwrap_err().is_cache_miss());
        Ok(())
    }

    #[tokio::test]
    async fn test_fetchone_without_rows_is_none() -> Result<()> {
        let table = roles_table().await?;
        let row = table
            .db_fetchone("SELECT staff FROM roles WHERE serverid = $1", vec![1_i64.into()])
            .await?;
        assert!(row.is_none());

        let rows = table.db_fetch("SELECT staff FROM roles", Vec::new()).await?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_populate_loads_existing_rows() -> Result<()> {
        init_test_tracing();
        let connection = connect_test_db().await?;
        let writer = DbTable::new(connection.clone(), roles_schema(), None)?;
        writer.create().await?;
        writer
            .db_execute(
                "INSERT INTO roles (serverid, staff) VALUES ($1, $2), ($3, NULL)",
                vec![10_i64.into(), 20_i64.into(), 11_i64.into()],
            )
            .await?;

        let table = DbTable::new(connection, roles_schema(), Some(roles_caching()))?;
        table.populate().await?;

        assert_eq!(table.cache_len()?, 2);
        assert_eq!(table.cache_get(10, "staff")?, CacheValue::Int(20));
        // Null with a declared default mirrors the default.
        assert_eq!(table.cache_get(11, "staff")?, CacheValue::Int(0));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_updates_cache_of_matched_rows() -> Result<()> {
        let table = roles_table().await?;
        table
            .db_upsert(
                &["serverid", "staff"],
                vec![1_i64.into(), 5_i64.into()],
                &["serverid"],
            )
            .await?;
        table
            .db_upsert(
                &["serverid", "staff"],
                vec![2_i64.into(), 5_i64.into()],
                &["serverid"],
            )
            .await?;

        table
            .db_set("staff", 42_i64.into(), "serverid = $1", vec![1_i64.into()])
            .await?;

        assert_eq!(table.cache_get(1, "staff")?, CacheValue::Int(42));
        assert_eq!(table.cache_get(2, "staff")?, CacheValue::Int(5));
        Ok(())
    }

    #[tokio::test]
    async fn test_uncoercible_value_aborts_write() -> Result<()> {
        let table = roles_table().await?;
        let err = table
            .db_upsert(
                &["serverid", "staff"],
                vec![3_i64.into(), "not a number".into()],
                &["serverid"],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Coercion { .. }));
        assert_eq!(count_rows(&table, 3).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_rejects_mismatched_lengths() -> Result<()> {
        let table = roles_table().await?;
        let err = table
            .db_upsert(&["serverid", "staff"], vec![3_i64.into()], &["serverid"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_of_only_conflict_columns_is_rejected() -> Result<()> {
        let table = roles_table().await?;
        let err = table
            .db_upsert(&["serverid"], vec![4_i64.into()], &["serverid"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
        assert_eq!(count_rows(&table, 4).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_of_key_column_is_rejected() -> Result<()> {
        let table = roles_table().await?;
        table
            .db_upsert(
                &["serverid", "staff"],
                vec![1_i64.into(), 5_i64.into()],
                &["serverid"],
            )
            .await?;

        let err = table
            .db_set("serverid", 9_i64.into(), "serverid = $1", vec![1_i64.into()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));

        // Neither side moved: the row and its mirror entry stay under key 1.
        assert_eq!(count_rows(&table, 1).await?, 1);
        assert_eq!(count_rows(&table, 9).await?, 0);
        assert_eq!(table.cache_get(1, "staff")?, CacheValue::Int(5));
        Ok(())
    }

    #[tokio::test]
    async fn test_driver_errors_carry_table_name() -> Result<()> {
        let table = roles_table().await?;
        let err = table
            .db_execute("SELECT * FROM missing_table", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Query { ref table, .. } if table == "roles"));
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_update_does_not_write_database() -> Result<()> {
        let table = roles_table().await?;
        table.cache_update(77, "staff", CacheValue::Int(1))?;

        assert_eq!(table.cache_get(77, "staff")?, CacheValue::Int(1));
        assert_eq!(count_rows(&table, 77).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_opaque_columns_keep_raw_values() -> Result<()> {
        init_test_tracing();
        let connection = connect_test_db().await?;
        let schema = TableSchema::new("notes")
            .column("name", "TEXT PRIMARY KEY")
            .column("body", "TEXT");
        let caching = CachingSchema::new(KeyKind::Text, "name").column("body", CacheRule::Opaque);
        let table = DbTable::new(connection, schema, Some(caching))?;
        table.create().await?;

        table
            .db_upsert(&["name", "body"], vec!["a".into(), "hello".into()], &["name"])
            .await?;
        assert_eq!(table.cache_get("a", "body")?, CacheValue::Raw(json!("hello")));

        table.populate().await?;
        assert_eq!(table.cache_get("a", "body")?, CacheValue::Raw(json!("hello")));
        Ok(())
    }

    #[tokio::test]
    async fn test_opaque_numeric_columns_populate() -> Result<()> {
        init_test_tracing();
        let connection = connect_test_db().await?;
        let schema = TableSchema::new("counters")
            .column("serverid", "BIGINT UNIQUE NOT NULL")
            .column("hits", "INTEGER")
            .column("ratio", "REAL");
        let writer = DbTable::new(connection.clone(), schema.clone(), None)?;
        writer.create().await?;
        writer
            .db_execute(
                "INSERT INTO counters (serverid, hits, ratio) VALUES ($1, $2, $3), ($4, NULL, NULL)",
                vec![1_i64.into(), 3_i32.into(), 0.5_f64.into(), 2_i64.into()],
            )
            .await?;

        let caching = CachingSchema::new(KeyKind::Int, "serverid")
            .column("hits", CacheRule::Opaque)
            .column("ratio", CacheRule::Opaque);
        let table = DbTable::new(connection, schema, Some(caching))?;
        table.populate().await?;

        assert_eq!(table.cache_len()?, 2);
        assert_eq!(table.cache_get(1, "hits")?, CacheValue::Raw(json!(3)));
        assert_eq!(table.cache_get(1, "ratio")?, CacheValue::Raw(json!(0.5)));
        assert_eq!(table.cache_get(2, "hits")?, CacheValue::Raw(JsonValue::Null));
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_operations_need_caching() -> Result<()> {
        init_test_tracing();
        let connection = connect_test_db().await?;
        let table = DbTable::new(connection, roles_schema(), None)?;
        assert!(matches!(
            table.cache_get(1, "staff"),
            Err(Error::CachingDisabled { .. })
        ));
        assert!(matches!(
            table.cache_update(1, "staff", CacheValue::Int(1)),
            Err(Error::CachingDisabled { .. })
        ));
        Ok(())
    }
}
