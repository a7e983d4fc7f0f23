//! Prefixes table - per-guild command prefixes.
//!
//! The prefix column has no cached default: guilds without a custom prefix
//! miss the mirror and the caller falls back to the configured prefix.

use crate::{
    core::to_db_id,
    database::{CacheRule, CachingSchema, ColumnKind, DbTable, KeyKind, Table, TableSchema},
    errors::{Error, Result},
};
use sea_orm::Value;
use std::sync::Arc;
use tracing::debug;

/// Longest prefix a guild may configure.
pub const MAX_PREFIX_LEN: usize = 16;

/// Handle to the `prefixes` table.
#[derive(Debug, Clone)]
pub struct Prefixes {
    table: Arc<DbTable>,
}

impl Table for Prefixes {
    fn schema() -> TableSchema {
        TableSchema::new("prefixes")
            .column("serverid", "BIGINT UNIQUE NOT NULL")
            .column("prefix", "TEXT")
    }

    fn caching() -> Option<CachingSchema> {
        Some(
            CachingSchema::new(KeyKind::Int, "serverid")
                .column("prefix", CacheRule::typed(ColumnKind::Text)),
        )
    }

    fn from_table(table: Arc<DbTable>) -> Self {
        Self { table }
    }
}

impl Prefixes {
    /// Stores a custom prefix for the guild.
    ///
    /// The prefix is trimmed and must then hold 1 to [`MAX_PREFIX_LEN`] characters.
    pub async fn set_prefix(&self, guild: u64, prefix: &str) -> Result<()> {
        let prefix = prefix.trim();
        if prefix.is_empty() || prefix.chars().count() > MAX_PREFIX_LEN {
            return Err(Error::InvalidPrefix {
                prefix: prefix.to_string(),
            });
        }
        debug!("Setting prefix of {} to {:?}", guild, prefix);
        self.table
            .db_upsert(
                &["serverid", "prefix"],
                vec![to_db_id(guild)?.into(), prefix.into()],
                &["serverid"],
            )
            .await
    }

    /// The guild's custom prefix, if it has one.
    pub fn get_prefix(&self, guild: u64) -> Result<Option<String>> {
        match self.table.cache_get(to_db_id(guild)?, "prefix") {
            Ok(value) => Ok(value.as_text().map(str::to_string)),
            Err(e) if e.is_cache_miss() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Removes the guild's custom prefix.
    pub async fn reset_prefix(&self, guild: u64) -> Result<()> {
        debug!("Resetting prefix of {}", guild);
        self.table
            .db_set(
                "prefix",
                Value::String(None),
                "serverid = $1",
                vec![to_db_id(guild)?.into()],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_tracing, setup_test_db};

    #[tokio::test]
    async fn test_prefix_lifecycle() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        let prefixes = db.load_table::<Prefixes>().await?;

        assert_eq!(prefixes.get_prefix(3)?, None);

        prefixes.set_prefix(3, "!").await?;
        assert_eq!(prefixes.get_prefix(3)?.as_deref(), Some("!"));

        prefixes.set_prefix(3, " ?? ").await?;
        assert_eq!(prefixes.get_prefix(3)?.as_deref(), Some("??"));

        prefixes.reset_prefix(3).await?;
        assert_eq!(prefixes.get_prefix(3)?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_is_persisted() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        let prefixes = db.load_table::<Prefixes>().await?;
        prefixes.set_prefix(4, "$").await?;
        prefixes.set_prefix(5, "%").await?;
        prefixes.reset_prefix(4).await?;

        let mut reloaded = crate::database::Database::from_connection(db.connection().clone());
        let prefixes = reloaded.load_table::<Prefixes>().await?;
        assert_eq!(prefixes.get_prefix(4)?, None);
        assert_eq!(prefixes.get_prefix(5)?.as_deref(), Some("%"));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_prefixes_are_rejected() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        let prefixes = db.load_table::<Prefixes>().await?;

        assert!(matches!(
            prefixes.set_prefix(1, "   ").await,
            Err(Error::InvalidPrefix { ref prefix }) if prefix.is_empty()
        ));
        assert!(matches!(
            prefixes.set_prefix(1, &"x".repeat(MAX_PREFIX_LEN + 1)).await,
            Err(Error::InvalidPrefix { .. })
        ));
        assert_eq!(prefixes.get_prefix(1)?, None);
        Ok(())
    }
}
