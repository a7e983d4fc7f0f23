//! Log channels table - where each kind of guild event gets reported.

use crate::{
    core::{from_db_id, to_db_id},
    database::{CacheRule, CachingSchema, ColumnKind, DbTable, KeyKind, Table, TableSchema},
    errors::Result,
};
use std::sync::Arc;
use tracing::debug;

/// Category of events sent to a log channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogChannelType {
    /// Guild and channel changes
    Server,
    /// Moderation actions
    Mod,
    /// Message edits and deletions
    Message,
    /// Member updates such as nickname and role changes
    Member,
    /// Joins and leaves
    Join,
    /// Voice channel activity
    Voice,
}

impl LogChannelType {
    /// All types in display order.
    pub const ALL: [Self; 6] = [
        Self::Server,
        Self::Mod,
        Self::Message,
        Self::Member,
        Self::Join,
        Self::Voice,
    ];

    /// Backing column.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Server => "server_log",
            Self::Mod => "mod_log",
            Self::Message => "message_log",
            Self::Member => "member_log",
            Self::Join => "join_log",
            Self::Voice => "voice_log",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Server => "Server",
            Self::Mod => "Moderation",
            Self::Message => "Message",
            Self::Member => "Member",
            Self::Join => "Join",
            Self::Voice => "Voice",
        }
    }
}

/// Handle to the `log_channels` table.
#[derive(Debug, Clone)]
pub struct LogChannels {
    table: Arc<DbTable>,
}

impl Table for LogChannels {
    fn schema() -> TableSchema {
        LogChannelType::ALL.iter().fold(
            TableSchema::new("log_channels").column("serverid", "BIGINT UNIQUE NOT NULL"),
            |schema, kind| schema.column(kind.column(), "BIGINT DEFAULT 0"),
        )
    }

    fn caching() -> Option<CachingSchema> {
        let caching = LogChannelType::ALL.iter().fold(
            CachingSchema::new(KeyKind::Int, "serverid"),
            |schema, kind| schema.column(kind.column(), CacheRule::with_default(ColumnKind::Int, 0)),
        );
        Some(caching)
    }

    fn from_table(table: Arc<DbTable>) -> Self {
        Self { table }
    }
}

impl LogChannels {
    /// Routes `kind` events of the guild to `channel`; `None` disables them.
    pub async fn set_log_channel(
        &self,
        kind: LogChannelType,
        guild: u64,
        channel: Option<u64>,
    ) -> Result<()> {
        let stored = match channel {
            Some(channel) => to_db_id(channel)?,
            None => 0,
        };
        debug!("Setting {} on {} to {}", kind.column(), guild, stored);
        self.table
            .db_upsert(
                &["serverid", kind.column()],
                vec![to_db_id(guild)?.into(), stored.into()],
                &["serverid"],
            )
            .await
    }

    /// Channel receiving `kind` events, if configured.
    pub fn get_log_channel(&self, kind: LogChannelType, guild: u64) -> Result<Option<u64>> {
        let value = self.table.cache_get(to_db_id(guild)?, kind.column())?;
        Ok(value.as_int().and_then(from_db_id))
    }

    /// Every log channel of the guild, in [`LogChannelType::ALL`] order.
    pub fn get_log_channels(&self, guild: u64) -> Result<Vec<(LogChannelType, Option<u64>)>> {
        LogChannelType::ALL
            .iter()
            .map(|kind| Ok((*kind, self.get_log_channel(*kind, guild)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_tracing, setup_test_db};

    #[tokio::test]
    async fn test_set_and_disable_log_channel() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        let channels = db.load_table::<LogChannels>().await?;

        assert_eq!(channels.get_log_channel(LogChannelType::Mod, 5)?, None);

        channels
            .set_log_channel(LogChannelType::Mod, 5, Some(500))
            .await?;
        channels
            .set_log_channel(LogChannelType::Join, 5, Some(501))
            .await?;
        assert_eq!(channels.get_log_channel(LogChannelType::Mod, 5)?, Some(500));

        channels.set_log_channel(LogChannelType::Mod, 5, None).await?;
        let all = channels.get_log_channels(5)?;
        assert_eq!(all.len(), LogChannelType::ALL.len());
        assert!(all.contains(&(LogChannelType::Mod, None)));
        assert!(all.contains(&(LogChannelType::Join, Some(501))));
        assert!(all.contains(&(LogChannelType::Voice, None)));
        Ok(())
    }

    #[tokio::test]
    async fn test_guilds_are_isolated() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        let channels = db.load_table::<LogChannels>().await?;

        channels
            .set_log_channel(LogChannelType::Server, 1, Some(11))
            .await?;
        assert_eq!(channels.get_log_channel(LogChannelType::Server, 2)?, None);
        Ok(())
    }
}
