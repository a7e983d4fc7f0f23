//! Permissions table - how long members holding a role may ban, mute or lock for.
//!
//! Rows are keyed by `(serverid, role)`, which the single-column mirror cannot
//! express, so this table reads straight from the database.

use crate::{
    core::{duration::TimeLimit, to_db_id},
    database::{DbTable, Table, TableSchema},
    errors::Result,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// Moderation action a time limit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKind {
    /// Temporary bans
    Ban,
    /// Temporary mutes
    Mute,
    /// Channel locks
    Lock,
}

impl TimeKind {
    /// All kinds in display order.
    pub const ALL: [Self; 3] = [Self::Ban, Self::Mute, Self::Lock];

    /// Backing column.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Ban => "bantime",
            Self::Mute => "mutetime",
            Self::Lock => "locktime",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Mute => "mute",
            Self::Lock => "lock",
        }
    }
}

/// Limits configured for one role; `None` when unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RolePermissions {
    /// Maximum temporary ban
    pub ban: Option<TimeLimit>,
    /// Maximum temporary mute
    pub mute: Option<TimeLimit>,
    /// Maximum channel lock
    pub lock: Option<TimeLimit>,
}

/// Handle to the `permissions` table.
#[derive(Debug, Clone)]
pub struct Permissions {
    table: Arc<DbTable>,
}

impl Table for Permissions {
    fn schema() -> TableSchema {
        TableSchema::new("permissions")
            .column("serverid", "BIGINT NOT NULL")
            .column("role", "BIGINT DEFAULT 0")
            .column("bantime", "BIGINT DEFAULT 0")
            .column("mutetime", "BIGINT DEFAULT 0")
            .column("locktime", "BIGINT DEFAULT 0")
            .constraint("UNIQUE (serverid, role)")
    }

    fn from_table(table: Arc<DbTable>) -> Self {
        Self { table }
    }
}

impl Permissions {
    /// Sets the `kind` limit of `role`; `None` clears it.
    pub async fn set_time(
        &self,
        kind: TimeKind,
        guild: u64,
        role: u64,
        limit: Option<TimeLimit>,
    ) -> Result<()> {
        let value = limit.map_or(0, TimeLimit::to_db);
        debug!(
            "Setting {} on {} for <@&{}> to {}",
            kind.column(),
            guild,
            role,
            value
        );
        self.table
            .db_upsert(
                &["serverid", "role", kind.column()],
                vec![to_db_id(guild)?.into(), to_db_id(role)?.into(), value.into()],
                &["serverid", "role"],
            )
            .await
    }

    /// The `kind` limit configured directly on `role`.
    pub async fn get_role_time(
        &self,
        kind: TimeKind,
        guild: u64,
        role: u64,
    ) -> Result<Option<TimeLimit>> {
        let row = self
            .table
            .db_get(
                &[kind.column()],
                "serverid = $1 AND role = $2",
                vec![to_db_id(guild)?.into(), to_db_id(role)?.into()],
            )
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let stored: Option<i64> = self.table.read(&row, kind.column())?;
        Ok(stored.and_then(TimeLimit::from_db))
    }

    /// Every limit configured directly on `role`.
    pub async fn get_role_permissions(&self, guild: u64, role: u64) -> Result<RolePermissions> {
        let columns: Vec<&str> = TimeKind::ALL.iter().map(|kind| kind.column()).collect();
        let row = self
            .table
            .db_get(
                &columns,
                "serverid = $1 AND role = $2",
                vec![to_db_id(guild)?.into(), to_db_id(role)?.into()],
            )
            .await?;

        let Some(row) = row else {
            return Ok(RolePermissions::default());
        };
        let read = |kind: TimeKind| -> Result<Option<TimeLimit>> {
            let stored: Option<i64> = self.table.read(&row, kind.column())?;
            Ok(stored.and_then(TimeLimit::from_db))
        };
        Ok(RolePermissions {
            ban: read(TimeKind::Ban)?,
            mute: read(TimeKind::Mute)?,
            lock: read(TimeKind::Lock)?,
        })
    }

    /// Effective `kind` limit of a member.
    ///
    /// Administrators are unlimited. Otherwise `roles` is walked from the
    /// highest role in the hierarchy down and the first configured limit wins.
    pub async fn get_member_time(
        &self,
        kind: TimeKind,
        guild: u64,
        roles_highest_first: &[u64],
        is_administrator: bool,
    ) -> Result<Option<TimeLimit>> {
        if is_administrator {
            return Ok(Some(TimeLimit::Unlimited));
        }

        for role in roles_highest_first {
            if let Some(limit) = self.get_role_time(kind, guild, *role).await? {
                trace!("{} limit of <@&{}> applies: {:?}", kind.label(), role, limit);
                return Ok(Some(limit));
            }
        }
        Ok(None)
    }
}
