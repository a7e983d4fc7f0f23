//! Roles table - the default, muted and staff role configured for each guild.
//!
//! The table is mirrored in memory, so reads are synchronous and never hit the
//! database after startup.

use crate::{
    core::{from_db_id, to_db_id},
    database::{CacheRule, CachingSchema, ColumnKind, DbTable, KeyKind, Table, TableSchema},
    errors::Result,
};
use std::sync::Arc;
use tracing::debug;

/// Which configured role to read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    /// Role given to every new member
    Default,
    /// Role applied by the mute command
    Muted,
    /// Role identifying the guild's staff
    Staff,
}

impl RoleKind {
    /// All kinds in display order.
    pub const ALL: [Self; 3] = [Self::Default, Self::Staff, Self::Muted];

    /// Backing column.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Default => "default_role",
            Self::Muted => "muted_role",
            Self::Staff => "staff_role",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Muted => "Muted",
            Self::Staff => "Staff",
        }
    }
}

/// All configured roles of one guild; `None` when unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuildRoles {
    /// Default role
    pub default: Option<u64>,
    /// Muted role
    pub muted: Option<u64>,
    /// Staff role
    pub staff: Option<u64>,
}

/// Handle to the `roles` table.
#[derive(Debug, Clone)]
pub struct Roles {
    table: Arc<DbTable>,
}

impl Table for Roles {
    fn schema() -> TableSchema {
        TableSchema::new("roles")
            .column("serverid", "BIGINT UNIQUE NOT NULL")
            .column("default_role", "BIGINT DEFAULT 0")
            .column("muted_role", "BIGINT DEFAULT 0")
            .column("staff_role", "BIGINT DEFAULT 0")
    }

    fn caching() -> Option<CachingSchema> {
        let caching = RoleKind::ALL
            .iter()
            .fold(CachingSchema::new(KeyKind::Int, "serverid"), |schema, kind| {
                schema.column(kind.column(), CacheRule::with_default(ColumnKind::Int, 0))
            });
        Some(caching)
    }

    fn from_table(table: Arc<DbTable>) -> Self {
        Self { table }
    }
}

impl Roles {
    /// Stores `role` as the guild's role of `kind`.
    pub async fn set_role(&self, kind: RoleKind, guild: u64, role: u64) -> Result<()> {
        debug!("Setting {} on {} to <@&{}>", kind.column(), guild, role);
        self.table
            .db_upsert(
                &["serverid", kind.column()],
                vec![to_db_id(guild)?.into(), to_db_id(role)?.into()],
                &["serverid"],
            )
            .await
    }

    /// Reads the guild's role of `kind` from the mirror.
    pub fn get_role(&self, kind: RoleKind, guild: u64) -> Result<Option<u64>> {
        let value = self.table.cache_get(to_db_id(guild)?, kind.column())?;
        Ok(value.as_int().and_then(from_db_id))
    }

    /// Reads every configured role of the guild.
    pub fn get_roles(&self, guild: u64) -> Result<GuildRoles> {
        Ok(GuildRoles {
            default: self.get_role(RoleKind::Default, guild)?,
            muted: self.get_role(RoleKind::Muted, guild)?,
            staff: self.get_role(RoleKind::Staff, guild)?,
        })
    }

    /// Stores the default role.
    pub async fn set_default_role(&self, guild: u64, role: u64) -> Result<()> {
        self.set_role(RoleKind::Default, guild, role).await
    }

    /// Stores the muted role.
    pub async fn set_muted_role(&self, guild: u64, role: u64) -> Result<()> {
        self.set_role(RoleKind::Muted, guild, role).await
    }

    /// Stores the staff role.
    pub async fn set_staff_role(&self, guild: u64, role: u64) -> Result<()> {
        self.set_role(RoleKind::Staff, guild, role).await
    }

    /// Default role, if configured.
    pub fn get_default_role(&self, guild: u64) -> Result<Option<u64>> {
        self.get_role(RoleKind::Default, guild)
    }

    /// Muted role, if configured.
    pub fn get_muted_role(&self, guild: u64) -> Result<Option<u64>> {
        self.get_role(RoleKind::Muted, guild)
    }

    /// Staff role, if configured.
    pub fn get_staff_role(&self, guild: u64) -> Result<Option<u64>> {
        self.get_role(RoleKind::Staff, guild)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_tracing, setup_test_db};

    #[tokio::test]
    async fn test_unconfigured_guild_has_no_roles() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        let roles = db.load_table::<Roles>().await?;

        assert_eq!(roles.get_roles(1)?, GuildRoles::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_roles_independently() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        let roles = db.load_table::<Roles>().await?;

        roles.set_staff_role(10, 100).await?;
        roles.set_muted_role(10, 200).await?;

        assert_eq!(roles.get_staff_role(10)?, Some(100));
        assert_eq!(roles.get_muted_role(10)?, Some(200));
        assert_eq!(roles.get_default_role(10)?, None);

        roles.set_staff_role(10, 101).await?;
        assert_eq!(roles.get_staff_role(10)?, Some(101));
        assert_eq!(roles.get_muted_role(10)?, Some(200));
        Ok(())
    }

    #[tokio::test]
    async fn test_roles_survive_reload() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        let roles = db.load_table::<Roles>().await?;
        roles.set_default_role(7, 70).await?;

        // A second registry on the same pool repopulates from the stored rows.
        let mut reloaded = crate::database::Database::from_connection(db.connection().clone());
        let roles = reloaded.load_table::<Roles>().await?;
        assert_eq!(
            roles.get_roles(7)?,
            GuildRoles {
                default: Some(70),
                muted: None,
                staff: None,
            }
        );
        Ok(())
    }
}
