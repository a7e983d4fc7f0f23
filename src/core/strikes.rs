//! Strikes - moderation records with IDs that are serial within each guild.
//!
//! Two tables back this module: `strike_index` hands out the next ID of a
//! guild and `strikes` holds the records themselves. Neither is mirrored.

use crate::{
    core::to_db_id,
    database::{Database, DbTable, TableSchema},
    errors::{Error, Result},
};
use sea_orm::{QueryResult, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

const COLUMNS: &str = "serverid, id, author, user_id, strike_type, reason";

/// Strike types recorded by the moderation commands.
pub const STRIKE_TYPES: [&str; 5] = ["ban", "kick", "mute", "warning", "note"];

/// One strike given to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strike {
    /// Guild the strike belongs to
    pub guild: u64,
    /// Serial ID within the guild, starting at 1
    pub id: u64,
    /// Moderator who issued it
    pub author: u64,
    /// User who received it
    pub user: u64,
    /// Kind of infraction, e.g. `ban` or `warning`
    pub strike_type: String,
    /// Free-form reason
    pub reason: Option<String>,
}

/// Handle to the `strikes` and `strike_index` tables.
#[derive(Debug, Clone)]
pub struct Strikes {
    strikes: Arc<DbTable>,
    index: Arc<DbTable>,
}

fn index_schema() -> TableSchema {
    TableSchema::new("strike_index")
        .column("serverid", "BIGINT PRIMARY KEY")
        .column("next_id", "BIGINT NOT NULL DEFAULT 0")
}

fn strikes_schema() -> TableSchema {
    TableSchema::new("strikes")
        .column("serverid", "BIGINT NOT NULL")
        .column("id", "BIGINT NOT NULL")
        .column("author", "BIGINT NOT NULL")
        .column("user_id", "BIGINT NOT NULL")
        .column("strike_type", "TEXT NOT NULL")
        .column("reason", "TEXT")
        .constraint("UNIQUE (serverid, id)")
}

impl Strikes {
    /// Registers both tables on `db`.
    pub async fn load(db: &mut Database) -> Result<Self> {
        let index = DbTable::new(db.connection().clone(), index_schema(), None)?;
        let index = db.add_table(index).await?;
        let strikes = DbTable::new(db.connection().clone(), strikes_schema(), None)?;
        let strikes = db.add_table(strikes).await?;
        Ok(Self { strikes, index })
    }

    /// Reserves the next strike ID of the guild.
    #[instrument(skip(self))]
    async fn next_id(&self, guild: u64) -> Result<u64> {
        let row = self
            .index
            .db_fetchone(
                "INSERT INTO strike_index (serverid, next_id) VALUES ($1, 1) \
                 ON CONFLICT (serverid) DO UPDATE SET next_id = strike_index.next_id + 1 \
                 RETURNING next_id",
                vec![to_db_id(guild)?.into()],
            )
            .await?;
        let row = row.ok_or_else(|| Error::Coercion {
            table: self.index.name().to_string(),
            column: "next_id".to_string(),
            message: "no ID was returned".to_string(),
        })?;
        read_id(&self.index, &row, "next_id")
    }

    /// Stores a strike and returns its ID.
    ///
    /// A fresh ID is allocated unless `strike_id` is given, in which case the
    /// existing strike with that ID is overwritten.
    pub async fn add_strike(
        &self,
        guild: u64,
        author: u64,
        user: u64,
        strike_type: &str,
        reason: Option<&str>,
        strike_id: Option<u64>,
    ) -> Result<u64> {
        let id = match strike_id {
            Some(id) => id,
            None => self.next_id(guild).await?,
        };
        debug!(
            "Adding {} strike {} to {} from {} for {:?}",
            strike_type, id, user, author, reason
        );

        self.strikes
            .db_upsert(
                &["serverid", "id", "author", "user_id", "strike_type", "reason"],
                vec![
                    to_db_id(guild)?.into(),
                    to_db_id(id)?.into(),
                    to_db_id(author)?.into(),
                    to_db_id(user)?.into(),
                    strike_type.into(),
                    reason.map(str::to_string).into(),
                ],
                &["serverid", "id"],
            )
            .await?;
        Ok(id)
    }

    /// Deletes a strike, returning it when it existed.
    pub async fn remove_strike(&self, guild: u64, id: u64) -> Result<Option<Strike>> {
        let row = self
            .strikes
            .db_fetchone(
                &format!("DELETE FROM strikes WHERE serverid = $1 AND id = $2 RETURNING {COLUMNS}"),
                vec![to_db_id(guild)?.into(), to_db_id(id)?.into()],
            )
            .await?;
        if row.is_some() {
            debug!("Strike {} of {} has been removed", id, guild);
        }
        row.map(|row| self.strike_from_row(&row)).transpose()
    }

    /// Looks up one strike of the guild.
    pub async fn get_strike(&self, guild: u64, id: u64) -> Result<Option<Strike>> {
        let row = self
            .strikes
            .db_get(
                &COLUMNS.split(", ").collect::<Vec<_>>(),
                "serverid = $1 AND id = $2",
                vec![to_db_id(guild)?.into(), to_db_id(id)?.into()],
            )
            .await?;
        row.map(|row| self.strike_from_row(&row)).transpose()
    }

    /// Strikes received by `user`, oldest first.
    pub async fn get_user_strikes(&self, guild: u64, user: u64) -> Result<Vec<Strike>> {
        self.select("serverid = $1 AND user_id = $2", vec![
            to_db_id(guild)?.into(),
            to_db_id(user)?.into(),
        ])
        .await
    }

    /// Strikes issued by `author`, oldest first.
    pub async fn get_author_strikes(&self, guild: u64, author: u64) -> Result<Vec<Strike>> {
        self.select("serverid = $1 AND author = $2", vec![
            to_db_id(guild)?.into(),
            to_db_id(author)?.into(),
        ])
        .await
    }

    /// Every strike of the guild, oldest first.
    pub async fn get_guild_strikes(&self, guild: u64) -> Result<Vec<Strike>> {
        self.select("serverid = $1", vec![to_db_id(guild)?.into()])
            .await
    }

    async fn select(&self, specification: &str, args: Vec<Value>) -> Result<Vec<Strike>> {
        let statement =
            format!("SELECT {COLUMNS} FROM strikes WHERE {specification} ORDER BY id");
        self.strikes
            .db_fetch(&statement, args)
            .await?
            .iter()
            .map(|row| self.strike_from_row(row))
            .collect()
    }

    fn strike_from_row(&self, row: &QueryResult) -> Result<Strike> {
        let table = &self.strikes;
        Ok(Strike {
            guild: read_id(table, row, "serverid")?,
            id: read_id(table, row, "id")?,
            author: read_id(table, row, "author")?,
            user: read_id(table, row, "user_id")?,
            strike_type: table.read(row, "strike_type")?,
            reason: table.read(row, "reason")?,
        })
    }
}

fn read_id(table: &DbTable, row: &QueryResult, column: &str) -> Result<u64> {
    let stored: i64 = table.read(row, column)?;
    u64::try_from(stored).map_err(|_| Error::Coercion {
        table: table.name().to_string(),
        column: column.to_string(),
        message: format!("{stored} is not a valid ID"),
    })
}
