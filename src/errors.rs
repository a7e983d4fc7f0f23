//! Unified error type for the data-access layer and the bot surface.
//!
//! The data layer reports failures through these variants and never produces
//! user-facing text; the bot's error handler turns them into a generic reply.

use thiserror::Error;

/// All errors raised by `Neutron`.
#[derive(Debug, Error)]
pub enum Error {
    /// The database could not be reached, authenticated against, or initialised.
    #[error("Unable to connect to the database: {message}")]
    Connection {
        /// Driver-provided description of the failure
        message: String,
    },

    /// A table with this name was already registered.
    #[error("Table '{name}' is already registered")]
    DuplicateTable {
        /// Name of the table
        name: String,
    },

    /// No table with this name was registered.
    #[error("Table '{name}' is not registered")]
    UnknownTable {
        /// Name of the table
        name: String,
    },

    /// A statement issued by a table failed in the driver.
    #[error("Query on table '{table}' failed: {source}")]
    Query {
        /// Table that issued the statement
        table: String,
        /// The unchanged driver error
        #[source]
        source: sea_orm::DbErr,
    },

    /// The mirror holds no value for this key/column and no default was declared.
    #[error("No cached value for column '{column}' of key {key} in table '{table}'")]
    CacheMiss {
        /// Table owning the mirror
        table: String,
        /// Rendered mirror key
        key: String,
        /// Requested column
        column: String,
    },

    /// A mirror operation was attempted on a table declared without caching.
    #[error("Table '{table}' has no cache")]
    CachingDisabled {
        /// Name of the table
        table: String,
    },

    /// The declared table or caching schema is inconsistent.
    #[error("Invalid schema for table '{table}': {message}")]
    InvalidSchema {
        /// Name of the table
        table: String,
        /// What is wrong with the declaration
        message: String,
    },

    /// A value could not be converted according to the column's caching rule.
    #[error("Cannot coerce value for column '{column}' of table '{table}': {message}")]
    Coercion {
        /// Name of the table
        table: String,
        /// Column whose rule failed
        column: String,
        /// Details about the offending value
        message: String,
    },

    /// The mirror lock was poisoned by a panicking writer.
    #[error("Cache lock for table '{table}' is poisoned")]
    LockPoisoned {
        /// Name of the table
        table: String,
    },

    /// A Discord ID does not fit the database's signed integer columns.
    #[error("ID {id} is out of range for storage")]
    InvalidId {
        /// The offending ID
        id: u64,
    },

    /// A duration string could not be parsed.
    #[error("Invalid duration: '{input}'")]
    InvalidDuration {
        /// The raw user input
        input: String,
    },

    /// A guild prefix is empty or too long.
    #[error("Invalid prefix: '{prefix}'")]
    InvalidPrefix {
        /// The rejected prefix, trimmed
        prefix: String,
    },

    /// Configuration is missing or malformed.
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// Untagged database error (connection management, pool teardown).
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Environment variable lookup failed.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Building a reply string failed.
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Error coming from serenity or poise.
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Whether this is a [`Error::CacheMiss`], which callers usually recover from.
    #[must_use]
    pub const fn is_cache_miss(&self) -> bool {
        matches!(self, Self::CacheMiss { .. })
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
