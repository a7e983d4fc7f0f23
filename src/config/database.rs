//! Database configuration for `Neutron`.
//!
//! Connection parameters come from the environment (usually through `.env`).
//! `DATABASE_URL` wins when present; otherwise a PostgreSQL URL is assembled
//! from `DATABASE_HOST`, `DATABASE_NAME`, `DATABASE_USER` and
//! `DATABASE_PASSWORD`, with optional `DATABASE_PORT`.

use crate::errors::{Error, Result};
use sea_orm::ConnectOptions;
use std::time::Duration;
use url::Url;

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_MIN_POOL: u32 = 1;
const DEFAULT_MAX_POOL: u32 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Full connection URL
    pub url: String,
    /// Connections kept open at all times
    pub min_connections: u32,
    /// Upper bound of the pool
    pub max_connections: u32,
    /// Timeout for establishing and acquiring connections
    pub timeout: Duration,
}

impl DatabaseSettings {
    /// Reads the settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through `lookup`, which maps variable names to values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => build_postgres_url(&lookup)?,
        };

        let min_connections = parse_or(&lookup, "DATABASE_MIN_POOL", DEFAULT_MIN_POOL)?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_POOL", DEFAULT_MAX_POOL)?;
        if min_connections > max_connections {
            return Err(Error::Config {
                message: format!(
                    "DATABASE_MIN_POOL ({min_connections}) exceeds DATABASE_MAX_POOL ({max_connections})"
                ),
            });
        }
        let timeout = Duration::from_secs(parse_or(
            &lookup,
            "DATABASE_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);

        Ok(Self {
            url,
            min_connections,
            max_connections,
            timeout,
        })
    }

    /// Pool options handed to `sea-orm`.
    #[must_use]
    pub fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new(self.url.clone());
        options
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .connect_timeout(self.timeout)
            .acquire_timeout(self.timeout);
        options
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| Error::Config {
        message: format!("{key} is not set and DATABASE_URL is not provided"),
    })
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|_| Error::Config {
            message: format!("{key} has an invalid value: '{raw}'"),
        })
    })
}

fn build_postgres_url<F>(lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let host = required(lookup, "DATABASE_HOST")?;
    let database = required(lookup, "DATABASE_NAME")?;
    let user = required(lookup, "DATABASE_USER")?;
    let password = required(lookup, "DATABASE_PASSWORD")?;
    let port = parse_or(lookup, "DATABASE_PORT", DEFAULT_PORT)?;

    let invalid = |what: &str| Error::Config {
        message: format!("Cannot use {what} in the database URL"),
    };

    let mut url = Url::parse(&format!("postgres://{host}")).map_err(|_| invalid("DATABASE_HOST"))?;
    url.set_username(&user).map_err(|()| invalid("DATABASE_USER"))?;
    url.set_password(Some(&password))
        .map_err(|()| invalid("DATABASE_PASSWORD"))?;
    url.set_port(Some(port)).map_err(|()| invalid("DATABASE_PORT"))?;
    url.set_path(&database);
    Ok(url.to_string())
}
