/// Database connection settings read from the environment
pub mod database;

/// Bot settings loaded from config.toml
pub mod bot;
