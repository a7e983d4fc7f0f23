use dotenvy::dotenv;
use neutron_bot::{
    bot::{self, BotData},
    config::{bot::load_default_config, database::DatabaseSettings},
    database::Database,
    errors::{Error, Result},
};
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load bot and database configuration
    let config = load_default_config()
        .inspect_err(|e| error!("Critical error loading bot configuration: {}", e))?;
    let settings = DatabaseSettings::from_env()
        .inspect_err(|e| error!("Critical error loading database configuration: {}", e))?;

    // 4. Connect and register every table, populating the cached ones
    let mut db = Database::connect(&settings)
        .await
        .inspect_err(|e| error!("Failed to connect to the database: {}", e))?;
    let data = BotData::load(config, &mut db)
        .await
        .inspect(|_| info!("Database tables loaded successfully."))
        .inspect_err(|e| error!("Failed to load database tables: {}", e))?;

    // 5. Run the bot; the token is read directly before use
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    let outcome = bot::run_bot(token, data).await.map_err(Error::from);

    db.disconnect().await?;
    info!("Database connection closed.");
    outcome
}
