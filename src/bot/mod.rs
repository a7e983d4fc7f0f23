//! Bot layer - Discord-specific interface and command handlers
//!
//! This module wires the guild configuration tables into a `poise` framework:
//! shared bot data, the dynamic prefix and the client start-up.

/// Discord command implementations (general, roles, permissions, logging, prefix, strikes, moderation, sudo)
pub mod commands;
/// Discord interaction handlers (errors, events, autocomplete)
pub mod handlers;

use crate::{
    config::bot::BotConfig,
    core::{
        log_channels::LogChannels, permissions::Permissions, prefixes::Prefixes, roles::Roles,
        strikes::Strikes,
    },
    database::Database,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{error, info, instrument};

/// Messages kept per channel so deletions can be logged with their content.
const MESSAGE_CACHE_SIZE: usize = 200;

/// Command context used throughout the bot.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Shared data available to all bot commands.
/// Every table handle reads its mirror synchronously and shares one pool.
#[derive(Debug)]
pub struct BotData {
    /// Settings from config.toml
    pub config: BotConfig,
    /// Default, muted and staff roles
    pub roles: Roles,
    /// Moderation time limits per role
    pub permissions: Permissions,
    /// Log channel routing
    pub log_channels: LogChannels,
    /// Custom command prefixes
    pub prefixes: Prefixes,
    /// Moderation strikes
    pub strikes: Strikes,
}

impl BotData {
    /// Registers every table on `db` and bundles the handles.
    ///
    /// Tables are created when missing and their mirrors populated before
    /// the bot starts answering commands.
    pub async fn load(config: BotConfig, db: &mut Database) -> Result<Self> {
        let data = Self {
            config,
            roles: db.load_table().await?,
            permissions: db.load_table().await?,
            log_channels: db.load_table().await?,
            prefixes: db.load_table().await?,
            strikes: Strikes::load(db).await?,
        };
        info!("Loaded tables: {}", db.table_names().join(", "));
        Ok(data)
    }

    /// Prefix in effect for `guild`, falling back to the configured one.
    pub fn prefix_for(&self, guild: Option<u64>) -> Result<String> {
        let custom = match guild {
            Some(guild) => self.prefixes.get_prefix(guild)?,
            None => None,
        };
        Ok(custom.unwrap_or_else(|| self.config.command_prefix.clone()))
    }
}

fn dynamic_prefix(
    ctx: poise::PartialContext<'_, BotData, Error>,
) -> poise::BoxFuture<'_, Result<Option<String>>> {
    Box::pin(async move {
        let guild = ctx.guild_id.map(serenity::GuildId::get);
        ctx.data.prefix_for(guild).map(Some)
    })
}

/// Every command exposed by the bot.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::ping(),
        commands::help(),
        commands::roles(),
        commands::permissions(),
        commands::logging(),
        commands::prefix(),
        commands::strike(),
        commands::lock(),
        commands::unlock(),
        commands::slowmode(),
        commands::sudo(),
    ]
}

/// Starts the Discord client and blocks until it shuts down.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> std::result::Result<(), serenity::Error> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                dynamic_prefix: Some(dynamic_prefix),
                ..Default::default()
            },
            on_error: |error| Box::pin(handlers::on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let mut cache_settings = ::serenity::cache::Settings::default();
    cache_settings.max_messages = MESSAGE_CACHE_SIZE;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .cache_settings(cache_settings)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_tracing, setup_test_db};

    #[tokio::test]
    async fn test_prefix_falls_back_to_config() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        let data = BotData::load(BotConfig::default(), &mut db).await?;

        assert_eq!(data.prefix_for(None)?, ">>");
        assert_eq!(data.prefix_for(Some(9))?, ">>");

        data.prefixes.set_prefix(9, "!").await?;
        assert_eq!(data.prefix_for(Some(9))?, "!");
        assert_eq!(data.prefix_for(Some(8))?, ">>");
        Ok(())
    }

    #[tokio::test]
    async fn test_load_registers_every_table() -> Result<()> {
        init_test_tracing();
        let mut db = setup_test_db().await?;
        BotData::load(BotConfig::default(), &mut db).await?;

        assert_eq!(
            db.table_names(),
            vec![
                "log_channels",
                "permissions",
                "prefixes",
                "roles",
                "strike_index",
                "strikes"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_command_tree() {
        let names: Vec<String> = all_commands().into_iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "ping",
                "help",
                "roles",
                "permissions",
                "logging",
                "prefix",
                "strike",
                "lock",
                "unlock",
                "slowmode",
                "sudo"
            ]
        );
    }
}
