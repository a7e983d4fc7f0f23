//! Developer commands - `sudo shutdown`.
//!
//! Only users listed under `developers` in config.toml pass the check.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };
    use tracing::{info, warn};

    async fn developer_only(ctx: poise::Context<'_, BotData, Error>) -> Result<bool> {
        let author = ctx.author().id.get();
        let allowed = ctx.data().config.is_developer(author);
        if !allowed {
            warn!(
                "Refused developer command `{}` for {}",
                ctx.command().qualified_name,
                author
            );
        }
        Ok(allowed)
    }

    /// Administrative commands for the bot's developers.
    #[poise::command(
        prefix_command,
        slash_command,
        hide_in_help,
        check = "developer_only",
        subcommands("sudo_shutdown")
    )]
    pub async fn sudo(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Developer command. Available subcommands:\n`sudo shutdown` - Turn the bot off")
            .await?;
        Ok(())
    }

    /// Turns the bot off.
    #[poise::command(
        prefix_command,
        slash_command,
        hide_in_help,
        check = "developer_only",
        rename = "shutdown"
    )]
    pub async fn sudo_shutdown(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        info!("Shutdown requested by {}", ctx.author().id.get());
        ctx.say("✅ Shutting down.").await?;
        ctx.framework().shard_manager().shutdown_all().await;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
