//! Prefix commands - `prefix set|reset|show`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::prefixes::MAX_PREFIX_LEN,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Manages the command prefix of this server.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        subcommands("prefix_set", "prefix_reset", "prefix_show")
    )]
    pub async fn prefix(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Prefix command. Available subcommands:\n\
            `/prefix set <prefix>` - Use a custom prefix in this server\n\
            `/prefix reset` - Go back to the default prefix\n\
            `/prefix show` - Show the prefix in effect";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Sets a custom prefix for this server.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "set"
    )]
    pub async fn prefix_set(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "New prefix"] prefix: String,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        match ctx.data().prefixes.set_prefix(guild_id.get(), &prefix).await {
            Ok(()) => {
                ctx.say(format!("✅ Prefix set to `{}`.", prefix.trim()))
                    .await?;
            }
            Err(Error::InvalidPrefix { .. }) => {
                ctx.say(format!(
                    "❌ The prefix must be between 1 and {MAX_PREFIX_LEN} characters."
                ))
                .await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Removes the custom prefix of this server.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "reset"
    )]
    pub async fn prefix_reset(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        let data = ctx.data();
        data.prefixes.reset_prefix(guild_id.get()).await?;
        ctx.say(format!(
            "✅ Prefix reset to `{}`.",
            data.config.command_prefix
        ))
        .await?;
        Ok(())
    }

    /// Shows the prefix in effect.
    #[poise::command(slash_command, prefix_command, rename = "show")]
    pub async fn prefix_show(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let prefix = ctx
            .data()
            .prefix_for(ctx.guild_id().map(serenity::GuildId::get))?;
        ctx.say(format!("The prefix here is `{prefix}`.")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
