//! General Discord commands - ping and help.
//! These commands don't touch any table.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let prefix = ctx
            .data()
            .prefix_for(ctx.guild_id().map(serenity::GuildId::get))?;
        let help_text = format!(
            "**Neutron Help**\n\
            Commands work as slash commands or with the prefix `{prefix}`.\n\n\
            **Configuration** (administrators)\n\
            • `/roles <default|staff|muted|show>` - Configure the guild's special roles.\n\
            • `/permissions <bantime|mutetime|locktime> <role> <duration>` - Limit moderation actions per role.\n\
            • `/permissions show <role>` / `/permissions limits [member]` - Inspect configured limits.\n\
            • `/logging <set|show>` - Route events to log channels.\n\
            • `/prefix <set|reset>` - Change the command prefix of this guild.\n\n\
            **Moderation**\n\
            • `/strike <add|remove|list|info>` - Manage strikes (administrators).\n\
            • `/lock [duration]` / `/unlock` - Stop the default role from talking here, within your lock limit.\n\
            • `/slowmode <delay>` - Set this channel's slowmode, up to 6 hours.\n\n\
            **Utility Commands**\n\
            • `/prefix show` - Shows the prefix in effect.\n\
            • `/ping` - Checks if the bot is responsive.\n\
            • `/help` - Shows this help message.\n\n\
            Durations look like `1w2d`, `3h 30m`, `90s` or `inf`."
        );

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
