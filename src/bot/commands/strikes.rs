//! Strike commands - `strike add|remove|list|info`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::strikes::Strike,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write as _;

    /// Longest reply body before the list is cut short.
    const MAX_REPLY_LEN: usize = 1900;

    fn format_strike(strike: &Strike) -> String {
        format!(
            "`#{}` **{}** <@{}> by <@{}>: {}",
            strike.id,
            strike.strike_type,
            strike.user,
            strike.author,
            strike.reason.as_deref().unwrap_or("no reason given")
        )
    }

    /// Manages moderation strikes.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        subcommands("strike_add", "strike_remove", "strike_list", "strike_info")
    )]
    pub async fn strike(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Strike command. Available subcommands:\n\
            `/strike add <user> <type> [reason]` - Record a strike\n\
            `/strike remove <id>` - Delete a strike\n\
            `/strike list [user]` - List strikes of a user or the whole server\n\
            `/strike info <id>` - Show one strike";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Records a strike against a user.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "add"
    )]
    pub async fn strike_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User receiving the strike"] user: serenity::User,
        #[description = "Kind of infraction"]
        #[autocomplete = "autocomplete::autocomplete_strike_type"]
        strike_type: String,
        #[description = "Reason for the strike"]
        #[rest]
        reason: Option<String>,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        let strike_type = strike_type.trim().to_lowercase();
        if strike_type.is_empty() {
            ctx.say("❌ Strike type cannot be empty.").await?;
            return Ok(());
        }

        let id = ctx
            .data()
            .strikes
            .add_strike(
                guild_id.get(),
                ctx.author().id.get(),
                user.id.get(),
                &strike_type,
                reason.as_deref(),
                None,
            )
            .await?;
        ctx.say(format!(
            "✅ Strike `#{id}` ({strike_type}) recorded for <@{}>.",
            user.id.get()
        ))
        .await?;
        Ok(())
    }

    /// Deletes a strike.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "remove"
    )]
    pub async fn strike_remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "ID of the strike"] id: u64,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        match ctx.data().strikes.remove_strike(guild_id.get(), id).await? {
            Some(strike) => {
                ctx.say(format!("🗑️ Removed {}", format_strike(&strike)))
                    .await?;
            }
            None => {
                ctx.say(format!("❌ No strike `#{id}` in this server.")).await?;
            }
        }
        Ok(())
    }

    /// Lists the strikes of a user, or of the whole server.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "list"
    )]
    pub async fn strike_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only show strikes of this user"] user: Option<serenity::User>,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        let strikes = &ctx.data().strikes;
        let (title, list) = match &user {
            Some(user) => (
                format!("**Strikes of <@{}>**", user.id.get()),
                strikes
                    .get_user_strikes(guild_id.get(), user.id.get())
                    .await?,
            ),
            None => (
                "**Strikes in this server**".to_string(),
                strikes.get_guild_strikes(guild_id.get()).await?,
            ),
        };

        if list.is_empty() {
            ctx.say("No strikes found.").await?;
            return Ok(());
        }

        let mut message = title;
        for (shown, strike) in list.iter().enumerate() {
            let line = format_strike(strike);
            if message.len() + line.len() + 1 > MAX_REPLY_LEN {
                write!(message, "\n… and {} more", list.len() - shown)?;
                break;
            }
            write!(message, "\n{line}")?;
        }

        ctx.say(message).await?;
        Ok(())
    }

    /// Shows one strike.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "info"
    )]
    pub async fn strike_info(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "ID of the strike"] id: u64,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        let message = match ctx.data().strikes.get_strike(guild_id.get(), id).await? {
            Some(strike) => format_strike(&strike),
            None => format!("❌ No strike `#{id}` in this server."),
        };
        ctx.say(message).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
