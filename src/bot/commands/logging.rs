//! Log channel commands - `logging set|show`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::mention_or_unset},
        core::log_channels::LogChannelType,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Log channel choices offered to users.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum LogKind {
        #[name = "server"]
        Server,
        #[name = "mod"]
        Mod,
        #[name = "message"]
        Message,
        #[name = "member"]
        Member,
        #[name = "join"]
        Join,
        #[name = "voice"]
        Voice,
    }

    impl From<LogKind> for LogChannelType {
        fn from(kind: LogKind) -> Self {
            match kind {
                LogKind::Server => Self::Server,
                LogKind::Mod => Self::Mod,
                LogKind::Message => Self::Message,
                LogKind::Member => Self::Member,
                LogKind::Join => Self::Join,
                LogKind::Voice => Self::Voice,
            }
        }
    }

    fn channel_mention(id: u64) -> String {
        format!("<#{id}>")
    }

    /// Routes guild events to log channels.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        subcommands("logging_set", "logging_show")
    )]
    pub async fn logging(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Log channel command. Available subcommands:\n\
            `/logging set <type> [channel]` - Send events of a type to a channel (omit to disable)\n\
            `/logging show` - Show every log channel";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Sends events of one type to a channel; omit the channel to disable them.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "set"
    )]
    pub async fn logging_set(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Kind of events"] kind: LogKind,
        #[description = "Channel receiving them"] channel: Option<serenity::GuildChannel>,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        let kind = LogChannelType::from(kind);
        let channel = channel.map(|channel| channel.id.get());
        ctx.data()
            .log_channels
            .set_log_channel(kind, guild_id.get(), channel)
            .await?;

        let message = match channel {
            Some(channel) => format!(
                "✅ {} events will be logged in {}.",
                kind.label(),
                channel_mention(channel)
            ),
            None => format!("✅ {} logging disabled.", kind.label()),
        };
        ctx.say(message).await?;
        Ok(())
    }

    /// Shows every log channel of this server.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "show"
    )]
    pub async fn logging_show(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        let channels = ctx.data().log_channels.get_log_channels(guild_id.get())?;
        let mut lines = vec!["**Log channels**".to_string()];
        lines.extend(channels.into_iter().map(|(kind, channel)| {
            format!(
                "• {}: {}",
                kind.label(),
                mention_or_unset(channel, channel_mention)
            )
        }));

        ctx.say(lines.join("\n")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
