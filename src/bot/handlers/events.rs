//! Gateway event listener that reports guild activity to the configured log channels.
//!
//! Joins and leaves go to the join log, deleted messages to the message log.
//! Guilds without the matching channel are skipped silently.

use crate::{
    bot::BotData,
    core::log_channels::LogChannelType,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{debug, trace};

/// Longest message excerpt copied into the message log.
pub const MAX_LOGGED_MESSAGE_LEN: usize = 800;

/// Framework event hook.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            let text = member_joined(new_member.user.id.get(), &new_member.user.name);
            send_log(ctx, data, LogChannelType::Join, new_member.guild_id, text).await
        }
        serenity::FullEvent::GuildMemberRemoval {
            guild_id,
            user,
            member_data_if_available,
        } => {
            let roles: Vec<u64> = member_data_if_available
                .as_ref()
                .map(|member| member.roles.iter().map(|role| role.get()).collect())
                .unwrap_or_default();
            let text = member_left(user.id.get(), &user.name, &roles);
            send_log(ctx, data, LogChannelType::Join, *guild_id, text).await
        }
        serenity::FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            guild_id: Some(guild_id),
        } => {
            // Only messages seen since startup are in the cache.
            let cached = ctx
                .cache
                .message(*channel_id, *deleted_message_id)
                .map(|message| {
                    (
                        message.author.id.get(),
                        message.author.bot,
                        message.content.clone(),
                    )
                });
            if cached.as_ref().is_some_and(|(_, bot, _)| *bot) {
                return Ok(());
            }
            let text = message_deleted(
                channel_id.get(),
                cached.map(|(author, _, content)| (author, content)),
            );
            send_log(ctx, data, LogChannelType::Message, *guild_id, text).await
        }
        _ => Ok(()),
    }
}

async fn send_log(
    ctx: &serenity::Context,
    data: &BotData,
    kind: LogChannelType,
    guild: serenity::GuildId,
    text: String,
) -> Result<()> {
    let Some(channel) = data.log_channels.get_log_channel(kind, guild.get())? else {
        trace!("No {} channel for {}, event dropped", kind.column(), guild.get());
        return Ok(());
    };
    debug!("Posting to {} of {}", kind.column(), guild.get());
    serenity::ChannelId::new(channel).say(ctx, text).await?;
    Ok(())
}

pub(crate) fn member_joined(user: u64, name: &str) -> String {
    format!("📥 **Member joined:** <@{user}> ({name})\nMember ID: {user}")
}

pub(crate) fn member_left(user: u64, name: &str, roles: &[u64]) -> String {
    let roles = if roles.is_empty() {
        "none".to_string()
    } else {
        roles
            .iter()
            .map(|role| format!("<@&{role}>"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("📤 **Member left:** <@{user}> ({name})\n**Roles:** {roles}\nMember ID: {user}")
}

pub(crate) fn message_deleted(channel: u64, message: Option<(u64, String)>) -> String {
    let Some((author, content)) = message else {
        return format!("🗑️ **Message deleted** in <#{channel}> (not cached, content unknown)");
    };
    let excerpt = if content.chars().count() > MAX_LOGGED_MESSAGE_LEN {
        let cut: String = content.chars().take(MAX_LOGGED_MESSAGE_LEN).collect();
        format!("{cut}…")
    } else {
        content
    };
    format!(
        "🗑️ **Message deleted** in <#{channel}>\n**Author:** <@{author}>\n**Content:** {excerpt}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_leave_messages() {
        assert_eq!(
            member_joined(7, "neo"),
            "📥 **Member joined:** <@7> (neo)\nMember ID: 7"
        );
        assert!(member_left(7, "neo", &[]).contains("**Roles:** none"));
        assert!(member_left(7, "neo", &[1, 2]).contains("**Roles:** <@&1>, <@&2>"));
    }

    #[test]
    fn test_deleted_message_excerpt_is_bounded() {
        let long = "a".repeat(MAX_LOGGED_MESSAGE_LEN + 50);
        let text = message_deleted(3, Some((9, long)));
        assert!(text.contains("<@9>"));
        assert!(text.ends_with('…'));
        assert!(text.len() < MAX_LOGGED_MESSAGE_LEN + 200);

        assert!(message_deleted(3, None).contains("content unknown"));
    }
}
