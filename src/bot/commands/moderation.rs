//! Channel moderation commands - `lock`, `unlock` and `slowmode`.
//!
//! Locking denies `SEND_MESSAGES` to the guild's default role (or `@everyone`
//! when none is configured) through a channel overwrite. Whatever else the
//! overwrite allowed or denied is kept, so unlocking restores it.

use crate::{
    core::duration::TimeLimit,
    errors::Result,
};
use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

/// Longest slowmode Discord accepts, in seconds.
pub const MAX_SLOWMODE: u64 = 6 * 60 * 60;

/// What unlocking does to the role's overwrite.
#[derive(Debug)]
pub(crate) enum Unlock {
    /// Sending was not denied in the first place
    NotLocked,
    /// Other permissions remain, write them back without the deny
    Restore(serenity::PermissionOverwrite),
    /// Nothing remains, drop the overwrite
    Remove,
}

/// Overwrite that locks the channel for `role`, or `None` when it already is.
pub(crate) fn locked_overwrite(
    existing: Option<&serenity::PermissionOverwrite>,
    role: serenity::RoleId,
) -> Option<serenity::PermissionOverwrite> {
    let send = serenity::Permissions::SEND_MESSAGES;
    let (allow, deny) = existing.map_or(
        (serenity::Permissions::empty(), serenity::Permissions::empty()),
        |overwrite| (overwrite.allow, overwrite.deny),
    );
    if deny.contains(send) {
        return None;
    }
    Some(serenity::PermissionOverwrite {
        allow: allow - send,
        deny: deny | send,
        kind: serenity::PermissionOverwriteType::Role(role),
    })
}

/// Undoes `locked_overwrite` on the role's current overwrite.
pub(crate) fn unlocked_overwrite(existing: Option<serenity::PermissionOverwrite>) -> Unlock {
    let send = serenity::Permissions::SEND_MESSAGES;
    let Some(mut overwrite) = existing.filter(|overwrite| overwrite.deny.contains(send)) else {
        return Unlock::NotLocked;
    };
    overwrite.deny -= send;
    if overwrite.allow.is_empty() && overwrite.deny.is_empty() {
        Unlock::Remove
    } else {
        Unlock::Restore(overwrite)
    }
}

/// Slowmode delay for a parsed duration; `None` when Discord would refuse it.
///
/// A cleared duration (`0`, `none`) turns slowmode off.
pub(crate) fn slowmode_delay(limit: Option<TimeLimit>) -> Option<u16> {
    match limit {
        None => Some(0),
        Some(TimeLimit::Unlimited) => None,
        Some(TimeLimit::Seconds(seconds)) if seconds <= MAX_SLOWMODE => {
            u16::try_from(seconds).ok()
        }
        Some(TimeLimit::Seconds(_)) => None,
    }
}

async fn role_overwrite(
    http: &serenity::Http,
    channel: serenity::ChannelId,
    role: serenity::RoleId,
) -> Result<Option<serenity::PermissionOverwrite>> {
    let overwrites = channel
        .to_channel(http)
        .await?
        .guild()
        .map(|channel| channel.permission_overwrites)
        .unwrap_or_default();
    Ok(overwrites.into_iter().find(|overwrite| {
        matches!(overwrite.kind, serenity::PermissionOverwriteType::Role(id) if id == role)
    }))
}

/// Removes the lock from `channel`. Returns whether it was locked.
pub(crate) async fn unlock_channel(
    http: &serenity::Http,
    channel: serenity::ChannelId,
    role: serenity::RoleId,
) -> Result<bool> {
    match unlocked_overwrite(role_overwrite(http, channel, role).await?) {
        Unlock::NotLocked => Ok(false),
        Unlock::Restore(overwrite) => {
            channel.create_permission(http, overwrite).await?;
            Ok(true)
        }
        Unlock::Remove => {
            channel
                .delete_permission(http, serenity::PermissionOverwriteType::Role(role))
                .await?;
            Ok(true)
        }
    }
}

fn schedule_unlock(
    http: std::sync::Arc<serenity::Http>,
    channel: serenity::ChannelId,
    role: serenity::RoleId,
    seconds: u64,
) {
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(seconds)).await;
        match unlock_channel(&http, channel, role).await {
            Ok(true) => debug!("Lock of <#{}> expired", channel.get()),
            Ok(false) => debug!("<#{}> was unlocked before its lock expired", channel.get()),
            Err(e) => warn!("Failed to lift expired lock of <#{}>: {}", channel.get(), e),
        }
    });
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{locked_overwrite, schedule_unlock, slowmode_delay, unlock_channel};
    use crate::{
        bot::{BotData, commands::member_hierarchy},
        core::{
            duration::{TimeLimit, parse_duration, stringify_duration},
            permissions::TimeKind,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    fn lock_role(ctx: poise::Context<'_, BotData, Error>, guild: u64) -> Result<serenity::RoleId> {
        let role = ctx.data().roles.get_default_role(guild)?.unwrap_or(guild);
        Ok(serenity::RoleId::new(role))
    }

    /// Stops the default role from sending messages in this channel.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MANAGE_MESSAGES",
        required_bot_permissions = "MANAGE_ROLES"
    )]
    pub async fn lock(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "How long to lock for, e.g. 30m (default: until unlocked)"]
        #[rest]
        duration: Option<String>,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        let requested = match duration.as_deref().map(parse_duration) {
            None => TimeLimit::Unlimited,
            Some(Ok(Some(limit))) => limit,
            Some(Ok(None)) => {
                ctx.say("❌ Give a positive duration, or leave it out to lock until unlocked.")
                    .await?;
                return Ok(());
            }
            Some(Err(Error::InvalidDuration { input })) => {
                ctx.say(format!(
                    "❌ `{input}` is not a valid duration. Try `30m`, `1h 15m` or `inf`."
                ))
                .await?;
                return Ok(());
            }
            Some(Err(e)) => return Err(e),
        };

        let Some(member) = ctx.author_member().await.map(|m| m.into_owned()) else {
            ctx.say("❌ Could not resolve your membership in this server.")
                .await?;
            return Ok(());
        };
        // The cache guard must be gone before the next await.
        let hierarchy = ctx
            .guild()
            .map(|guild| member_hierarchy(&guild, &member));
        let Some((roles, is_administrator)) = hierarchy else {
            ctx.say("❌ This server is not cached yet, try again shortly.")
                .await?;
            return Ok(());
        };

        let allowed = ctx
            .data()
            .permissions
            .get_member_time(TimeKind::Lock, guild_id.get(), &roles, is_administrator)
            .await?;
        match allowed {
            None => {
                ctx.say("❌ You are not allowed to lock channels.").await?;
                return Ok(());
            }
            Some(limit) if !limit.covers(requested) => {
                ctx.say(format!(
                    "❌ You may lock channels for at most {}.",
                    stringify_duration(limit)
                ))
                .await?;
                return Ok(());
            }
            Some(_) => {}
        }

        let role = lock_role(ctx, guild_id.get())?;
        let channel = ctx.channel_id();
        let existing = super::role_overwrite(ctx.http(), channel, role).await?;
        let Some(overwrite) = locked_overwrite(existing.as_ref(), role) else {
            ctx.say("🔒 This channel is already locked.").await?;
            return Ok(());
        };
        channel.create_permission(ctx.http(), overwrite).await?;

        match requested {
            TimeLimit::Seconds(seconds) => {
                schedule_unlock(ctx.serenity_context().http.clone(), channel, role, seconds);
                ctx.say(format!(
                    "🔒 Channel locked for {}.",
                    stringify_duration(requested)
                ))
                .await?;
            }
            TimeLimit::Unlimited => {
                ctx.say("🔒 Channel locked until unlocked.").await?;
            }
        }
        Ok(())
    }

    /// Lets the default role send messages in this channel again.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MANAGE_MESSAGES",
        required_bot_permissions = "MANAGE_ROLES"
    )]
    pub async fn unlock(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        let role = lock_role(ctx, guild_id.get())?;
        if unlock_channel(ctx.http(), ctx.channel_id(), role).await? {
            ctx.say("🔓 Channel unlocked.").await?;
        } else {
            ctx.say("❌ This channel is not locked.").await?;
        }
        Ok(())
    }

    /// Sets the slowmode delay of this channel.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MANAGE_CHANNELS",
        required_bot_permissions = "MANAGE_CHANNELS"
    )]
    pub async fn slowmode(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Delay such as 10s or 5m, 0 to disable"]
        #[rest]
        duration: String,
    ) -> Result<()> {
        let delay = match parse_duration(&duration) {
            Ok(limit) => slowmode_delay(limit),
            Err(Error::InvalidDuration { input }) => {
                ctx.say(format!("❌ `{input}` is not a valid duration.")).await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let Some(delay) = delay else {
            ctx.say("❌ Slowmode must be between 0 seconds and 6 hours.")
                .await?;
            return Ok(());
        };

        ctx.channel_id()
            .edit(
                ctx.http(),
                serenity::EditChannel::new().rate_limit_per_user(delay),
            )
            .await?;

        if delay == 0 {
            ctx.say("✅ Slowmode removed.").await?;
        } else {
            ctx.say(format!(
                "✅ Slowmode set to {}.",
                stringify_duration(TimeLimit::Seconds(u64::from(delay)))
            ))
            .await?;
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn role() -> serenity::RoleId {
        serenity::RoleId::new(42)
    }

    fn overwrite(
        allow: serenity::Permissions,
        deny: serenity::Permissions,
    ) -> serenity::PermissionOverwrite {
        serenity::PermissionOverwrite {
            allow,
            deny,
            kind: serenity::PermissionOverwriteType::Role(role()),
        }
    }

    #[test]
    fn test_lock_keeps_other_permissions() {
        let existing = overwrite(
            serenity::Permissions::SEND_MESSAGES | serenity::Permissions::ADD_REACTIONS,
            serenity::Permissions::ATTACH_FILES,
        );
        let locked = locked_overwrite(Some(&existing), role()).unwrap();

        assert_eq!(locked.allow, serenity::Permissions::ADD_REACTIONS);
        assert_eq!(
            locked.deny,
            serenity::Permissions::ATTACH_FILES | serenity::Permissions::SEND_MESSAGES
        );
        assert!(matches!(
            locked.kind,
            serenity::PermissionOverwriteType::Role(id) if id == role()
        ));
    }

    #[test]
    fn test_locking_twice_is_refused() {
        let locked = locked_overwrite(None, role()).unwrap();
        assert!(locked_overwrite(Some(&locked), role()).is_none());
    }

    #[test]
    fn test_unlock_restores_or_removes() {
        // A lock on a channel without an overwrite leaves nothing behind.
        let locked = locked_overwrite(None, role()).unwrap();
        assert!(matches!(unlocked_overwrite(Some(locked)), Unlock::Remove));

        let locked = overwrite(
            serenity::Permissions::ADD_REACTIONS,
            serenity::Permissions::SEND_MESSAGES,
        );
        let Unlock::Restore(restored) = unlocked_overwrite(Some(locked)) else {
            panic!("expected the overwrite to be restored");
        };
        assert_eq!(restored.allow, serenity::Permissions::ADD_REACTIONS);
        assert!(restored.deny.is_empty());

        assert!(matches!(unlocked_overwrite(None), Unlock::NotLocked));
        let open = overwrite(
            serenity::Permissions::empty(),
            serenity::Permissions::ATTACH_FILES,
        );
        assert!(matches!(unlocked_overwrite(Some(open)), Unlock::NotLocked));
    }

    #[test]
    fn test_slowmode_bounds() {
        assert_eq!(slowmode_delay(None), Some(0));
        assert_eq!(slowmode_delay(Some(TimeLimit::Seconds(30))), Some(30));
        assert_eq!(
            slowmode_delay(Some(TimeLimit::Seconds(MAX_SLOWMODE))),
            Some(21_600)
        );
        assert_eq!(slowmode_delay(Some(TimeLimit::Seconds(MAX_SLOWMODE + 1))), None);
        assert_eq!(slowmode_delay(Some(TimeLimit::Unlimited)), None);
    }
}
