//! Moderation time limit commands - `permissions bantime|mutetime|locktime|show|limits`.
//!
//! Limits are stored per role; a member's effective limit comes from the
//! highest role in the hierarchy that has one configured.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::member_hierarchy},
        core::{
            duration::{TimeLimit, parse_duration, stringify_duration},
            permissions::TimeKind,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    fn describe(limit: Option<TimeLimit>) -> String {
        limit.map_or_else(|| "not allowed".to_string(), stringify_duration)
    }

    async fn store_time(
        ctx: poise::Context<'_, BotData, Error>,
        kind: TimeKind,
        role: &serenity::Role,
        duration: &str,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        let limit = match parse_duration(duration) {
            Ok(limit) => limit,
            Err(Error::InvalidDuration { input }) => {
                ctx.say(format!(
                    "❌ `{input}` is not a valid duration. Try `1w2d`, `3h 30m` or `inf`."
                ))
                .await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        ctx.data()
            .permissions
            .set_time(kind, guild_id.get(), role.id.get(), limit)
            .await?;
        ctx.say(format!(
            "✅ Members with <@&{}> may now {} for: {}.",
            role.id.get(),
            kind.label(),
            describe(limit)
        ))
        .await?;
        Ok(())
    }

    /// Configures how long members of a role may ban, mute or lock for.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        subcommands(
            "permissions_bantime",
            "permissions_mutetime",
            "permissions_locktime",
            "permissions_show",
            "permissions_limits"
        )
    )]
    pub async fn permissions(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Permission management command. Available subcommands:\n\
            `/permissions bantime <role> <duration>` - Longest temporary ban\n\
            `/permissions mutetime <role> <duration>` - Longest temporary mute\n\
            `/permissions locktime <role> <duration>` - Longest channel lock\n\
            `/permissions show <role>` - Limits configured on a role\n\
            `/permissions limits [member]` - Effective limits of a member\n\
            Use `inf` for no limit and `none` to remove it.";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Sets the longest temporary ban members of a role may issue.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "bantime"
    )]
    pub async fn permissions_bantime(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role to configure"] role: serenity::Role,
        #[description = "Duration such as 1w2d, inf or none"]
        #[rest]
        duration: String,
    ) -> Result<()> {
        store_time(ctx, TimeKind::Ban, &role, &duration).await
    }

    /// Sets the longest temporary mute members of a role may issue.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "mutetime"
    )]
    pub async fn permissions_mutetime(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role to configure"] role: serenity::Role,
        #[description = "Duration such as 3h, inf or none"]
        #[rest]
        duration: String,
    ) -> Result<()> {
        store_time(ctx, TimeKind::Mute, &role, &duration).await
    }

    /// Sets the longest channel lock members of a role may issue.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "locktime"
    )]
    pub async fn permissions_locktime(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role to configure"] role: serenity::Role,
        #[description = "Duration such as 30m, inf or none"]
        #[rest]
        duration: String,
    ) -> Result<()> {
        store_time(ctx, TimeKind::Lock, &role, &duration).await
    }

    /// Shows the limits configured directly on a role.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "show"
    )]
    pub async fn permissions_show(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role to inspect"] role: serenity::Role,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        let limits = ctx
            .data()
            .permissions
            .get_role_permissions(guild_id.get(), role.id.get())
            .await?;
        let message = format!(
            "**Limits of <@&{}>**\n• Ban: {}\n• Mute: {}\n• Lock: {}",
            role.id.get(),
            describe(limits.ban),
            describe(limits.mute),
            describe(limits.lock)
        );

        ctx.say(message).await?;
        Ok(())
    }

    /// Shows the effective limits of a member, following the role hierarchy.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "limits"
    )]
    pub async fn permissions_limits(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member to inspect (defaults to you)"] member: Option<serenity::Member>,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };
        let member = match member {
            Some(member) => member,
            None => match ctx.author_member().await {
                Some(member) => member.into_owned(),
                None => {
                    ctx.say("❌ Could not resolve your membership in this server.")
                        .await?;
                    return Ok(());
                }
            },
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

        let permissions = &ctx.data().permissions;
        let mut lines = vec![format!("**Limits of <@{}>**", member.user.id.get())];
        for kind in TimeKind::ALL {
            let limit = permissions
                .get_member_time(kind, guild_id.get(), &roles, is_administrator)
                .await?;
            lines.push(format!("• {}: {}", kind.label(), describe(limit)));
        }

        ctx.say(lines.join("\n")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
