//! Role configuration commands - `roles default|staff|muted|show`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::mention_or_unset},
        core::roles::RoleKind,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    fn role_mention(id: u64) -> String {
        format!("<@&{id}>")
    }

    async fn store_role(
        ctx: poise::Context<'_, BotData, Error>,
        kind: RoleKind,
        role: &serenity::Role,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        ctx.data()
            .roles
            .set_role(kind, guild_id.get(), role.id.get())
            .await?;
        ctx.say(format!(
            "✅ {} role set to {}.",
            kind.label(),
            role_mention(role.id.get())
        ))
        .await?;
        Ok(())
    }

    /// Configures the guild's default, staff and muted roles.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        subcommands("roles_default", "roles_staff", "roles_muted", "roles_show")
    )]
    pub async fn roles(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Role configuration command. Available subcommands:\n\
            `/roles default <role>` - Role given to new members\n\
            `/roles staff <role>` - Role identifying staff\n\
            `/roles muted <role>` - Role applied to muted members\n\
            `/roles show` - Show the configured roles";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Sets the role given to new members.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "default"
    )]
    pub async fn roles_default(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role given to every new member"] role: serenity::Role,
    ) -> Result<()> {
        store_role(ctx, RoleKind::Default, &role).await
    }

    /// Sets the role identifying staff members.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "staff"
    )]
    pub async fn roles_staff(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role held by the staff"] role: serenity::Role,
    ) -> Result<()> {
        store_role(ctx, RoleKind::Staff, &role).await
    }

    /// Sets the role applied to muted members.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "muted"
    )]
    pub async fn roles_muted(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role applied by the mute command"] role: serenity::Role,
    ) -> Result<()> {
        store_role(ctx, RoleKind::Muted, &role).await
    }

    /// Shows the configured roles.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        rename = "show"
    )]
    pub async fn roles_show(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            ctx.say("❌ This command can only be used in a server.").await?;
            return Ok(());
        };

        let roles = &ctx.data().roles;
        let mut lines = vec!["**Configured roles**".to_string()];
        for kind in RoleKind::ALL {
            let role = roles.get_role(kind, guild_id.get())?;
            lines.push(format!(
                "• {}: {}",
                kind.label(),
                mention_or_unset(role, role_mention)
            ));
        }

        ctx.say(lines.join("\n")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
