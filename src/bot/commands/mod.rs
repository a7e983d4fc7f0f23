//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Log channel configuration commands
pub mod logging;

/// Channel lock and slowmode commands
pub mod moderation;

/// Moderation time limit commands
pub mod permissions;

/// Custom prefix commands
pub mod prefix;

/// Role configuration commands
pub mod roles;

/// Strike management commands
pub mod strikes;

/// Developer-only commands
pub mod sudo;

// Export commands
pub use general::*;
pub use logging::*;
pub use moderation::*;
pub use permissions::*;
pub use prefix::*;
pub use roles::*;
pub use strikes::*;
pub use sudo::*;

use poise::serenity_prelude as serenity;

/// Renders an optional Discord ID with the given mention format, or "not set".
pub(crate) fn mention_or_unset(id: Option<u64>, format: fn(u64) -> String) -> String {
    id.map_or_else(|| "not set".to_string(), format)
}

/// Roles of `member` ordered from the top of the hierarchy down, ending
/// with `@everyone`, and whether the member is an administrator.
pub(crate) fn member_hierarchy(
    guild: &serenity::Guild,
    member: &serenity::Member,
) -> (Vec<u64>, bool) {
    let mut roles: Vec<&serenity::Role> = member
        .roles
        .iter()
        .filter_map(|id| guild.roles.get(id))
        .collect();
    roles.sort_by(|a, b| b.position.cmp(&a.position));

    let everyone = guild.roles.get(&serenity::RoleId::new(guild.id.get()));
    let is_administrator = guild.owner_id == member.user.id
        || roles
            .iter()
            .chain(everyone.iter())
            .any(|role| role.permissions.administrator());

    let mut ids: Vec<u64> = roles.iter().map(|role| role.id.get()).collect();
    ids.push(guild.id.get());
    (ids, is_administrator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_or_unset() {
        assert_eq!(mention_or_unset(Some(5), |id| format!("<@&{id}>")), "<@&5>");
        assert_eq!(mention_or_unset(None, |id| format!("<#{id}>")), "not set");
    }
}
