//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::Context, core::strikes::STRIKE_TYPES};

/// Suggests strike types matching what the user typed so far.
///
/// Free-form types are still accepted; these are the ones moderation
/// commands record themselves.
pub async fn autocomplete_strike_type(_ctx: Context<'_>, partial: &str) -> Vec<String> {
    let partial = partial.to_lowercase();
    STRIKE_TYPES
        .iter()
        .filter(|kind| kind.contains(partial.as_str()))
        .map(|kind| (*kind).to_string())
        .collect()
}
