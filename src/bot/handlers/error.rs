//! Turns framework errors into log records and a generic reply.
//!
//! The data layer never produces user-facing text, so command failures are
//! logged in full and the user only learns that something went wrong.

use crate::{bot::BotData, errors::Error};
use tracing::{error, warn};

/// Reply sent when a command fails.
pub const GENERIC_FAILURE: &str = "❌ Something went wrong while running this command.";

/// Framework-wide error hook.
pub async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().qualified_name, error);
            if let Err(e) = ctx.say(GENERIC_FAILURE).await {
                error!("Failed to send error message: {}", e);
            }
        }
        poise::FrameworkError::DynamicPrefix { error, msg, .. } => {
            warn!("Could not resolve prefix for message {}: {:?}", msg.id, error);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}
