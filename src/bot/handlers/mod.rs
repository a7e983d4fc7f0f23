//! Discord interaction handlers
//!
//! This module provides handlers for framework errors, gateway events and autocomplete.

/// Autocomplete handlers for strike types
pub mod autocomplete;
/// Framework error handler
pub mod error;
/// Join, leave and message deletion logging
pub mod events;

pub use error::on_error;
pub use events::event_handler;
