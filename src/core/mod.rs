//! Guild configuration tables - framework-agnostic operations on per-guild settings.
//!
//! Every table here is built on the generic [`DbTable`](crate::database::DbTable).
//! Discord IDs enter and leave as `u64`; they are stored as signed 64-bit
//! integers, with `0` meaning "not configured".

/// Duration parsing and formatting for permission time limits
pub mod duration;
/// Log channel configuration per guild
pub mod log_channels;
/// Time limits of moderation actions per role
pub mod permissions;
/// Custom command prefixes per guild
pub mod prefixes;
/// Default, muted and staff roles per guild
pub mod roles;
/// Moderation strikes with per-guild serial IDs
pub mod strikes;

use crate::errors::{Error, Result};

/// Converts a Discord ID to its stored form.
pub fn to_db_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| Error::InvalidId { id })
}

/// Converts a stored ID back, mapping `0` and negative values to `None`.
#[must_use]
pub fn from_db_id(value: i64) -> Option<u64> {
    u64::try_from(value).ok().filter(|id| *id != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip_and_unset() {
        assert_eq!(to_db_id(42).ok(), Some(42));
        assert_eq!(from_db_id(42), Some(42));
        assert_eq!(from_db_id(0), None);
        assert_eq!(from_db_id(-5), None);
        assert!(matches!(to_db_id(u64::MAX), Err(Error::InvalidId { .. })));
    }
}
