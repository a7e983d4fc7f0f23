//! Duration parsing and formatting for permission time limits.
//!
//! Accepted inputs, checked in order:
//! * unlimited: `-1`, `inf`, `infinite`, `infinity`
//! * cleared: `0`, `none`, `null`
//! * `<amount><unit>` sequences such as `1w2d`, `3h 30m` or `90s`
//!
//! A bare number is read as seconds.

use crate::errors::{Error, Result};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// Maximum duration a moderation action may last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLimit {
    /// No upper bound
    Unlimited,
    /// Bounded to this many seconds
    Seconds(u64),
}

impl TimeLimit {
    /// Stored form: `-1` for unlimited, seconds otherwise.
    #[must_use]
    pub fn to_db(self) -> i64 {
        match self {
            Self::Unlimited => -1,
            Self::Seconds(seconds) => i64::try_from(seconds).unwrap_or(i64::MAX),
        }
    }

    /// Whether an action lasting `requested` stays within this limit.
    #[must_use]
    pub const fn covers(self, requested: Self) -> bool {
        match (self, requested) {
            (Self::Unlimited, _) => true,
            (Self::Seconds(_), Self::Unlimited) => false,
            (Self::Seconds(max), Self::Seconds(wanted)) => wanted <= max,
        }
    }

    /// Reads the stored form; `0` means no limit was configured.
    #[must_use]
    pub fn from_db(value: i64) -> Option<Self> {
        match value {
            0 => None,
            v if v < 0 => Some(Self::Unlimited),
            v => u64::try_from(v).ok().map(Self::Seconds),
        }
    }
}

/// Parses user input into a time limit; `Ok(None)` clears the limit.
pub fn parse_duration(input: &str) -> Result<Option<TimeLimit>> {
    let normalized = input.trim().to_lowercase();
    let invalid = || Error::InvalidDuration {
        input: input.to_string(),
    };

    match normalized.as_str() {
        "-1" | "inf" | "infinite" | "infinity" => return Ok(Some(TimeLimit::Unlimited)),
        "0" | "none" | "null" => return Ok(None),
        "" => return Err(invalid()),
        _ => {}
    }

    let mut total: u64 = 0;
    let mut chars = normalized.chars().peekable();
    while chars.peek().is_some() {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut digits = String::new();
        while let Some(c) = chars.next_if(char::is_ascii_digit) {
            digits.push(c);
        }
        if digits.is_empty() {
            return Err(invalid());
        }
        let amount: u64 = digits.parse().map_err(|_| invalid())?;

        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut unit = String::new();
        while let Some(c) = chars.next_if(char::is_ascii_alphabetic) {
            unit.push(c);
        }
        let multiplier = unit_seconds(&unit).ok_or_else(invalid)?;

        total = amount
            .checked_mul(multiplier)
            .and_then(|seconds| total.checked_add(seconds))
            .ok_or_else(invalid)?;

        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
    }

    Ok((total > 0).then_some(TimeLimit::Seconds(total)))
}

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(MINUTE),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(HOUR),
        "d" | "day" | "days" => Some(DAY),
        "w" | "week" | "weeks" => Some(WEEK),
        _ => None,
    }
}

/// Renders a limit for humans, e.g. `1 week 2 days and 3 hours`.
#[must_use]
pub fn stringify_duration(limit: TimeLimit) -> String {
    let TimeLimit::Seconds(mut remaining) = limit else {
        return "infinity".to_string();
    };

    let mut parts = Vec::new();
    for (size, name) in [
        (WEEK, "week"),
        (DAY, "day"),
        (HOUR, "hour"),
        (MINUTE, "minute"),
        (1, "second"),
    ] {
        let amount = remaining / size;
        remaining %= size;
        if amount > 0 {
            let plural = if amount == 1 { "" } else { "s" };
            parts.push(format!("{amount} {name}{plural}"));
        }
    }

    match parts.as_slice() {
        [] => "now".to_string(),
        [single] => single.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(" ")),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_special_inputs() {
        assert_eq!(parse_duration("inf").unwrap(), Some(TimeLimit::Unlimited));
        assert_eq!(parse_duration("-1").unwrap(), Some(TimeLimit::Unlimited));
        assert_eq!(parse_duration("Infinity").unwrap(), Some(TimeLimit::Unlimited));
        assert_eq!(parse_duration("none").unwrap(), None);
        assert_eq!(parse_duration("0").unwrap(), None);
    }

    #[test]
    fn test_unit_sequences() {
        assert_eq!(
            parse_duration("1w2d").unwrap(),
            Some(TimeLimit::Seconds(WEEK + 2 * DAY))
        );
        assert_eq!(
            parse_duration("3h 30m").unwrap(),
            Some(TimeLimit::Seconds(3 * HOUR + 30 * MINUTE))
        );
        assert_eq!(
            parse_duration("2 hours, 5 minutes").unwrap(),
            Some(TimeLimit::Seconds(2 * HOUR + 5 * MINUTE))
        );
        assert_eq!(parse_duration("90").unwrap(), Some(TimeLimit::Seconds(90)));
    }

    #[test]
    fn test_invalid_inputs() {
        for input in ["", "abc", "5 fortnights", "h5", "99999999999999999999w"] {
            assert!(
                matches!(parse_duration(input), Err(Error::InvalidDuration { .. })),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify_duration(TimeLimit::Unlimited), "infinity");
        assert_eq!(stringify_duration(TimeLimit::Seconds(0)), "now");
        assert_eq!(stringify_duration(TimeLimit::Seconds(HOUR)), "1 hour");
        assert_eq!(
            stringify_duration(TimeLimit::Seconds(WEEK + 2 * DAY + 3 * HOUR)),
            "1 week 2 days and 3 hours"
        );
    }

    #[test]
    fn test_limit_covers_shorter_actions() {
        assert!(TimeLimit::Unlimited.covers(TimeLimit::Unlimited));
        assert!(TimeLimit::Unlimited.covers(TimeLimit::Seconds(WEEK)));
        assert!(TimeLimit::Seconds(HOUR).covers(TimeLimit::Seconds(HOUR)));
        assert!(!TimeLimit::Seconds(HOUR).covers(TimeLimit::Seconds(HOUR + 1)));
        assert!(!TimeLimit::Seconds(HOUR).covers(TimeLimit::Unlimited));
    }

    #[test]
    fn test_db_form() {
        assert_eq!(TimeLimit::Unlimited.to_db(), -1);
        assert_eq!(TimeLimit::from_db(-1), Some(TimeLimit::Unlimited));
        assert_eq!(TimeLimit::from_db(0), None);
        assert_eq!(TimeLimit::from_db(60), Some(TimeLimit::Seconds(60)));
    }
}
