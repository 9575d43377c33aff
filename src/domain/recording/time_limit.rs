//! Time limit value object used to bound a front-end recording

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::error::TimeLimitParseError;

/// Upper bound accepted for a single recording (12 hours)
pub const MAX_TIME_LIMIT_SECS: u64 = 12 * 60 * 60;

/// A validated, non-zero recording time limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeLimit {
    secs: u64,
}

impl TimeLimit {
    /// Create a limit from whole seconds, rejecting zero and absurd values
    pub fn from_secs(secs: u64) -> Option<Self> {
        (secs > 0 && secs <= MAX_TIME_LIMIT_SECS).then_some(Self { secs })
    }

    pub const fn as_secs(&self) -> u64 {
        self.secs
    }

    pub const fn as_millis(&self) -> u64 {
        self.secs * 1000
    }

    pub const fn as_std(&self) -> Duration {
        Duration::from_secs(self.secs)
    }
}

impl FromStr for TimeLimit {
    type Err = TimeLimitParseError;

    /// Accepts "45s", "2m", "1h", "1m30s", "1h2m3s" (units in descending order, each at most once)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TimeLimitParseError { input: s.to_string() };
        let input = s.trim().to_ascii_lowercase();
        if input.is_empty() {
            return Err(err());
        }

        let mut total: u64 = 0;
        let mut digits = String::new();
        // Rank of the last unit seen: h=3, m=2, s=1
        let mut last_rank = u8::MAX;

        for ch in input.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }
            let (rank, factor) = match ch {
                'h' => (3, 3600),
                'm' => (2, 60),
                's' => (1, 1),
                _ => return Err(err()),
            };
            if digits.is_empty() || rank >= last_rank {
                return Err(err());
            }
            let value: u64 = digits.parse().map_err(|_| err())?;
            total = value
                .checked_mul(factor)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(err)?;
            digits.clear();
            last_rank = rank;
        }

        if !digits.is_empty() {
            return Err(err());
        }

        Self::from_secs(total).ok_or_else(err)
    }
}

impl fmt::Display for TimeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.secs / 3600;
        let minutes = (self.secs % 3600) / 60;
        let seconds = self.secs % 60;

        if hours > 0 {
            write!(f, "{}h", hours)?;
        }
        if minutes > 0 {
            write!(f, "{}m", minutes)?;
        }
        if seconds > 0 {
            write!(f, "{}s", seconds)?;
        }
        Ok(())
    }
}

/// Format elapsed milliseconds as `mm:ss` (or `h:mm:ss` past an hour)
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let total = elapsed_ms / 1000;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
