//! Countdown arithmetic.
//!
//! The bomb stores its remaining time as `m:ss` text. [`TimerText`] is the
//! parsed form, so a stored countdown is always well formed. The countdown
//! is fixed-tick: each tick removes exactly one second, regardless of how
//! much wall-clock time actually passed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_MINUTES: u32 = 99;
pub const MAX_SECONDS: u32 = 59;

/// Countdown a new bomb starts with.
pub const DEFAULT_TIMER_SECONDS: u32 = 5 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerParseError {
    #[error("timer must look like m:ss, got `{0}`")]
    Malformed(String),
    #[error("timer minutes must be between 0 and {MAX_MINUTES}, got {0}")]
    MinutesOutOfRange(u32),
    #[error("timer seconds must be between 0 and {MAX_SECONDS}, got {0}")]
    SecondsOutOfRange(u32),
}

/// Remaining countdown, rendered as `m:ss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimerText {
    total_seconds: u32,
}

impl TimerText {
    pub const ZERO: TimerText = TimerText { total_seconds: 0 };

    pub fn from_parts(minutes: u32, seconds: u32) -> Result<Self, TimerParseError> {
        if minutes > MAX_MINUTES {
            return Err(TimerParseError::MinutesOutOfRange(minutes));
        }
        if seconds > MAX_SECONDS {
            return Err(TimerParseError::SecondsOutOfRange(seconds));
        }
        Ok(Self {
            total_seconds: minutes * 60 + seconds,
        })
    }

    /// Saturates at `99:59`.
    pub fn from_seconds(total_seconds: u32) -> Self {
        Self {
            total_seconds: total_seconds.min(MAX_MINUTES * 60 + MAX_SECONDS),
        }
    }

    pub fn total_seconds(self) -> u32 {
        self.total_seconds
    }

    pub fn minutes(self) -> u32 {
        self.total_seconds / 60
    }

    pub fn seconds(self) -> u32 {
        self.total_seconds % 60
    }

    pub fn is_zero(self) -> bool {
        self.total_seconds == 0
    }
}

impl Default for TimerText {
    fn default() -> Self {
        Self {
            total_seconds: DEFAULT_TIMER_SECONDS,
        }
    }
}

impl fmt::Display for TimerText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.minutes(), self.seconds())
    }
}

impl FromStr for TimerText {
    type Err = TimerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TimerParseError::Malformed(s.to_string());
        let (minutes, seconds) = s.trim().split_once(':').ok_or_else(malformed)?;
        let minutes: u32 = minutes.trim().parse().map_err(|_| malformed())?;
        let seconds: u32 = seconds.trim().parse().map_err(|_| malformed())?;
        Self::from_parts(minutes, seconds)
    }
}

impl TryFrom<String> for TimerText {
    type Error = TimerParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimerText> for String {
    fn from(timer: TimerText) -> Self {
        timer.to_string()
    }
}

/// Result of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time remains on the clock.
    Running(TimerText),
    /// The clock reached (or already sat at) `0:00`.
    Expired,
}

pub fn countdown_tick(timer: TimerText) -> TickOutcome {
    match timer.total_seconds.saturating_sub(1) {
        0 => TickOutcome::Expired,
        left => TickOutcome::Running(TimerText {
            total_seconds: left,
        }),
    }
}
