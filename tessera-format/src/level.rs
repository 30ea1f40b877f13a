//! Log severity levels.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Severity of a log event, ordered from least to most severe.
///
/// [`Level::Unknown`] sorts below every real level; as a threshold it lets
/// everything through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Level {
    /// Unrecognised or unset level.
    #[default]
    Unknown = 0,
    /// Diagnostic detail.
    Debug = 1,
    /// Routine operational messages.
    Info = 2,
    /// Something unexpected that the program recovered from.
    Warn = 3,
    /// A failed operation.
    Error = 4,
    /// A failure the program cannot continue after.
    Fatal = 5,
}

impl Level {
    /// Every real level, least severe first.
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Returns the upper-case name of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }

    /// Parses an upper- or lower-case level name; anything else is
    /// [`Level::Unknown`].
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text {
            "DEBUG" | "debug" => Self::Debug,
            "INFO" | "info" => Self::Info,
            "WARN" | "warn" => Self::Warn,
            "ERROR" | "error" => Self::Error,
            "FATAL" | "fatal" => Self::Fatal,
            _ => Self::Unknown,
        }
    }

    /// Numeric rank used for threshold comparisons.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_cases() {
        assert_eq!(Level::parse("WARN"), Level::Warn);
        assert_eq!(Level::parse("warn"), Level::Warn);
        assert_eq!(Level::parse("Warn"), Level::Unknown);
        assert_eq!("fatal".parse::<Level>(), Ok(Level::Fatal));
    }

    #[test]
    fn display_round_trips_real_levels() {
        for level in Level::ALL {
            assert_eq!(Level::parse(&level.to_string()), level);
        }
        assert_eq!(Level::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn ordering_follows_severity() {
        assert!(Level::Unknown < Level::Debug);
        assert!(Level::Debug < Level::Fatal);
        assert_eq!(Level::Error.rank(), 4);
    }
}
