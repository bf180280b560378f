// SPDX-License-Identifier: Apache-2.0 OR MIT
// Severity levels, ordered from silent to most verbose

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::LogError;

/// Log severity levels (0-5, higher is more verbose)
///
/// A threshold of `T` admits a record at level `L` when `T >= L`. `None` as a
/// threshold admits nothing; it is never the level of an emitted record.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Nothing is output
    None = 0,
    /// Unrecoverable condition, the process exits after the record is written
    Fatal = 1,
    /// Error conditions
    Error = 2,
    /// Warning conditions
    Warn = 3,
    /// Informational messages
    Info = 4,
    /// Verbose diagnostics
    Debug = 5,
}

impl Level {
    /// Every level, least verbose first
    pub const ALL: [Level; 6] = [
        Level::None,
        Level::Fatal,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
    ];

    /// Levels a record can be emitted at, least verbose first
    pub const EMITTABLE: [Level; 5] = [
        Level::Fatal,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
    ];

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Canonical lowercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::None => "none",
            Level::Fatal => "fatal",
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }

    /// Create from u8 value (returns None if invalid)
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Level::None),
            1 => Some(Level::Fatal),
            2 => Some(Level::Error),
            3 => Some(Level::Warn),
            4 => Some(Level::Info),
            5 => Some(Level::Debug),
            _ => None,
        }
    }

    /// Whether a threshold of `self` lets a record at `level` through
    #[inline]
    pub fn admits(self, level: Level) -> bool {
        level != Level::None && self >= level
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Level::None),
            "fatal" => Ok(Level::Fatal),
            "error" => Ok(Level::Error),
            "warn" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            _ => Err(LogError::InvalidLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
