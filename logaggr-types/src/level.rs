use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed severity level set (§3, §9). String-encoded on the wire and in
/// the search store; ordering is not semantically meaningful, so this
/// type intentionally does not derive `PartialOrd`/`Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Debug,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized log level: {0}")]
pub struct ParseLogLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INFO" => Ok(Self::Info),
            "DEBUG" => Ok(Self::Debug),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            other => Err(ParseLogLevelError(other.to_string())),
        }
    }
}
