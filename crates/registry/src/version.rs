//! Version tags for the registry configmap/lock check.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionParseError {
    #[error("Invalid version tag: {0}")]
    InvalidFormat(String),
}

/// A semantic version tag of the form `v?X.Y.Z[-channel]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTag {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Optional release channel (e.g. "stable", "canary").
    pub channel: Option<String>,
}

impl VersionTag {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            channel: None,
        }
    }
}

impl FromStr for VersionTag {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let (number, channel) = match body.split_once('-') {
            Some((n, c)) if !c.is_empty() => (n, Some(c.to_string())),
            Some((n, _)) => (n, None),
            None => (body, None),
        };

        let mut parts = number.split('.');
        let (major, minor, patch) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), Some(c), None) => {
                let parse = |v: &str| {
                    v.parse::<u32>()
                        .map_err(|_| VersionParseError::InvalidFormat(s.to_string()))
                };
                (parse(a)?, parse(b)?, parse(c)?)
            }
            _ => return Err(VersionParseError::InvalidFormat(s.to_string())),
        };

        Ok(Self {
            major,
            minor,
            patch,
            channel,
        })
    }
}

impl std::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(channel) = &self.channel {
            write!(f, "-{}", channel)?;
        }
        Ok(())
    }
}
