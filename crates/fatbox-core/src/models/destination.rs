use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::AppError;

/// Retention used for litterbox uploads when the caller does not pick one.
pub const DEFAULT_LITTERBOX_TIME: &str = "1h";

/// External file hosts a finished upload can be relayed to.
///
/// The set is closed and names must match exactly: anything else, including a
/// differently cased name, is rejected when the request is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Pomf,
    Catbox,
    Litterbox,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Pomf => "pomf",
            Destination::Catbox => "catbox",
            Destination::Litterbox => "litterbox",
        }
    }

    /// Whether the host accepts a `userhash` field (account-bound uploads).
    pub fn accepts_userhash(&self) -> bool {
        matches!(self, Destination::Catbox)
    }

    /// Whether the host accepts a `time` field (expiring uploads).
    pub fn accepts_time(&self) -> bool {
        matches!(self, Destination::Litterbox)
    }
}

impl FromStr for Destination {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pomf" => Ok(Destination::Pomf),
            "catbox" => Ok(Destination::Catbox),
            "litterbox" => Ok(Destination::Litterbox),
            _ => Err(AppError::InvalidInput(format!(
                "Unknown destination '{}'. Must be one of: pomf, catbox, litterbox",
                s
            ))),
        }
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
