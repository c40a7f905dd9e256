//! Shared domain types for the Okul client

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Role of the signed-in user.
///
/// Drives which navigation stack downstream code selects. The session core
/// never evaluates permissions from it — it is a flat tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    Parent,
}

impl UserRole {
    /// Wire form of the role, as stored in secure storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
            UserRole::Parent => "parent",
        }
    }

    /// Category submitted as `user_type` to the push endpoint.
    ///
    /// Currently identical to the wire form; kept separate because the
    /// push endpoint's vocabulary is not ours to change.
    pub fn push_category(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "teacher" => Ok(UserRole::Teacher),
            "parent" => Ok(UserRole::Parent),
            other => Err(Error::UnknownRole {
                value: other.to_string(),
            }),
        }
    }
}
