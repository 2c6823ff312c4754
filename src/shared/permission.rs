/**
 * Permission Levels
 *
 * The ordered capability a principal holds over a note:
 * `None < Read < Write < Admin`. Ownership is reported as `Admin`.
 *
 * Collaborator rows store one of `read`, `write` or `admin`; `none` is
 * never persisted and only appears as the result of an access decision.
 */
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::error::SharedError;

/// Ordered permission a principal holds over a note
///
/// The derived `Ord` follows declaration order, so `level >= PermissionLevel::Write`
/// reads as "can edit".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ssr", derive(sqlx::Type))]
#[cfg_attr(feature = "ssr", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// No access at all
    None,
    /// May view the note and its collaborator list
    Read,
    /// May edit title and content
    Write,
    /// May manage collaborators and delete the note
    Admin,
}

impl PermissionLevel {
    /// Lowercase name as stored in the `collaborators.permission` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }

    /// Whether this level may be stored on a collaborator row
    pub fn is_grantable(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Parse a level supplied by a client for a collaborator grant
    ///
    /// Only `read`, `write` and `admin` are accepted.
    pub fn parse_grant(value: &str) -> Result<Self, SharedError> {
        let level: Self = value.parse()?;
        if !level.is_grantable() {
            return Err(SharedError::validation(
                "permission",
                "Invalid permission. Must be 'read', 'write', or 'admin'",
            ));
        }
        Ok(level)
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            _ => Err(SharedError::validation(
                "permission",
                "Invalid permission. Must be 'read', 'write', or 'admin'",
            )),
        }
    }
}
