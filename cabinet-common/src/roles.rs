//! Viewer roles
//!
//! Every authenticated session belongs to one cabinet. The role decides how
//! role-sensitive notifications are labelled (a collaboration offer reads
//! "Producer" to an artist and "Artist" to a producer).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cabinet the current viewer is signed into
///
/// Parsing never fails: unrecognised names map to [`CabinetRole::Unknown`] so
/// callers fall back to generic labels instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CabinetRole {
    Artist,
    Dj,
    Producer,
    Radio,
    Venue,
    Admin,
    #[default]
    Unknown,
}

impl CabinetRole {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinetRole::Artist => "artist",
            CabinetRole::Dj => "dj",
            CabinetRole::Producer => "producer",
            CabinetRole::Radio => "radio",
            CabinetRole::Venue => "venue",
            CabinetRole::Admin => "admin",
            CabinetRole::Unknown => "unknown",
        }
    }

    /// Parse a role name, case-insensitively
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "artist" => CabinetRole::Artist,
            "dj" => CabinetRole::Dj,
            "producer" => CabinetRole::Producer,
            "radio" | "radio_station" => CabinetRole::Radio,
            "venue" => CabinetRole::Venue,
            "admin" => CabinetRole::Admin,
            _ => CabinetRole::Unknown,
        }
    }
}

impl From<&str> for CabinetRole {
    fn from(name: &str) -> Self {
        CabinetRole::parse(name)
    }
}

impl From<String> for CabinetRole {
    fn from(name: String) -> Self {
        CabinetRole::parse(&name)
    }
}

impl From<CabinetRole> for String {
    fn from(role: CabinetRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for CabinetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
