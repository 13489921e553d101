use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How `PUT /api/foods/:id` decides that a body carries no update data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateEmptinessPolicy {
    /// A body is empty unless some field is truthy; `0` and `""` count as absent
    #[default]
    Falsy,
    /// A body is empty unless some field is present with a non-null value
    Presence,
}

impl fmt::Display for UpdateEmptinessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateEmptinessPolicy::Falsy => write!(f, "falsy"),
            UpdateEmptinessPolicy::Presence => write!(f, "presence"),
        }
    }
}

impl FromStr for UpdateEmptinessPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "falsy" => Ok(UpdateEmptinessPolicy::Falsy),
            "presence" => Ok(UpdateEmptinessPolicy::Presence),
            _ => Err(format!("Invalid update emptiness policy: {}", s)),
        }
    }
}

/// Broad classification of document-store failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreErrorKind {
    Validation,
    Connectivity,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreErrorKind::Validation => write!(f, "validation"),
            StoreErrorKind::Connectivity => write!(f, "connectivity"),
        }
    }
}
