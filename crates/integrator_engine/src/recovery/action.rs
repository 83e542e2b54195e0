//! The four legal recovery actions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Action applied at a drifted check boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryAction {
    /// Continue accumulating into the current window.
    Expand,
    /// Clear statistics and repeat at the current level.
    Reset,
    /// Roll back to the previous checkpoint level.
    Revert,
    /// Checkpoint and adapt regardless of drift.
    Accept,
}

/// Error returned when a string names no recovery action.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Unknown recovery action '{0}': expected expand, reset, revert or accept")]
pub struct ParseActionError(pub String);

impl RecoveryAction {
    /// All actions in prompt order.
    pub const ALL: [RecoveryAction; 4] = [
        RecoveryAction::Expand,
        RecoveryAction::Reset,
        RecoveryAction::Revert,
        RecoveryAction::Accept,
    ];

    /// Single-character prompt key.
    pub fn key(&self) -> char {
        match self {
            RecoveryAction::Expand => 'e',
            RecoveryAction::Reset => 'r',
            RecoveryAction::Revert => 'b',
            RecoveryAction::Accept => 'a',
        }
    }

    /// Looks up an action by prompt key, ignoring case.
    pub fn from_key(key: char) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        Self::ALL.into_iter().find(|a| a.key() == key)
    }

    /// Parses a prompt response: exactly one key character, surrounding
    /// whitespace ignored.
    pub fn from_response(response: &str) -> Option<Self> {
        let mut chars = response.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_key(c),
            _ => None,
        }
    }

    /// Lowercase action name.
    pub fn name(&self) -> &'static str {
        match self {
            RecoveryAction::Expand => "expand",
            RecoveryAction::Reset => "reset",
            RecoveryAction::Revert => "revert",
            RecoveryAction::Accept => "accept",
        }
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecoveryAction {
    type Err = ParseActionError;

    /// Accepts an action name or its prompt key, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.name() == lower)
            .or_else(|| Self::from_response(&lower))
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}
