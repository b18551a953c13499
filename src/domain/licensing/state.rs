//! License state machine.
//!
//! States and the named transitions that move between them:
//!
//! | From | Transition | To |
//! |------|------------|----|
//! | new | activate | pending |
//! | pending | confirm | active |
//! | active | suspend | suspended |
//! | suspended | revoke | canceled |
//! | any | cancel | canceled |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle state of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseState {
    /// Created, not yet activated.
    New,
    /// Activation requested, awaiting confirmation.
    Pending,
    /// Privilege granted to the owner.
    Active,
    /// Privilege temporarily withdrawn.
    Suspended,
    /// Permanently ended.
    Canceled,
    /// Withdrawn by an administrator.
    Revoked,
}

impl LicenseState {
    /// Returns the persisted identifier of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseState::New => "new",
            LicenseState::Pending => "pending",
            LicenseState::Active => "active",
            LicenseState::Suspended => "suspended",
            LicenseState::Canceled => "canceled",
            LicenseState::Revoked => "revoked",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LicenseState::Active)
    }
}

impl StateMachine for LicenseState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use LicenseState::*;
        match self {
            New => vec![Pending, Canceled],
            Pending => vec![Active, Canceled],
            Active => vec![Suspended, Canceled],
            Suspended => vec![Canceled],
            // Canceling twice is a no-op save.
            Canceled => vec![Canceled],
            Revoked => vec![Canceled],
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, LicenseState::Canceled | LicenseState::Revoked)
    }
}

impl fmt::Display for LicenseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LicenseState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(LicenseState::New),
            "pending" => Ok(LicenseState::Pending),
            "active" => Ok(LicenseState::Active),
            "suspended" => Ok(LicenseState::Suspended),
            "canceled" => Ok(LicenseState::Canceled),
            "revoked" => Ok(LicenseState::Revoked),
            other => Err(ValidationError::invalid_format(
                "state",
                format!("unknown license state '{}'", other),
            )),
        }
    }
}

/// Named transition applied to a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseTransition {
    Activate,
    Confirm,
    Suspend,
    Revoke,
    Cancel,
}

impl LicenseTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseTransition::Activate => "activate",
            LicenseTransition::Confirm => "confirm",
            LicenseTransition::Suspend => "suspend",
            LicenseTransition::Revoke => "revoke",
            LicenseTransition::Cancel => "cancel",
        }
    }

    /// Returns the state this transition leads to from `from`, or `None`
    /// when the transition is not defined there.
    pub fn target(&self, from: LicenseState) -> Option<LicenseState> {
        use LicenseState::*;
        let to = match (self, from) {
            (LicenseTransition::Activate, New) => Pending,
            (LicenseTransition::Confirm, Pending) => Active,
            (LicenseTransition::Suspend, Active) => Suspended,
            (LicenseTransition::Revoke, Suspended) => Canceled,
            (LicenseTransition::Cancel, _) => Canceled,
            _ => return None,
        };
        debug_assert!(from.can_transition_to(&to));
        Some(to)
    }
}

impl fmt::Display for LicenseTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LicenseTransition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activate" => Ok(LicenseTransition::Activate),
            "confirm" => Ok(LicenseTransition::Confirm),
            "suspend" => Ok(LicenseTransition::Suspend),
            "revoke" => Ok(LicenseTransition::Revoke),
            "cancel" => Ok(LicenseTransition::Cancel),
            other => Err(ValidationError::invalid_format(
                "transition",
                format!("unknown license transition '{}'", other),
            )),
        }
    }
}

/// Privilege side effect owed by a change of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    Grant,
    Revoke,
    None,
}

impl SideEffect {
    /// Compares the previous state with the next one.
    ///
    /// `previous` is `None` when the license is being constructed, which
    /// counts as a non-active predecessor.
    pub fn between(previous: Option<LicenseState>, next: LicenseState) -> Self {
        let was_active = previous.map_or(false, |s| s.is_active());
        match (was_active, next.is_active()) {
            (false, true) => SideEffect::Grant,
            (true, false) => SideEffect::Revoke,
            _ => SideEffect::None,
        }
    }
}
