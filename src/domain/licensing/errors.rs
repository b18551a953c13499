//! License-specific error types.
//!
//! | Error | Meaning |
//! |-------|---------|
//! | InvalidTransition | transition not defined for the current state |
//! | NotFound / UnknownKind | missing record or unregistered license kind |
//! | InvalidStrategy | strategy rejected at registration |
//! | StrategyExecution | grant or revoke hook failed, transition not committed |
//! | Persistence | storage collaborator failure, passed through unchanged |
//! | LinesFailed | one or more order lines failed in a single notification |

use crate::domain::foundation::{DomainError, ErrorCode, LicenseId, OrderId, OrderLineId};

use super::LicenseState;

/// Licensing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseError {
    /// Transition is not defined for the current state.
    InvalidTransition {
        state: LicenseState,
        transition: String,
    },

    /// A referenced record does not exist.
    NotFound { entity: &'static str, id: String },

    /// No strategy is registered for the license kind.
    UnknownKind(String),

    /// Strategy failed registration checks.
    InvalidStrategy { id: String, reason: String },

    /// A strategy's grant or revoke hook failed.
    StrategyExecution {
        kind: String,
        operation: &'static str,
        reason: String,
    },

    /// Storage failure.
    Persistence(DomainError),

    /// Field or setting validation failed.
    Validation { field: String, message: String },

    /// Type-specific fields can only be edited before the first grant.
    FieldsLocked(LicenseId),

    /// Owner cannot be changed once this kind of license was granted.
    OwnerLocked(LicenseId),

    /// Some order lines could not be synchronized.
    LinesFailed {
        order: OrderId,
        failures: Vec<(OrderLineId, LicenseError)>,
    },
}

impl LicenseError {
    pub fn invalid_transition(state: LicenseState, transition: impl Into<String>) -> Self {
        LicenseError::InvalidTransition {
            state,
            transition: transition.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LicenseError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        LicenseError::UnknownKind(kind.into())
    }

    pub fn invalid_strategy(id: impl Into<String>, reason: impl Into<String>) -> Self {
        LicenseError::InvalidStrategy {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn strategy_execution(
        kind: impl Into<String>,
        operation: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        LicenseError::StrategyExecution {
            kind: kind.into(),
            operation,
            reason: reason.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LicenseError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Collapses per-line failures; a single failure is returned as is.
    pub fn lines_failed(order: OrderId, mut failures: Vec<(OrderLineId, LicenseError)>) -> Self {
        if failures.len() == 1 {
            if let Some((_, err)) = failures.pop() {
                return err;
            }
        }
        LicenseError::LinesFailed { order, failures }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            LicenseError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            LicenseError::NotFound { entity, .. } => match *entity {
                "order" => ErrorCode::OrderNotFound,
                "order line" => ErrorCode::OrderLineNotFound,
                "offering" => ErrorCode::OfferingNotFound,
                "user" => ErrorCode::UserNotFound,
                _ => ErrorCode::LicenseNotFound,
            },
            LicenseError::UnknownKind(_) => ErrorCode::LicenseTypeNotFound,
            LicenseError::InvalidStrategy { .. } => ErrorCode::InvalidLicenseType,
            LicenseError::StrategyExecution { .. } => ErrorCode::LicenseTypeExecutionFailed,
            LicenseError::Persistence(err) => err.code,
            LicenseError::Validation { .. } => ErrorCode::ValidationFailed,
            LicenseError::FieldsLocked(_) => ErrorCode::LicenseFieldsLocked,
            LicenseError::OwnerLocked(_) => ErrorCode::LicenseOwnerLocked,
            LicenseError::LinesFailed { .. } => ErrorCode::OrderSyncFailed,
        }
    }

    /// Returns a human-readable error message.
    pub fn message(&self) -> String {
        match self {
            LicenseError::InvalidTransition { state, transition } => {
                format!("Transition '{}' is not defined for state '{}'", transition, state)
            }
            LicenseError::NotFound { entity, id } => format!("{} not found: {}", entity, id),
            LicenseError::UnknownKind(kind) => format!("No license type registered for '{}'", kind),
            LicenseError::InvalidStrategy { id, reason } => {
                format!("Invalid license type '{}': {}", id, reason)
            }
            LicenseError::StrategyExecution {
                kind,
                operation,
                reason,
            } => format!("License type '{}' failed to {}: {}", kind, operation, reason),
            LicenseError::Persistence(err) => err.to_string(),
            LicenseError::Validation { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            LicenseError::FieldsLocked(id) => {
                format!("License {} fields can only be edited while new", id)
            }
            LicenseError::OwnerLocked(id) => {
                format!("License {} owner cannot change after it was granted", id)
            }
            LicenseError::LinesFailed { order, failures } => {
                let lines: Vec<String> = failures
                    .iter()
                    .map(|(line, err)| format!("{}: {}", line, err.message()))
                    .collect();
                format!(
                    "{} line(s) of order {} failed: {}",
                    failures.len(),
                    order,
                    lines.join("; ")
                )
            }
        }
    }

    /// True for configuration or data-integrity problems rather than
    /// transient failures.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            LicenseError::UnknownKind(_) | LicenseError::InvalidStrategy { .. }
        )
    }
}

impl std::fmt::Display for LicenseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for LicenseError {}

impl From<DomainError> for LicenseError {
    fn from(err: DomainError) -> Self {
        LicenseError::Persistence(err)
    }
}

impl From<LicenseError> for DomainError {
    fn from(err: LicenseError) -> Self {
        match err {
            LicenseError::Persistence(inner) => inner,
            other => DomainError::new(other.code(), other.message()),
        }
    }
}
