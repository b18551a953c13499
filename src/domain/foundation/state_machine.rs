//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating state changes of
//! lifecycle statuses.

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions; terminal detection
/// follows from them.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for LicenseState {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (New, Pending) | (Pending, Active) /* ... */)
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             New => vec![Pending, Canceled],
///             // ... etc
///         }
///     }
/// }
///
/// assert!(LicenseState::New.can_transition_to(&LicenseState::Pending));
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
