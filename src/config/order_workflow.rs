//! Order workflow state names the licensing engine reacts to.

use serde::Deserialize;

use super::error::ValidationError;

/// Which order workflow states mean placed, fulfilled and canceled.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OrderWorkflowConfig {
    #[serde(default = "default_draft_state")]
    pub draft_state: String,

    #[serde(default = "default_placed_state")]
    pub placed_state: String,

    #[serde(default = "default_fulfilled_state")]
    pub fulfilled_state: String,

    #[serde(default = "default_canceled_state")]
    pub canceled_state: String,

    /// Activate-on-place only fires for orders leaving the draft state.
    /// When off, any transition into the placed state qualifies.
    #[serde(default = "default_true")]
    pub activate_on_place_requires_draft_origin: bool,
}

impl OrderWorkflowConfig {
    /// Validate that every state name is set and distinct.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let states = [
            ("draft_state", &self.draft_state),
            ("placed_state", &self.placed_state),
            ("fulfilled_state", &self.fulfilled_state),
            ("canceled_state", &self.canceled_state),
        ];

        for (i, (field, state)) in states.iter().enumerate() {
            if state.trim().is_empty() {
                return Err(ValidationError::MissingRequired(*field));
            }
            if states[..i].iter().any(|(_, earlier)| earlier == state) {
                return Err(ValidationError::DuplicateWorkflowState((*state).clone()));
            }
        }
        Ok(())
    }
}

impl Default for OrderWorkflowConfig {
    fn default() -> Self {
        Self {
            draft_state: default_draft_state(),
            placed_state: default_placed_state(),
            fulfilled_state: default_fulfilled_state(),
            canceled_state: default_canceled_state(),
            activate_on_place_requires_draft_origin: true,
        }
    }
}

fn default_draft_state() -> String {
    "draft".to_string()
}

fn default_placed_state() -> String {
    "placed".to_string()
}

fn default_fulfilled_state() -> String {
    "fulfilled".to_string()
}

fn default_canceled_state() -> String {
    "canceled".to_string()
}

fn default_true() -> bool {
    true
}
