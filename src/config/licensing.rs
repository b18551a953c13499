//! Licensing configuration: owner timezone fallback and recurring periods.

use chrono::FixedOffset;
use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::licensing::{RecurringPeriod, RecurringPeriodPolicy, UNLIMITED};

use super::error::ValidationError;

/// Licensing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LicensingConfig {
    /// Offset used for owners without a timezone, e.g. `+00:00`
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// Named recurring periods offerings can reference
    #[serde(default)]
    pub recurring_periods: HashMap<String, RecurringPeriod>,
}

impl LicensingConfig {
    /// Parsed `default_timezone`.
    pub fn default_offset(&self) -> Result<FixedOffset, ValidationError> {
        parse_offset(&self.default_timezone)
    }

    /// Builds the expiration policy from the configured periods.
    pub fn expiration_policy(&self) -> RecurringPeriodPolicy {
        self.recurring_periods
            .iter()
            .map(|(id, period)| (id.clone(), *period))
            .collect()
    }

    /// Validate licensing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.default_offset()?;
        for (id, period) in &self.recurring_periods {
            if id == UNLIMITED {
                return Err(ValidationError::ReservedPeriodId(id.clone()));
            }
            if period.interval == 0 {
                return Err(ValidationError::InvalidPeriodInterval(id.clone()));
            }
        }
        Ok(())
    }
}

impl Default for LicensingConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            recurring_periods: HashMap::new(),
        }
    }
}

fn default_timezone() -> String {
    "+00:00".to_string()
}

/// Parses `+HH:MM` / `-HH:MM` (or `Z`) into an offset.
pub fn parse_offset(value: &str) -> Result<FixedOffset, ValidationError> {
    let invalid = || ValidationError::InvalidOffset(value.to_string());
    let trimmed = value.trim();

    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = if let Some(rest) = trimmed.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
