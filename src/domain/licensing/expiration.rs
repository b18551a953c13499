//! Expiration policies.
//!
//! Expiry is computed on the owner's local calendar: "+1 month" from
//! 31 January lands on the last day of February in that zone.

use chrono::{DateTime, Days, FixedOffset, Months};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domain::foundation::Timestamp;

use super::LicenseError;

/// Policy reference that never expires.
pub const UNLIMITED: &str = "unlimited";

/// Identifier of a configured recurring period, copied from the offering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpirationPolicyRef(String);

impl ExpirationPolicyRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unlimited() -> Self {
        Self(UNLIMITED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpirationPolicyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of an expiry calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    At(Timestamp),
    Unlimited,
}

impl Expiry {
    /// Record representation: `None` means no expiry.
    pub fn into_option(self) -> Option<Timestamp> {
        match self {
            Expiry::At(ts) => Some(ts),
            Expiry::Unlimited => None,
        }
    }
}

/// Calendar unit of a recurring period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

/// A period such as "1 month" or "2 weeks".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringPeriod {
    pub unit: PeriodUnit,
    pub interval: u32,
}

impl RecurringPeriod {
    pub fn new(unit: PeriodUnit, interval: u32) -> Self {
        Self { unit, interval }
    }

    /// Adds this period to a zoned instant using calendar arithmetic.
    pub fn add_to(&self, start: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let n = self.interval;
        match self.unit {
            PeriodUnit::Day => start.checked_add_days(Days::new(u64::from(n))),
            PeriodUnit::Week => start.checked_add_days(Days::new(u64::from(n) * 7)),
            PeriodUnit::Month => start.checked_add_months(Months::new(n)),
            PeriodUnit::Year => n
                .checked_mul(12)
                .and_then(|months| start.checked_add_months(Months::new(months))),
        }
    }
}

/// Maps a start instant and a policy reference to an expiry.
pub trait ExpirationPolicy: Send + Sync {
    /// `start` must already be expressed in the owner's offset.
    fn calculate_expiry(
        &self,
        start: DateTime<FixedOffset>,
        policy: &ExpirationPolicyRef,
    ) -> Result<Expiry, LicenseError>;
}

/// Expiration policy backed by a table of named recurring periods.
#[derive(Debug, Clone, Default)]
pub struct RecurringPeriodPolicy {
    periods: HashMap<String, RecurringPeriod>,
}

impl RecurringPeriodPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_period(mut self, id: impl Into<String>, period: RecurringPeriod) -> Self {
        self.periods.insert(id.into(), period);
        self
    }
}

impl FromIterator<(String, RecurringPeriod)> for RecurringPeriodPolicy {
    fn from_iter<I: IntoIterator<Item = (String, RecurringPeriod)>>(iter: I) -> Self {
        Self {
            periods: iter.into_iter().collect(),
        }
    }
}

impl ExpirationPolicy for RecurringPeriodPolicy {
    fn calculate_expiry(
        &self,
        start: DateTime<FixedOffset>,
        policy: &ExpirationPolicyRef,
    ) -> Result<Expiry, LicenseError> {
        if policy.as_str() == UNLIMITED {
            return Ok(Expiry::Unlimited);
        }

        let period = self
            .periods
            .get(policy.as_str())
            .ok_or_else(|| LicenseError::not_found("expiration policy", policy))?;

        period
            .add_to(start)
            .map(|end| Expiry::At(Timestamp::from_zoned(&end)))
            .ok_or_else(|| {
                LicenseError::validation("expiration", format!("'{}' overflows the calendar", policy))
            })
    }
}
