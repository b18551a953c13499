//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Creates a timestamp from any timezone-aware instant.
    pub fn from_zoned<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self(dt.with_timezone(&Utc))
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns this instant expressed in the given UTC offset.
    ///
    /// Calendar arithmetic ("+1 month") must be done on the zoned value,
    /// since month boundaries depend on the local date.
    pub fn in_offset(&self, offset: FixedOffset) -> DateTime<FixedOffset> {
        self.0.with_timezone(&offset)
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// Returns `None` when the value is outside the representable range.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn fixed(rfc3339: &str) -> Timestamp {
        Timestamp::from_zoned(&DateTime::parse_from_rfc3339(rfc3339).unwrap())
    }

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn from_zoned_normalizes_to_utc() {
        let ts = fixed("2024-03-10T09:00:00+02:00");
        assert_eq!(ts.as_datetime().hour(), 7);
    }

    #[test]
    fn in_offset_keeps_the_instant() {
        let ts = fixed("2024-03-10T23:30:00Z");
        let local = ts.in_offset(FixedOffset::east_opt(3600).unwrap());
        assert_eq!(local.hour(), 0);
        assert_eq!(Timestamp::from_zoned(&local), ts);
    }

    #[test]
    fn plus_secs_moves_forward() {
        let earlier = fixed("2024-01-01T00:00:00Z");
        let later = earlier.plus_secs(1);

        assert!(later > earlier);
        assert_eq!(later, fixed("2024-01-01T00:00:01Z"));
    }

    #[test]
    fn unix_seconds_construct_utc() {
        assert_eq!(Timestamp::from_unix_secs(1_704_067_200), Some(fixed("2024-01-01T00:00:00Z")));
    }

    #[test]
    fn timestamp_serializes_to_json() {
        let ts = fixed("2024-01-15T10:30:00Z");
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-15T10:30:00"));
    }
}
