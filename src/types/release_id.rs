// ABOUTME: Release identifier derived from a timestamp plus a collision counter.
// ABOUTME: Format is MM_DD_HH_MM_<n>, matching the on-disk release directory names.

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseReleaseIdError {
    #[error("release id must have five underscore-separated fields, got {0}")]
    FieldCount(usize),

    #[error("release id field is not a number: {0}")]
    NotANumber(String),

    #[error("release id field out of range: {0}")]
    OutOfRange(String),
}

/// Identifier of one release directory under `{deploy_path}/releases/`.
///
/// Derived from the deploy start time (month, day, hour, minute) with a
/// trailing counter that disambiguates releases created within the same
/// minute. The counter is what the collision-retry loop increments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseId {
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    counter: u32,
}

impl ReleaseId {
    /// Build an id from a timestamp and a disambiguating counter.
    pub fn from_timestamp(at: DateTime<Utc>, counter: u32) -> Self {
        Self {
            month: at.month(),
            day: at.day(),
            hour: at.hour(),
            minute: at.minute(),
            counter,
        }
    }

    /// The same timestamp with the next counter value.
    pub fn next_candidate(&self) -> Self {
        Self {
            counter: self.counter + 1,
            ..*self
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Parse a release directory name back into an id.
    pub fn parse(s: &str) -> Result<Self, ParseReleaseIdError> {
        let fields: Vec<&str> = s.split('_').collect();
        if fields.len() != 5 {
            return Err(ParseReleaseIdError::FieldCount(fields.len()));
        }

        let num = |f: &str| {
            f.parse::<u32>()
                .map_err(|_| ParseReleaseIdError::NotANumber(f.to_string()))
        };

        let id = Self {
            month: num(fields[0])?,
            day: num(fields[1])?,
            hour: num(fields[2])?,
            minute: num(fields[3])?,
            counter: num(fields[4])?,
        };

        if !(1..=12).contains(&id.month)
            || !(1..=31).contains(&id.day)
            || id.hour > 23
            || id.minute > 59
        {
            return Err(ParseReleaseIdError::OutOfRange(s.to_string()));
        }

        Ok(id)
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}_{:02}_{:02}_{:02}_{}",
            self.month, self.day, self.hour, self.minute, self.counter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn formats_with_zero_padding() {
        let id = ReleaseId::from_timestamp(at(8, 7, 9, 5), 0);
        assert_eq!(id.to_string(), "08_07_09_05_0");
    }

    #[test]
    fn next_candidate_increments_only_the_counter() {
        let id = ReleaseId::from_timestamp(at(1, 2, 3, 4), 0);
        let next = id.next_candidate();
        assert_eq!(next.to_string(), "01_02_03_04_1");
        assert_eq!(next.counter(), 1);
    }

    #[test]
    fn parse_round_trips() {
        let id = ReleaseId::from_timestamp(at(12, 31, 23, 59), 17);
        assert_eq!(ReleaseId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            ReleaseId::parse("not-a-release"),
            Err(ParseReleaseIdError::FieldCount(_))
        ));
        assert!(matches!(
            ReleaseId::parse("aa_bb_cc_dd_ee"),
            Err(ParseReleaseIdError::NotANumber(_))
        ));
        assert!(matches!(
            ReleaseId::parse("13_01_00_00_0"),
            Err(ParseReleaseIdError::OutOfRange(_))
        ));
    }
}
