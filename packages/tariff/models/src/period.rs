//! `YYYY-MM` billing period keys.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Earliest accepted year.
pub const MIN_YEAR: u16 = 2000;
/// Latest accepted year.
pub const MAX_YEAR: u16 = 2099;

/// A calendar month identifying one operating period.
///
/// Serialized as its `YYYY-MM` string form. Ordering is chronological.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey {
    year: u16,
    month: u8,
}

/// Error returned when a period key is malformed or out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodParseError {
    /// Not of the form `YYYY-MM` with digits only.
    #[error("invalid period '{0}': expected YYYY-MM")]
    Format(String),
    /// Year outside [`MIN_YEAR`]..=[`MAX_YEAR`].
    #[error("invalid period year {0}: expected 2000-2099")]
    Year(u16),
    /// Month outside 1..=12.
    #[error("invalid period month {0}: expected 01-12")]
    Month(u8),
}

impl PeriodKey {
    /// Creates a period key.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodParseError`] if the year or month is out of range.
    pub const fn new(year: u16, month: u8) -> Result<Self, PeriodParseError> {
        if year < MIN_YEAR || year > MAX_YEAR {
            return Err(PeriodParseError::Year(year));
        }
        if month < 1 || month > 12 {
            return Err(PeriodParseError::Month(month));
        }
        Ok(Self { year, month })
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> u16 {
        self.year
    }

    /// Calendar month (1-12).
    #[must_use]
    pub const fn month(self) -> u8 {
        self.month
    }

    /// The month before this one, wrapping into the previous year.
    ///
    /// Returns `None` before January of [`MIN_YEAR`].
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        if self.month > 1 {
            Some(Self {
                year: self.year,
                month: self.month - 1,
            })
        } else if self.year > MIN_YEAR {
            Some(Self {
                year: self.year - 1,
                month: 12,
            })
        } else {
            None
        }
    }

    /// The `count` period keys ending at (and including) this one, most
    /// recent first.
    ///
    /// Fewer keys are returned when the range would reach before
    /// [`MIN_YEAR`].
    #[must_use]
    pub fn trailing(self, count: usize) -> Vec<Self> {
        std::iter::successors(Some(self), |p| p.previous())
            .take(count)
            .collect()
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodKey {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);
        if !well_formed {
            return Err(PeriodParseError::Format(s.to_string()));
        }

        let year: u16 = s[..4]
            .parse()
            .map_err(|_| PeriodParseError::Format(s.to_string()))?;
        let month: u8 = s[5..]
            .parse()
            .map_err(|_| PeriodParseError::Format(s.to_string()))?;

        Self::new(year, month)
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = PeriodParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodKey> for String {
    fn from(value: PeriodKey) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats() {
        let p: PeriodKey = "2026-02".parse().unwrap();
        assert_eq!(p.year(), 2026);
        assert_eq!(p.month(), 2);
        assert_eq!(p.to_string(), "2026-02");
    }

    #[test]
    fn rejects_malformed_keys() {
        for bad in ["2026-2", "26-02", "2026/02", "2026-0a", "", "2026-020"] {
            assert!(
                matches!(bad.parse::<PeriodKey>(), Err(PeriodParseError::Format(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_keys() {
        assert_eq!("1999-12".parse::<PeriodKey>(), Err(PeriodParseError::Year(1999)));
        assert_eq!("2100-01".parse::<PeriodKey>(), Err(PeriodParseError::Year(2100)));
        assert_eq!("2026-00".parse::<PeriodKey>(), Err(PeriodParseError::Month(0)));
        assert_eq!("2026-13".parse::<PeriodKey>(), Err(PeriodParseError::Month(13)));
    }

    #[test]
    fn trailing_wraps_year_boundary() {
        let p = PeriodKey::new(2026, 3).unwrap();
        let keys: Vec<String> = p.trailing(6).iter().map(ToString::to_string).collect();
        assert_eq!(
            keys,
            ["2026-03", "2026-02", "2026-01", "2025-12", "2025-11", "2025-10"]
        );
    }

    #[test]
    fn trailing_stops_at_min_year() {
        let p = PeriodKey::new(2000, 2).unwrap();
        assert_eq!(p.trailing(6).len(), 2);
    }

    #[test]
    fn serde_uses_string_form() {
        let p = PeriodKey::new(2025, 11).unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"2025-11\"");
        assert!(serde_json::from_str::<PeriodKey>("\"2025-13\"").is_err());
    }
}
