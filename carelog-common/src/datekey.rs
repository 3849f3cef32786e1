//! Day/month/year date keys
//!
//! Every dated table stores its date as three integer columns
//! (`giorno`, `mese_int`, `anno`) rather than a native date. `DateKey` is
//! the in-memory form of that triple: it parses the `YYYY-MM-DD` strings
//! the clients submit and reassembles them with zero padding, and its
//! ordering matches `ORDER BY anno, mese_int, giorno` so SQL-side and
//! in-memory sorts agree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A calendar date as the (day, month, year) triple the store keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateKey {
    pub giorno: i64,
    pub mese: i64,
    pub anno: i64,
}

impl DateKey {
    /// Parse a `YYYY-MM-DD` string into the stored triple.
    ///
    /// Splits on `-` and reverses the field order (year first in the
    /// string, day third in the triple). No calendar validity checking:
    /// the store never did any, and listings must reproduce whatever was
    /// written.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 {
            return Err(Error::MalformedDate(s.to_string()));
        }
        let anno = parts[0]
            .parse::<i64>()
            .map_err(|_| Error::MalformedDate(s.to_string()))?;
        let mese = parts[1]
            .parse::<i64>()
            .map_err(|_| Error::MalformedDate(s.to_string()))?;
        let giorno = parts[2]
            .parse::<i64>()
            .map_err(|_| Error::MalformedDate(s.to_string()))?;
        Ok(Self { giorno, mese, anno })
    }

    /// Reassemble the stored triple into `YYYY-MM-DD`.
    ///
    /// Month and day are zero-padded to two digits; without the padding a
    /// lexicographic sort of the strings would not match the column sort.
    pub fn format(&self) -> String {
        format!("{}-{:02}-{:02}", self.anno, self.mese, self.giorno)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

impl PartialOrd for DateKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.anno, self.mese, self.giorno).cmp(&(other.anno, other.mese, other.giorno))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_and_reverses() {
        let key = DateKey::parse("2024-03-07").unwrap();
        assert_eq!(key.anno, 2024);
        assert_eq!(key.mese, 3);
        assert_eq!(key.giorno, 7);
    }

    #[test]
    fn format_zero_pads() {
        let key = DateKey {
            giorno: 7,
            mese: 3,
            anno: 2024,
        };
        assert_eq!(key.format(), "2024-03-07");
    }

    #[test]
    fn round_trip() {
        for s in ["2024-01-10", "2023-12-31", "2024-06-05", "1999-11-01"] {
            assert_eq!(DateKey::parse(s).unwrap().format(), s);
        }
    }

    #[test]
    fn malformed_rejected() {
        assert!(DateKey::parse("2024-03").is_err());
        assert!(DateKey::parse("2024/03/07").is_err());
        assert!(DateKey::parse("2024-03-x7").is_err());
        assert!(DateKey::parse("").is_err());
    }

    #[test]
    fn ordering_matches_column_sort() {
        let mut keys = vec![
            DateKey::parse("2024-01-10").unwrap(),
            DateKey::parse("2024-03-01").unwrap(),
            DateKey::parse("2024-02-15").unwrap(),
        ];
        keys.sort_by(|a, b| b.cmp(a));
        let formatted: Vec<String> = keys.iter().map(|k| k.format()).collect();
        assert_eq!(formatted, ["2024-03-01", "2024-02-15", "2024-01-10"]);
    }
}
