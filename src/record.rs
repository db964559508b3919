//! Compatibility records derived from sheet rows.

use serde::{Serialize, Serializer};
use std::fmt;

/// Multiplayer compatibility rating of a mod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusCode {
    /// Not tested yet (raw `"untested"` or `"0"`).
    Untested,
    /// 1 - does not work
    DoesNotWork,
    /// 2 - major issues
    MajorIssues,
    /// 3 - minor issues
    MinorIssues,
    /// 4 - works perfectly
    WorksPerfectly,
}

impl StatusCode {
    /// Every status, untested first.
    pub const ALL: [StatusCode; 5] = [
        Self::Untested,
        Self::DoesNotWork,
        Self::MajorIssues,
        Self::MinorIssues,
        Self::WorksPerfectly,
    ];

    /// Interprets a raw status cell.
    ///
    /// This is the only place raw statuses are read, so lookups and summary
    /// counts always agree. `"0"` is a synonym for untested, and anything
    /// that is not a known rating is treated as untested too.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "1" => Self::DoesNotWork,
            "2" => Self::MajorIssues,
            "3" => Self::MinorIssues,
            "4" => Self::WorksPerfectly,
            _ => Self::Untested,
        }
    }

    /// Canonical code: `"untested"` or `"1"`..`"4"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untested => "untested",
            Self::DoesNotWork => "1",
            Self::MajorIssues => "2",
            Self::MinorIssues => "3",
            Self::WorksPerfectly => "4",
        }
    }

    /// Display label for the status.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Untested => "Untested",
            Self::DoesNotWork => "Does not work",
            Self::MajorIssues => "Major issues",
            Self::MinorIssues => "Minor issues",
            Self::WorksPerfectly => "Works perfectly",
        }
    }

    /// Short label for compact badges.
    pub fn short_label(&self) -> &'static str {
        match self {
            Self::Untested => "?",
            Self::DoesNotWork => "1",
            Self::MajorIssues => "2",
            Self::MinorIssues => "3",
            Self::WorksPerfectly => "4",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Untested => 0,
            Self::DoesNotWork => 1,
            Self::MajorIssues => 2,
            Self::MinorIssues => 3,
            Self::WorksPerfectly => 4,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Compatibility information for one mod in one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModCompatibilityRecord {
    pub status: StatusCode,
    pub notes: String,
}

impl ModCompatibilityRecord {
    pub fn new(status: StatusCode, notes: impl Into<String>) -> Self {
        Self {
            status,
            notes: notes.into(),
        }
    }
}

/// Per-status counts over a set of mods.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompatibilitySummary {
    counts: [usize; 5],
}

impl CompatibilitySummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, status: StatusCode) {
        self.counts[status.index()] += 1;
    }

    pub fn count(&self, status: StatusCode) -> usize {
        self.counts[status.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Counts paired with their status, untested first.
    pub fn iter(&self) -> impl Iterator<Item = (StatusCode, usize)> + '_ {
        StatusCode::ALL.iter().map(|s| (*s, self.count(*s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_untested() {
        assert_eq!(StatusCode::from_raw("0"), StatusCode::Untested);
        assert_eq!(StatusCode::from_raw("untested"), StatusCode::Untested);
        assert_eq!(
            StatusCode::from_raw("0").as_str(),
            StatusCode::from_raw("untested").as_str()
        );
    }

    #[test]
    fn test_known_ratings() {
        assert_eq!(StatusCode::from_raw("1"), StatusCode::DoesNotWork);
        assert_eq!(StatusCode::from_raw(" 3 "), StatusCode::MinorIssues);
        assert_eq!(StatusCode::from_raw("4").label(), "Works perfectly");
        assert_eq!(StatusCode::from_raw("7"), StatusCode::Untested);
        assert_eq!(StatusCode::from_raw(""), StatusCode::Untested);
    }

    #[test]
    fn test_record_serializes_status_code() {
        let record = ModCompatibilityRecord::new(StatusCode::MinorIssues, "minor bug");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"status":"3","notes":"minor bug"}"#);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = CompatibilitySummary::new();
        for raw in ["0", "untested", "4", "4", "2"] {
            summary.record(StatusCode::from_raw(raw));
        }

        assert_eq!(summary.count(StatusCode::Untested), 2);
        assert_eq!(summary.count(StatusCode::WorksPerfectly), 2);
        assert_eq!(summary.count(StatusCode::MajorIssues), 1);
        assert_eq!(summary.count(StatusCode::DoesNotWork), 0);
        assert_eq!(summary.total(), 5);
        assert_eq!(summary.iter().count(), 5);
    }
}
