//! Ranked seniority grades.
//!
//! Grades form a closed, totally ordered set. An identity without a grade
//! ranks below every defined grade, so it never meets a defined minimum.

use core::cmp::Ordering;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    Intern,
    Junior,
    Senior,
    TeamLead,
    Executive,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown grade '{0}'")]
pub struct UnknownGrade(pub String);

impl Grade {
    /// Every grade, lowest first.
    pub const ALL: [Grade; 5] = [
        Grade::Intern,
        Grade::Junior,
        Grade::Senior,
        Grade::TeamLead,
        Grade::Executive,
    ];

    /// Rank of a defined grade (1-based).
    pub fn rank(self) -> u8 {
        match self {
            Grade::Intern => 1,
            Grade::Junior => 2,
            Grade::Senior => 3,
            Grade::TeamLead => 4,
            Grade::Executive => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Intern => "INTERN",
            Grade::Junior => "JUNIOR",
            Grade::Senior => "SENIOR",
            Grade::TeamLead => "TEAM_LEAD",
            Grade::Executive => "EXECUTIVE",
        }
    }

    /// Grades that satisfy `min`, lowest first (for grade pickers).
    pub fn at_least(min: Grade) -> impl Iterator<Item = Grade> {
        Self::ALL.into_iter().filter(move |g| g.rank() >= min.rank())
    }
}

impl core::fmt::Display for Grade {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Grade {
    type Err = UnknownGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownGrade(s.to_string()))
    }
}

/// Rank of an optional grade; `None` ranks 0.
pub fn rank(grade: Option<Grade>) -> u8 {
    grade.map_or(0, Grade::rank)
}

/// `rank(grade) >= rank(min_required)`.
pub fn meets_minimum(grade: Option<Grade>, min_required: Grade) -> bool {
    rank(grade) >= min_required.rank()
}

/// Ordering by rank, for sorting grade option lists.
pub fn compare(a: Option<Grade>, b: Option<Grade>) -> Ordering {
    rank(a).cmp(&rank(b))
}

/// Sort grade options lowest first, unset grades leading.
pub fn sort_options(options: &mut [Option<Grade>]) {
    options.sort_by(|a, b| compare(*a, *b));
}
