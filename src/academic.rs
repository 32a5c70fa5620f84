//! Domain types for the academic calendar and the folder business key.
//!
//! An academic year is always written `YYYY-YYYY` with the second year one
//! greater than the first. A folder is keyed by (department, category, name)
//! with the name derived from the year and semester.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("academic year must have the form YYYY-YYYY, got '{0}'")]
    MalformedYear(String),
    #[error("academic year '{0}' must span two consecutive years")]
    NonConsecutiveYear(String),
    #[error("semester must be 'first' or 'second', got '{0}'")]
    UnknownSemester(String),
}

/// A validated `YYYY-YYYY` span, e.g. `2024-2025`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AcademicYear {
    start: u16,
}

impl AcademicYear {
    pub fn new(start: u16) -> Self {
        Self { start }
    }

    pub fn start(&self) -> u16 {
        self.start
    }
}

impl FromStr for AcademicYear {
    type Err = PeriodError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || PeriodError::MalformedYear(raw.to_string());

        let (first, second) = raw.split_once('-').ok_or_else(malformed)?;
        if first.len() != 4 || second.len() != 4 {
            return Err(malformed());
        }
        let first: u16 = first.parse().map_err(|_| malformed())?;
        let second: u16 = second.parse().map_err(|_| malformed())?;

        if second != first + 1 {
            return Err(PeriodError::NonConsecutiveYear(raw.to_string()));
        }

        Ok(Self { start: first })
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.start + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub fn as_str(&self) -> &'static str {
        match self {
            Semester::First => "first",
            Semester::Second => "second",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Semester::First => "First Semester",
            Semester::Second => "Second Semester",
        }
    }
}

impl FromStr for Semester {
    type Err = PeriodError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "first" | "1st" => Ok(Semester::First),
            "second" | "2nd" => Ok(Semester::Second),
            other => Err(PeriodError::UnknownSemester(other.to_string())),
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite business key for a folder. At most one non-deleted folder may
/// exist per key; the database enforces this with a unique index over the
/// same three columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderKey {
    pub department_id: Uuid,
    pub category: Option<String>,
    pub name: String,
}

impl FolderKey {
    pub fn new(
        department_id: Uuid,
        category: Option<&str>,
        academic_year: AcademicYear,
        semester: Semester,
    ) -> Self {
        Self {
            department_id,
            category: category.map(|c| c.to_string()),
            name: folder_name(academic_year, semester),
        }
    }

    /// Storage key prefix for files in this folder. Semester-only folders
    /// use a `general` segment in place of a category.
    pub fn storage_prefix(&self, academic_year: AcademicYear, semester: Semester) -> String {
        format!(
            "departments/{}/{}/{}/{}",
            self.department_id,
            self.category.as_deref().unwrap_or("general"),
            semester.as_str(),
            academic_year,
        )
    }
}

pub fn folder_name(academic_year: AcademicYear, semester: Semester) -> String {
    format!("{} - {}", academic_year, semester.display_name())
}
