use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::models::{RosterRecord, ValidationError};

/// Header columns every roster must carry, in the order they are reported
pub const REQUIRED_COLUMNS: [&str; 4] = ["name", "email", "hour", "college"];

// Data rows are positional: name, email, college, hour.
const NAME_COL: usize = 0;
const EMAIL_COL: usize = 1;
const COLLEGE_COL: usize = 2;
const HOUR_COL: usize = 3;
const MIN_FIELDS: usize = 4;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Reasons a roster upload is rejected as a whole
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Header lacks one or more required columns
    #[error("CSV header must include: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Every row error of a single kind, in file order
    #[error("{}", ValidationReport(.0))]
    Validation(Vec<ValidationError>),
}

impl IngestError {
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Schema { .. } => "schema",
            IngestError::Validation(errors) => errors
                .first()
                .map(ValidationError::kind)
                .unwrap_or("validation"),
        }
    }
}

struct ValidationReport<'a>(&'a [ValidationError]);

impl fmt::Display for ValidationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.first() {
            Some(ValidationError::InvalidEmail { .. }) => write!(f, "Invalid email(s) found:")?,
            Some(ValidationError::DuplicatePair { .. }) => write!(
                f,
                "Duplicate (name, email) pairs found. Please remove these duplicates and try again:"
            )?,
            None => return write!(f, "Roster validation failed"),
        }
        for error in self.0 {
            match error {
                ValidationError::InvalidEmail { line, value } => {
                    write!(f, "\nLine {}: {}", line, value)?
                }
                ValidationError::DuplicatePair { line, name, email } => {
                    write!(f, "\nLine {}: ({}, {})", line, name, email)?
                }
            }
        }
        Ok(())
    }
}

/// Check an address against the simple `local@domain.tld` shape
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Columns from [`REQUIRED_COLUMNS`] absent from a header line
pub fn missing_columns(header_line: &str) -> Vec<String> {
    let header: Vec<String> = header_line
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .collect();

    REQUIRED_COLUMNS
        .iter()
        .filter(|col| !header.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect()
}

/// Parse and validate raw roster text
///
/// The first line is the header. Data rows are split on commas with no
/// quoting support and read by position. Blank rows, rows with fewer than
/// four fields, and rows missing a name, email or hour are skipped.
///
/// Every invalid email is collected before failing; only when there are
/// none are duplicate `(name, email)` pairs reported, again all at once.
/// Line numbers are 1-based file lines. A leading byte order mark is ignored.
pub fn ingest(raw: &str) -> Result<Vec<RosterRecord>, IngestError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = raw.split('\n');
    let header_line = lines.next().unwrap_or_default();

    let missing = missing_columns(header_line);
    if !missing.is_empty() {
        return Err(IngestError::Schema { missing });
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut records = Vec::new();
    let mut invalid_emails = Vec::new();
    let mut duplicates = Vec::new();

    for (index, line) in lines.enumerate() {
        // header is line 1
        let line_no = index + 2;
        if line.trim().is_empty() {
            continue;
        }

        let values: Vec<&str> = line.split(',').collect();
        if values.len() < MIN_FIELDS {
            debug!("Skipping line {}: expected {} fields, found {}", line_no, MIN_FIELDS, values.len());
            continue;
        }

        let name = values[NAME_COL].trim();
        let email = values[EMAIL_COL].trim();
        let college = values[COLLEGE_COL].trim();
        let hour = values[HOUR_COL].trim();

        if !is_valid_email(email) {
            invalid_emails.push(ValidationError::InvalidEmail {
                line: line_no,
                value: email.to_string(),
            });
            continue;
        }

        if name.is_empty() || hour.is_empty() {
            debug!("Skipping line {}: name or hour is empty", line_no);
            continue;
        }

        if !seen.insert((name.to_string(), email.to_string())) {
            duplicates.push(ValidationError::DuplicatePair {
                line: line_no,
                name: name.to_string(),
                email: email.to_string(),
            });
            continue;
        }

        records.push(RosterRecord {
            name: name.to_string(),
            email: email.to_string(),
            hour: hour.to_string(),
            college: college.to_string(),
        });
    }

    if !invalid_emails.is_empty() {
        return Err(IngestError::Validation(invalid_emails));
    }
    if !duplicates.is_empty() {
        return Err(IngestError::Validation(duplicates));
    }

    Ok(records)
}
