use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Date-of-birth wire format.
pub const DOB_FORMAT: &str = "%Y-%m-%d";

static DOB_SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid dob shape regex"));

/// Validated identity fields extracted from a document image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct IdentityRecord {
    pub name: String,
    pub dob: String,
}

/// Unvalidated fields as recovered by the parser. Either field may be
/// missing; validation turns this into an [`IdentityRecord`] or rejects it
/// as a whole.
#[derive(Debug, Clone, Default)]
pub struct IdentityCandidate {
    pub name: Option<String>,
    pub dob: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("name is missing or empty")]
    MissingName,
    #[error("dob is missing")]
    MissingDob,
    #[error("dob '{0}' is not a valid YYYY-MM-DD calendar date")]
    InvalidDob(String),
}

/// Validate a candidate. Strict calendar policy: the dob must match the
/// `YYYY-MM-DD` shape AND denote a real date, so `1990-13-40` is rejected
/// even though it fits the pattern. Rejection is all-or-nothing; callers
/// never see a record with an invalid field.
pub fn validate(candidate: IdentityCandidate) -> Result<IdentityRecord, IdentityError> {
    let name = candidate
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(IdentityError::MissingName)?
        .to_string();

    let dob = candidate.dob.ok_or(IdentityError::MissingDob)?;
    if !DOB_SHAPE_RE.is_match(&dob) || NaiveDate::parse_from_str(&dob, DOB_FORMAT).is_err() {
        return Err(IdentityError::InvalidDob(dob));
    }

    Ok(IdentityRecord { name, dob })
}
