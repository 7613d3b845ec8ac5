//! Query parameter validation.
//!
//! Checks run in a fixed order (start date, end date, offset, limit) and
//! stop at the first failure, before any upstream request is made.

use fondue_server_models::PageParams;
use fondue_source::parsing;
use fondue_source_models::{DateRange, PageQuery};

/// A rejected query parameter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid start_date format")]
    StartDate,

    #[error("Invalid end_date format")]
    EndDate,

    #[error("Invalid offset")]
    Offset { details: String },

    #[error("Invalid limit")]
    Limit { details: String },
}

impl ValidationError {
    /// Parser error text for numeric parameters.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Offset { details } | Self::Limit { details } => Some(details),
            Self::StartDate | Self::EndDate => None,
        }
    }
}

/// Validates raw paging parameters into a [`PageQuery`].
///
/// Missing dates mean "no bound". Missing or blank offset/limit are
/// rejected.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_page(params: &PageParams) -> Result<PageQuery, ValidationError> {
    let start = params.start.as_deref().unwrap_or_default();
    let end = params.end.as_deref().unwrap_or_default();

    if !parsing::is_valid_date_bound(start) {
        return Err(ValidationError::StartDate);
    }
    if !parsing::is_valid_date_bound(end) {
        return Err(ValidationError::EndDate);
    }

    let offset =
        parse_count(params.offset.as_deref()).map_err(|details| ValidationError::Offset { details })?;
    let limit =
        parse_count(params.limit.as_deref()).map_err(|details| ValidationError::Limit { details })?;

    Ok(PageQuery::new(DateRange::new(start, end), offset, limit))
}

/// Parses a non-negative integer, ignoring surrounding whitespace.
fn parse_count(raw: Option<&str>) -> Result<u64, String> {
    raw.unwrap_or_default()
        .trim()
        .parse::<u64>()
        .map_err(|e| e.to_string())
}
