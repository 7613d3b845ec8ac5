#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Request shapes for the upstream complaints API.
//!
//! A [`PageQuery`] selects one bounded page (`offset`/`limit`) within an
//! optional [`DateRange`]. CSV requests additionally carry an
//! [`Attribution`] that the upstream records for auditing.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Payload format requested from the upstream API.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Structured `GeoJSON`-like envelope.
    Json,
    /// Comma-separated export with a header row.
    Csv,
}

/// Inclusive calendar-date bounds, as `YYYY-MM-DD` text.
///
/// An empty string means "no bound" and is passed through to the upstream
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    #[must_use]
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Returns `true` if neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }
}

/// One bounded page of upstream records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub range: DateRange,
    /// Number of records to skip.
    pub offset: u64,
    /// Maximum number of records to return. Zero lets the upstream pick.
    pub limit: u64,
}

impl PageQuery {
    #[must_use]
    pub const fn new(range: DateRange, offset: u64, limit: u64) -> Self {
        Self {
            range,
            offset,
            limit,
        }
    }

    /// The parameterless query used to prime the ingestion cache at startup.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Returns a copy of this query starting at `offset`.
    #[must_use]
    pub fn at_offset(&self, offset: u64) -> Self {
        Self {
            range: self.range.clone(),
            offset,
            limit: self.limit,
        }
    }
}

/// Reporter details the upstream CSV export asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub name: String,
    pub org: String,
    pub purpose: String,
    pub email: String,
}
