#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingestion page sizes, outcomes, and load reports.

use serde::{Deserialize, Serialize};

/// Page size used to bound the CSV ingestion loop.
pub const CSV_PAGE_SIZE: u64 = 25_000;

/// Page size used to bound the structured ingestion loop.
pub const FEATURE_PAGE_SIZE: u64 = 1_000;

/// Page sizes the two ingestion loops divide the cached total by.
///
/// These only bound the number of iterations. Each request still asks the
/// upstream for the caller's `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSizes {
    pub csv: u64,
    pub features: u64,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            csv: CSV_PAGE_SIZE,
            features: FEATURE_PAGE_SIZE,
        }
    }
}

/// Number of pages needed to cover `total` records at `page_size` each.
///
/// A zero page size yields zero iterations.
#[must_use]
pub const fn iterations_for(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

/// How a load loop ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadOutcome {
    /// Every planned page was fetched and stored.
    Completed,
    /// A page came back empty and the loop stopped there.
    NothingToInsert,
}

/// Summary of a finished load loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    /// Number of iterations planned from the cached total.
    pub planned_pages: u64,
    /// Pages written to the sink.
    pub pages_inserted: u64,
    /// Documents written to the sink.
    pub records_inserted: u64,
    /// Offset the next page would have started at.
    pub final_offset: u64,
}
