#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP request and response bodies for the fondue server.
//!
//! Query parameters arrive as raw strings so that the handlers can report
//! exactly which one was malformed instead of a generic extractor error.

use serde::{Deserialize, Serialize};

/// Status reported when every planned page was stored.
pub const STATUS_SAVED: &str = "Data successfully saved to MongoDB";

/// Status reported when a page came back empty.
pub const STATUS_NOTHING_TO_INSERT: &str = "No data to insert into MongoDB";

/// Query parameters shared by every data route.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    /// Records to skip; must be a non-negative integer.
    pub offset: Option<String>,
    /// Records per page; must be a non-negative integer.
    pub limit: Option<String>,
    /// First day to include (`YYYY-MM-DD`), empty for no bound.
    pub start: Option<String>,
    /// Last day to include (`YYYY-MM-DD`), empty for no bound.
    pub end: Option<String>,
}

/// Query parameters for the CSV routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvPageParams {
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    /// Reporter name forwarded to the upstream export.
    pub name: Option<String>,
    pub org: Option<String>,
    pub purpose: Option<String>,
    pub email: Option<String>,
}

impl CsvPageParams {
    /// Returns the paging subset of these parameters.
    #[must_use]
    pub fn page(&self) -> PageParams {
        PageParams {
            offset: self.offset.clone(),
            limit: self.limit.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }
}

/// Success body for the ingestion routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatus {
    pub status: String,
}

/// Failure body for every route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Short description of what failed.
    pub error: String,
    /// Underlying error text, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Pages stored before a multi-page load failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_completed: Option<u64>,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            pages_completed: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub const fn with_pages_completed(mut self, pages: u64) -> Self {
        self.pages_completed = Some(pages);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}
