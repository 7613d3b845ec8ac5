#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Client for the Traffy Fondue complaints API and the CSV converter.
//!
//! [`ComplaintSource`] is the seam the ingestion loop talks to; the
//! production implementation is [`client::TraffyClient`]. Delimited-text
//! pages are reshaped into [`Complaint`]s by [`convert`].

pub mod client;
pub mod convert;
pub mod http;
pub mod parsing;

use async_trait::async_trait;
use fondue_complaint_models::RecordBatch;
use fondue_source_models::{Attribution, PageQuery};

pub use convert::ConvertError;

/// Errors that can occur while fetching a page from the upstream API.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed or the body could not be read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("Upstream returned HTTP {status}")]
    Status {
        /// The status code received.
        status: reqwest::StatusCode,
    },

    /// The response body was not a valid record batch.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A source of complaint pages.
///
/// Each call issues exactly one upstream request. Implementations must not
/// retry; failures are returned to the caller as-is.
#[async_trait]
pub trait ComplaintSource: Send + Sync {
    /// Fetches one page in the structured format.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the body does not
    /// decode as a [`RecordBatch`].
    async fn fetch_features(&self, query: &PageQuery) -> Result<RecordBatch, SourceError>;

    /// Fetches one page in the delimited-text format and returns the raw
    /// body.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the body cannot be
    /// read.
    async fn fetch_csv(
        &self,
        query: &PageQuery,
        attribution: &Attribution,
    ) -> Result<String, SourceError>;
}
