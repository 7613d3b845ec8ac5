#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Document store sink for complaint records.
//!
//! Pages of [`Feature`]s or [`Complaint`]s are appended to a single
//! `MongoDB` collection, one batch write per page. There is no
//! deduplication: inserting the same page twice stores it twice unless the
//! collection has a unique index.

pub mod db;
pub mod sink;

use async_trait::async_trait;
use fondue_complaint_models::{Complaint, Feature};

/// Errors that can occur while connecting to the document store.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The server could not be reached or rejected the connection.
    #[error("Database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Errors that can occur while writing a batch.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The store rejected the batch write.
    #[error("Insert failed: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// The caller passed an empty batch.
    #[error("Refusing to insert an empty batch")]
    EmptyBatch,
}

/// Destination for ingested pages.
///
/// Each call is one batch write. If the store rejects the batch the whole
/// call fails; nothing is retried and no per-record recovery is attempted.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Appends structured features, returning the number inserted.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::EmptyBatch`] for an empty slice, or
    /// [`SinkError::Mongo`] if the store rejects the write.
    async fn insert_features(&self, features: &[Feature]) -> Result<u64, SinkError>;

    /// Appends CSV complaints, returning the number inserted.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::EmptyBatch`] for an empty slice, or
    /// [`SinkError::Mongo`] if the store rejects the write.
    async fn insert_complaints(&self, complaints: &[Complaint]) -> Result<u64, SinkError>;
}
