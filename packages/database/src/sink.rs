//! `MongoDB`-backed [`DocumentSink`].

use async_trait::async_trait;
use fondue_complaint_models::{Complaint, Feature};
use mongodb::Collection;

use crate::{DocumentSink, SinkError};

/// Writes both record shapes into the same collection.
#[derive(Debug, Clone)]
pub struct MongoSink {
    features: Collection<Feature>,
    complaints: Collection<Complaint>,
}

impl MongoSink {
    #[must_use]
    pub fn new(features: Collection<Feature>) -> Self {
        let complaints = features.clone_with_type::<Complaint>();
        Self {
            features,
            complaints,
        }
    }

    /// Returns the name of the target collection.
    #[must_use]
    pub fn collection_name(&self) -> &str {
        self.features.name()
    }
}

#[async_trait]
impl DocumentSink for MongoSink {
    async fn insert_features(&self, features: &[Feature]) -> Result<u64, SinkError> {
        if features.is_empty() {
            return Err(SinkError::EmptyBatch);
        }

        let result = self.features.insert_many(features).await.inspect_err(|e| {
            log::error!("Failed to insert {} features: {e}", features.len());
        })?;

        let inserted = u64::try_from(result.inserted_ids.len()).unwrap_or(u64::MAX);
        log::debug!("Inserted {inserted} features into {}", self.features.name());
        Ok(inserted)
    }

    async fn insert_complaints(&self, complaints: &[Complaint]) -> Result<u64, SinkError> {
        if complaints.is_empty() {
            return Err(SinkError::EmptyBatch);
        }

        let result = self
            .complaints
            .insert_many(complaints)
            .await
            .inspect_err(|e| {
                log::error!("Failed to insert {} complaints: {e}", complaints.len());
            })?;

        let inserted = u64::try_from(result.inserted_ids.len()).unwrap_or(u64::MAX);
        log::debug!(
            "Inserted {inserted} complaints into {}",
            self.complaints.name()
        );
        Ok(inserted)
    }
}
