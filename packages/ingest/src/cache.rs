//! The most recently fetched structured page.
//!
//! One [`IngestionCache`] exists per process, owned by whoever drives
//! ingestion (the server state or the CLI) and passed explicitly. Every
//! structured fetch replaces its contents wholesale; pages are never
//! merged. The ingestion loops read the cached `total` to decide how many
//! pages to fetch.
//!
//! The lock is only held to swap or clone the [`Arc`], never across an
//! upstream request, so readers always observe a complete page. Concurrent
//! writers are not ordered: the last one to finish wins.

use std::sync::{Arc, PoisonError, RwLock};

use fondue_complaint_models::RecordBatch;
use fondue_source::{ComplaintSource, SourceError};
use fondue_source_models::PageQuery;

#[derive(Debug, Default)]
pub struct IngestionCache {
    batch: RwLock<Arc<RecordBatch>>,
}

impl IngestionCache {
    #[must_use]
    pub fn new(batch: RecordBatch) -> Self {
        Self {
            batch: RwLock::new(Arc::new(batch)),
        }
    }

    /// Replaces the cached page.
    pub fn replace(&self, batch: RecordBatch) -> Arc<RecordBatch> {
        let batch = Arc::new(batch);
        let mut guard = self.batch.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&batch);
        batch
    }

    /// Returns the cached page.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RecordBatch> {
        let guard = self.batch.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Total matching records reported by the last fetch.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.snapshot().total
    }

    /// Fetches one structured page and stores it as the cached page.
    ///
    /// On failure the previous contents are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the fetch fails.
    pub async fn refresh(
        &self,
        source: &dyn ComplaintSource,
        query: &PageQuery,
    ) -> Result<Arc<RecordBatch>, SourceError> {
        let batch = source.fetch_features(query).await?;
        Ok(self.replace(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let cache = IngestionCache::default();
        assert_eq!(cache.total(), 0);
        assert!(cache.snapshot().is_empty());
    }

    #[test]
    fn replace_overwrites_wholesale() {
        let cache = IngestionCache::new(RecordBatch {
            total: 10,
            message: "first".to_string(),
            ..RecordBatch::default()
        });
        let before = cache.snapshot();

        cache.replace(RecordBatch {
            total: 20,
            ..RecordBatch::default()
        });

        assert_eq!(cache.total(), 20);
        assert_eq!(cache.snapshot().message, "");
        // Earlier snapshots are unaffected.
        assert_eq!(before.total, 10);
    }
}
