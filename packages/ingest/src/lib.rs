#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Paginated ingestion of complaints into the document store.
//!
//! Two loops share the same shape: fetch a page, convert it if needed,
//! stop on an empty page, write it, advance the offset by the request's
//! `limit`. The number of iterations is fixed before the first fetch as
//! `ceil(cached total / page_size)` and is not revisited if the upstream
//! total changes mid-run.
//!
//! The structured loop refreshes the [`IngestionCache`] with every page.
//! The CSV loop never touches the cache and never derives its offset from
//! it; it only reads the cached total once to plan its iterations.
//!
//! Any failure aborts the loop. Pages written before the failure stay
//! written; rerun from a later offset to resume.

pub mod cache;

use fondue_database::{DocumentSink, SinkError};
use fondue_ingest_models::{LoadOutcome, LoadReport, iterations_for};
use fondue_source::convert::{self, ConvertError};
use fondue_source::{ComplaintSource, SourceError};
use fondue_source_models::{Attribution, PageQuery};

pub use cache::IngestionCache;

/// The step that failed within a load loop.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Fetching a page failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] SourceError),

    /// Converting a CSV page failed.
    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    /// Writing a page failed.
    #[error("Insert failed: {0}")]
    Insert(#[from] SinkError),
}

/// A load loop that stopped on an error.
#[derive(Debug, thiserror::Error)]
#[error("Stopped after {pages_completed} page(s): {error}")]
pub struct LoadFailure {
    /// Pages fully written before the failing one.
    pub pages_completed: u64,
    #[source]
    pub error: LoadError,
}

/// Running totals for one loop invocation.
struct Cursor {
    planned_pages: u64,
    offset: u64,
    pages_inserted: u64,
    records_inserted: u64,
}

impl Cursor {
    const fn new(planned_pages: u64, offset: u64) -> Self {
        Self {
            planned_pages,
            offset,
            pages_inserted: 0,
            records_inserted: 0,
        }
    }

    const fn advance(&mut self, inserted: u64, limit: u64) {
        self.pages_inserted += 1;
        self.records_inserted += inserted;
        self.offset = self.offset.saturating_add(limit);
    }

    fn fail(&self, error: impl Into<LoadError>) -> LoadFailure {
        LoadFailure {
            pages_completed: self.pages_inserted,
            error: error.into(),
        }
    }

    const fn report(&self, outcome: LoadOutcome) -> LoadReport {
        LoadReport {
            outcome,
            planned_pages: self.planned_pages,
            pages_inserted: self.pages_inserted,
            records_inserted: self.records_inserted,
            final_offset: self.offset,
        }
    }
}

/// Ingests structured pages starting at `request.offset`.
///
/// Plans `ceil(cache.total() / page_size)` iterations, then for each one
/// fetches `request.limit` records into the cache and writes the page's
/// features to `sink`.
///
/// # Errors
///
/// Returns [`LoadFailure`] on the first fetch or insert error.
pub async fn load_features(
    source: &dyn ComplaintSource,
    sink: &dyn DocumentSink,
    cache: &IngestionCache,
    request: &PageQuery,
    page_size: u64,
) -> Result<LoadReport, LoadFailure> {
    let total = cache.total();
    let mut cursor = Cursor::new(iterations_for(total, page_size), request.offset);

    log::info!(
        "[features] planning {} page(s) for {total} records (page size {page_size}, limit {})",
        cursor.planned_pages,
        request.limit
    );

    for page in 0..cursor.planned_pages {
        log::info!(
            "[features] page {}/{} offset={} limit={}",
            page + 1,
            cursor.planned_pages,
            cursor.offset,
            request.limit
        );

        let batch = cache
            .refresh(source, &request.at_offset(cursor.offset))
            .await
            .map_err(|e| cursor.fail(e))?;

        if batch.features.is_empty() {
            log::info!(
                "[features] empty page at offset {}, nothing to insert",
                cursor.offset
            );
            return Ok(cursor.report(LoadOutcome::NothingToInsert));
        }

        let inserted = sink
            .insert_features(&batch.features)
            .await
            .map_err(|e| cursor.fail(e))?;

        cursor.advance(inserted, request.limit);
    }

    log::info!(
        "[features] done: {} page(s), {} record(s) inserted",
        cursor.pages_inserted,
        cursor.records_inserted
    );

    Ok(cursor.report(LoadOutcome::Completed))
}

/// Ingests CSV pages starting at `request.offset`.
///
/// Plans `ceil(cache.total() / page_size)` iterations, then for each one
/// downloads `request.limit` rows, converts them to complaints, and writes
/// them to `sink`. The cache is read once and never updated.
///
/// # Errors
///
/// Returns [`LoadFailure`] on the first fetch, conversion, or insert error.
pub async fn load_complaints(
    source: &dyn ComplaintSource,
    sink: &dyn DocumentSink,
    cache: &IngestionCache,
    request: &PageQuery,
    attribution: &Attribution,
    page_size: u64,
) -> Result<LoadReport, LoadFailure> {
    let total = cache.total();
    let mut cursor = Cursor::new(iterations_for(total, page_size), request.offset);

    log::info!(
        "[csv] planning {} page(s) for {total} records (page size {page_size}, limit {})",
        cursor.planned_pages,
        request.limit
    );

    for page in 0..cursor.planned_pages {
        log::info!(
            "[csv] page {}/{} offset={} limit={}",
            page + 1,
            cursor.planned_pages,
            cursor.offset,
            request.limit
        );

        let content = source
            .fetch_csv(&request.at_offset(cursor.offset), attribution)
            .await
            .map_err(|e| cursor.fail(e))?;

        let complaints = convert::csv_to_complaints(&content).map_err(|e| cursor.fail(e))?;

        if complaints.is_empty() {
            log::info!(
                "[csv] empty page at offset {}, nothing to insert",
                cursor.offset
            );
            return Ok(cursor.report(LoadOutcome::NothingToInsert));
        }

        let inserted = sink
            .insert_complaints(&complaints)
            .await
            .map_err(|e| cursor.fail(e))?;

        cursor.advance(inserted, request.limit);
    }

    log::info!(
        "[csv] done: {} page(s), {} record(s) inserted",
        cursor.pages_inserted,
        cursor.records_inserted
    );

    Ok(cursor.report(LoadOutcome::Completed))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use fondue_complaint_models::{Complaint, Feature, RecordBatch};
    use fondue_source_models::DateRange;

    use super::*;

    enum Page {
        Features { count: usize, total: u64 },
        Csv(String),
        Fail,
    }

    #[derive(Default)]
    struct ScriptedSource {
        pages: Mutex<VecDeque<Page>>,
        queries: Mutex<Vec<PageQuery>>,
        attributions: Mutex<Vec<Attribution>>,
    }

    impl ScriptedSource {
        fn new(pages: impl IntoIterator<Item = Page>) -> Self {
            Self {
                pages: Mutex::new(pages.into_iter().collect()),
                ..Self::default()
            }
        }

        fn next_page(&self, query: &PageQuery) -> Page {
            self.queries.lock().unwrap().push(query.clone());
            self.pages.lock().unwrap().pop_front().expect("unexpected fetch")
        }

        fn offsets(&self) -> Vec<u64> {
            self.queries.lock().unwrap().iter().map(|q| q.offset).collect()
        }
    }

    fn fetch_error() -> SourceError {
        SourceError::Json(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
    }

    #[async_trait]
    impl ComplaintSource for ScriptedSource {
        async fn fetch_features(&self, query: &PageQuery) -> Result<RecordBatch, SourceError> {
            match self.next_page(query) {
                Page::Features { count, total } => Ok(RecordBatch {
                    total,
                    count: count as u64,
                    features: vec![Feature::default(); count],
                    ..RecordBatch::default()
                }),
                Page::Fail => Err(fetch_error()),
                Page::Csv(_) => panic!("CSV page scripted for a JSON fetch"),
            }
        }

        async fn fetch_csv(
            &self,
            query: &PageQuery,
            attribution: &Attribution,
        ) -> Result<String, SourceError> {
            self.attributions.lock().unwrap().push(attribution.clone());
            match self.next_page(query) {
                Page::Csv(content) => Ok(content),
                Page::Fail => Err(fetch_error()),
                Page::Features { .. } => panic!("JSON page scripted for a CSV fetch"),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<usize>>,
        fail_on_call: Option<usize>,
    }

    impl RecordingSink {
        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Self::default()
            }
        }

        fn record(&self, len: usize) -> Result<u64, SinkError> {
            let mut batches = self.batches.lock().unwrap();
            if self.fail_on_call == Some(batches.len() + 1) {
                return Err(SinkError::EmptyBatch);
            }
            batches.push(len);
            Ok(len as u64)
        }

        fn batches(&self) -> Vec<usize> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentSink for RecordingSink {
        async fn insert_features(&self, features: &[Feature]) -> Result<u64, SinkError> {
            self.record(features.len())
        }

        async fn insert_complaints(&self, complaints: &[Complaint]) -> Result<u64, SinkError> {
            self.record(complaints.len())
        }
    }

    fn cache_with_total(total: u64) -> IngestionCache {
        IngestionCache::new(RecordBatch {
            total,
            ..RecordBatch::default()
        })
    }

    fn csv_page(rows: usize) -> Page {
        let mut content = String::from("ticket_id,type,state\n");
        for i in 0..rows {
            content.push_str(&format!("T-{i},road,finish\n"));
        }
        Page::Csv(content)
    }

    fn request(offset: u64, limit: u64) -> PageQuery {
        PageQuery::new(DateRange::new("2024-01-01", "2024-12-31"), offset, limit)
    }

    #[tokio::test]
    async fn runs_ceil_total_over_page_size_iterations() {
        let source = ScriptedSource::new([
            Page::Features { count: 1000, total: 2500 },
            Page::Features { count: 1000, total: 2500 },
            Page::Features { count: 500, total: 2500 },
        ]);
        let sink = RecordingSink::default();
        let cache = cache_with_total(2500);

        let report = load_features(&source, &sink, &cache, &request(0, 1000), 1000)
            .await
            .unwrap();

        assert_eq!(report.outcome, LoadOutcome::Completed);
        assert_eq!(report.planned_pages, 3);
        assert_eq!(report.pages_inserted, 3);
        assert_eq!(report.records_inserted, 2500);
        assert_eq!(report.final_offset, 3000);
        assert_eq!(source.offsets(), vec![0, 1000, 2000]);
        assert_eq!(sink.batches(), vec![1000, 1000, 500]);
    }

    #[tokio::test]
    async fn every_fetch_requests_the_callers_limit() {
        let source = ScriptedSource::new([
            Page::Features { count: 10, total: 2000 },
            Page::Features { count: 10, total: 2000 },
        ]);
        let sink = RecordingSink::default();
        let cache = cache_with_total(2000);

        load_features(&source, &sink, &cache, &request(50, 10), 1000)
            .await
            .unwrap();

        let queries = source.queries.lock().unwrap().clone();
        assert!(queries.iter().all(|q| q.limit == 10));
        assert_eq!(source.offsets(), vec![50, 60]);
        assert_eq!(queries[0].range.start, "2024-01-01");
    }

    #[tokio::test]
    async fn empty_page_stops_without_inserting() {
        let source = ScriptedSource::new([
            Page::Features { count: 1000, total: 5000 },
            Page::Features { count: 0, total: 5000 },
        ]);
        let sink = RecordingSink::default();
        let cache = cache_with_total(5000);

        let report = load_features(&source, &sink, &cache, &request(0, 1000), 1000)
            .await
            .unwrap();

        assert_eq!(report.outcome, LoadOutcome::NothingToInsert);
        assert_eq!(report.pages_inserted, 1);
        assert_eq!(report.final_offset, 1000);
        assert_eq!(sink.batches(), vec![1000]);
        assert_eq!(source.offsets().len(), 2);
    }

    #[tokio::test]
    async fn planned_iterations_ignore_total_changes_mid_run() {
        let source = ScriptedSource::new([
            Page::Features { count: 1000, total: 90_000 },
            Page::Features { count: 1000, total: 90_000 },
        ]);
        let sink = RecordingSink::default();
        let cache = cache_with_total(2000);

        let report = load_features(&source, &sink, &cache, &request(0, 1000), 1000)
            .await
            .unwrap();

        assert_eq!(report.planned_pages, 2);
        assert_eq!(report.pages_inserted, 2);
        assert_eq!(cache.total(), 90_000);
    }

    #[tokio::test]
    async fn structured_loop_leaves_last_page_in_cache() {
        let source = ScriptedSource::new([
            Page::Features { count: 3, total: 2 },
            Page::Features { count: 1, total: 2 },
        ]);
        let sink = RecordingSink::default();
        let cache = cache_with_total(2);

        load_features(&source, &sink, &cache, &request(0, 1), 1)
            .await
            .unwrap();

        assert_eq!(cache.snapshot().features.len(), 1);
    }

    #[tokio::test]
    async fn zero_total_fetches_nothing() {
        let source = ScriptedSource::new([]);
        let sink = RecordingSink::default();
        let cache = IngestionCache::default();

        let report = load_features(&source, &sink, &cache, &request(0, 1000), 1000)
            .await
            .unwrap();

        assert_eq!(report.outcome, LoadOutcome::Completed);
        assert_eq!(report.planned_pages, 0);
        assert!(source.offsets().is_empty());
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_aborts_and_keeps_cache() {
        let source = ScriptedSource::new([
            Page::Features { count: 1000, total: 3000 },
            Page::Fail,
        ]);
        let sink = RecordingSink::default();
        let cache = cache_with_total(3000);

        let failure = load_features(&source, &sink, &cache, &request(0, 1000), 1000)
            .await
            .unwrap_err();

        assert_eq!(failure.pages_completed, 1);
        assert!(matches!(failure.error, LoadError::Fetch(_)));
        assert_eq!(sink.batches(), vec![1000]);
        assert_eq!(cache.snapshot().features.len(), 1000);
    }

    #[tokio::test]
    async fn insert_failure_reports_pages_completed() {
        let source = ScriptedSource::new([
            Page::Features { count: 1000, total: 3000 },
            Page::Features { count: 1000, total: 3000 },
        ]);
        let sink = RecordingSink::failing_on(2);
        let cache = cache_with_total(3000);

        let failure = load_features(&source, &sink, &cache, &request(0, 1000), 1000)
            .await
            .unwrap_err();

        assert_eq!(failure.pages_completed, 1);
        assert!(matches!(failure.error, LoadError::Insert(_)));
        assert_eq!(source.offsets().len(), 2);
    }

    #[tokio::test]
    async fn csv_loop_converts_and_inserts_each_page() {
        let source = ScriptedSource::new([csv_page(3), csv_page(2)]);
        let sink = RecordingSink::default();
        let cache = cache_with_total(50_000);
        let attribution = Attribution {
            name: "Somchai".to_string(),
            email: "s@example.com".to_string(),
            ..Attribution::default()
        };

        let report = load_complaints(
            &source,
            &sink,
            &cache,
            &request(100, 3),
            &attribution,
            25_000,
        )
        .await
        .unwrap();

        assert_eq!(report.outcome, LoadOutcome::Completed);
        assert_eq!(report.planned_pages, 2);
        assert_eq!(report.records_inserted, 5);
        assert_eq!(sink.batches(), vec![3, 2]);
        assert_eq!(source.offsets(), vec![100, 103]);
        assert!(
            source
                .attributions
                .lock()
                .unwrap()
                .iter()
                .all(|a| a.name == "Somchai")
        );
    }

    #[tokio::test]
    async fn csv_loop_does_not_touch_cache() {
        let source = ScriptedSource::new([csv_page(1)]);
        let sink = RecordingSink::default();
        let cache = cache_with_total(10);

        load_complaints(
            &source,
            &sink,
            &cache,
            &request(0, 1),
            &Attribution::default(),
            25_000,
        )
        .await
        .unwrap();

        assert_eq!(cache.total(), 10);
        assert!(cache.snapshot().is_empty());
    }

    #[tokio::test]
    async fn empty_csv_page_stops_without_inserting() {
        let source = ScriptedSource::new([Page::Csv(String::new())]);
        let sink = RecordingSink::default();
        let cache = cache_with_total(50_000);

        let report = load_complaints(
            &source,
            &sink,
            &cache,
            &request(0, 25_000),
            &Attribution::default(),
            25_000,
        )
        .await
        .unwrap();

        assert_eq!(report.outcome, LoadOutcome::NothingToInsert);
        assert_eq!(report.pages_inserted, 0);
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn malformed_csv_aborts_before_insert() {
        let source = ScriptedSource::new([
            csv_page(2),
            Page::Csv("ticket_id,type\nT-1\n".to_string()),
        ]);
        let sink = RecordingSink::default();
        let cache = cache_with_total(50_000);

        let failure = load_complaints(
            &source,
            &sink,
            &cache,
            &request(0, 2),
            &Attribution::default(),
            25_000,
        )
        .await
        .unwrap_err();

        assert_eq!(failure.pages_completed, 1);
        assert!(matches!(
            failure.error,
            LoadError::Convert(ConvertError::MalformedRow { .. })
        ));
        assert_eq!(sink.batches(), vec![2]);
    }
}
