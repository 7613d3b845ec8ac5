//! HTTP client for the Traffy Fondue stat API.

use async_trait::async_trait;
use fondue_complaint_models::RecordBatch;
use fondue_source_models::{Attribution, OutputFormat, PageQuery};

use crate::{ComplaintSource, SourceError, http};

/// Public endpoint serving both the structured and CSV exports.
pub const DEFAULT_API_URL: &str =
    "https://publicapi.traffy.in.th/teamchadchart-stat-api/geojson/v1";

/// Environment variable overriding [`DEFAULT_API_URL`].
pub const API_URL_ENV: &str = "FONDUE_API_URL";

/// [`ComplaintSource`] backed by the upstream HTTP API.
#[derive(Debug, Clone)]
pub struct TraffyClient {
    client: reqwest::Client,
    base_url: String,
}

impl TraffyClient {
    /// Creates a client for the given endpoint.
    ///
    /// No request timeout is configured; a page fetch waits as long as the
    /// connection stays open.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Creates a client for the endpoint named by `FONDUE_API_URL`, or
    /// [`DEFAULT_API_URL`] when unset.
    #[must_use]
    pub fn from_env() -> Self {
        let url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(url)
    }

    /// Returns the endpoint this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ComplaintSource for TraffyClient {
    async fn fetch_features(&self, query: &PageQuery) -> Result<RecordBatch, SourceError> {
        let params = query_params(OutputFormat::Json, query, None);
        log::debug!(
            "Fetching JSON page offset={} limit={} from {}",
            query.offset,
            query.limit,
            self.base_url
        );

        let batch: RecordBatch =
            http::send_json(self.client.get(&self.base_url).query(&params)).await?;

        log::debug!(
            "Received {} features (total={}, count_total={})",
            batch.features.len(),
            batch.total,
            batch.count_total
        );
        Ok(batch)
    }

    async fn fetch_csv(
        &self,
        query: &PageQuery,
        attribution: &Attribution,
    ) -> Result<String, SourceError> {
        let params = query_params(OutputFormat::Csv, query, Some(attribution));
        log::debug!(
            "Fetching CSV page offset={} limit={} from {}",
            query.offset,
            query.limit,
            self.base_url
        );

        http::send_text(self.client.get(&self.base_url).query(&params)).await
    }
}

/// Builds the upstream query string parameters for one page.
fn query_params(
    format: OutputFormat,
    query: &PageQuery,
    attribution: Option<&Attribution>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("output_format", format.to_string()),
        ("start", query.range.start.clone()),
        ("end", query.range.end.clone()),
        ("limit", query.limit.to_string()),
        ("offset", query.offset.to_string()),
    ];

    if let Some(attribution) = attribution {
        params.extend([
            ("name", attribution.name.clone()),
            ("org", attribution.org.clone()),
            ("purpose", attribution.purpose.clone()),
            ("email", attribution.email.clone()),
        ]);
    }

    params
}
