//! Single-shot HTTP helpers for upstream requests.
//!
//! All fetchers should use [`send_json`] or [`send_text`] instead of
//! calling `reqwest::RequestBuilder::send()` directly, so every request
//! gets the same status handling and failure logging.
//!
//! Requests are sent exactly once. A failed page aborts the calling loop,
//! and the caller decides where to restart from.
//!
//! # Usage
//!
//! ```ignore
//! use crate::http;
//!
//! // GET with query params → typed JSON
//! let batch: RecordBatch = http::send_json(client.get(&url).query(&params)).await?;
//!
//! // GET → text (CSV)
//! let csv = http::send_text(client.get(&url).query(&params)).await?;
//! ```

use serde::de::DeserializeOwned;

use crate::SourceError;

/// Maximum number of characters of the response body included in error
/// logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Sends an HTTP request and decodes the response body as JSON into `T`.
///
/// The body is read as text first so the actual content can be logged
/// when decoding fails.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails, the server answers with a
/// non-success status, or the body does not decode as `T`.
pub async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, SourceError> {
    let response = send_inner(request).await?;

    let url = response.url().to_string();
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let text = response.text().await.inspect_err(|e| {
        log::error!(
            "Response body read failed.\n  \
             url: {url}\n  \
             status: {status}\n  \
             error: {e}"
        );
    })?;

    serde_json::from_str(&text).map_err(|json_err| {
        log::error!(
            "JSON parse failed.\n  \
             url: {url}\n  \
             status: {status}\n  \
             content-type: {content_type:?}\n  \
             received: {} bytes\n  \
             parse error: {json_err}\n  \
             body preview: {}",
            text.len(),
            preview(&text),
        );
        SourceError::Json(json_err)
    })
}

/// Sends an HTTP request and returns the response body as a `String`.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails, the server answers with a
/// non-success status, or the body cannot be read as text.
pub async fn send_text(request: reqwest::RequestBuilder) -> Result<String, SourceError> {
    let response = send_inner(request).await?;

    let url = response.url().to_string();
    let text = response.text().await.inspect_err(|e| {
        log::error!("Text body read failed.\n  url: {url}\n  error: {e}");
    })?;

    log::debug!("Received {} bytes from {url}", text.len());
    Ok(text)
}

/// Sends the request and rejects anything that is not a 2xx response.
async fn send_inner(request: reqwest::RequestBuilder) -> Result<reqwest::Response, SourceError> {
    let response = request.send().await.inspect_err(|e| {
        log::error!("Request failed: {e}");
    })?;

    let status = response.status();
    if !status.is_success() {
        log::error!("HTTP {status} from {}", response.url());
        return Err(SourceError::Status { status });
    }

    Ok(response)
}

/// Returns at most [`BODY_PREVIEW_LEN`] characters of `text`, cut on a
/// character boundary.
fn preview(text: &str) -> String {
    match text.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
