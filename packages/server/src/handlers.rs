//! HTTP handler functions for the complaint API.

use actix_web::{HttpResponse, web};
use fondue_ingest::{LoadError, LoadFailure, load_complaints, load_features};
use fondue_ingest_models::{LoadOutcome, LoadReport};
use fondue_server_models::{
    ApiError, ApiHealth, ApiStatus, CsvPageParams, PageParams, STATUS_NOTHING_TO_INSERT,
    STATUS_SAVED,
};
use fondue_source::convert;
use fondue_source_models::Attribution;

use crate::AppState;
use crate::validation::{ValidationError, validate_page};

const FETCH_FAILED: &str = "Failed to fetch data";
const FETCH_CSV_FAILED: &str = "Failed to fetch CSV data";
const CONVERT_FAILED: &str = "Failed to convert CSV to JSON";
const INSERT_FAILED: &str = "Failed to append data to MongoDB";

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /`
///
/// Fetches one structured page, stores it as the cached page, and returns
/// it.
pub async fn fetch_page(
    state: web::Data<AppState>,
    params: web::Query<PageParams>,
) -> HttpResponse {
    let query = match validate_page(&params) {
        Ok(query) => query,
        Err(e) => return bad_request(&e),
    };

    match state.cache.refresh(state.source.as_ref(), &query).await {
        Ok(batch) => HttpResponse::Ok().json(&*batch),
        Err(e) => {
            log::error!("Failed to fetch page: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new(FETCH_FAILED).with_details(e.to_string()))
        }
    }
}

/// `GET /topojson`
///
/// Fetches one CSV page and returns it as complaint records. Nothing is
/// cached or stored.
pub async fn fetch_csv_page(
    state: web::Data<AppState>,
    params: web::Query<CsvPageParams>,
) -> HttpResponse {
    let query = match validate_page(&params.page()) {
        Ok(query) => query,
        Err(e) => return bad_request(&e),
    };
    let attribution = attribution_of(&params);

    let content = match state.source.fetch_csv(&query, &attribution).await {
        Ok(content) => content,
        Err(e) => {
            log::error!("Failed to fetch CSV page: {e}");
            return HttpResponse::InternalServerError()
                .json(ApiError::new(FETCH_CSV_FAILED).with_details(e.to_string()));
        }
    };

    match convert::csv_to_complaints(&content) {
        Ok(complaints) => HttpResponse::Ok().json(complaints),
        Err(e) => {
            log::error!("Failed to convert CSV page: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new(CONVERT_FAILED).with_details(e.to_string()))
        }
    }
}

/// `POST /saveToMongoDB`
///
/// Copies structured pages into the document store until the cached total
/// is covered or a page comes back empty.
pub async fn save_features(
    state: web::Data<AppState>,
    params: web::Query<PageParams>,
) -> HttpResponse {
    let query = match validate_page(&params) {
        Ok(query) => query,
        Err(e) => return bad_request(&e),
    };

    let result = load_features(
        state.source.as_ref(),
        state.sink.as_ref(),
        &state.cache,
        &query,
        state.page_sizes.features,
    )
    .await;

    load_response(result, FETCH_FAILED)
}

/// `POST /saveToMongoDBCSV`
///
/// Copies CSV pages into the document store until the cached total is
/// covered or a page comes back empty.
pub async fn save_complaints(
    state: web::Data<AppState>,
    params: web::Query<CsvPageParams>,
) -> HttpResponse {
    let query = match validate_page(&params.page()) {
        Ok(query) => query,
        Err(e) => return bad_request(&e),
    };
    let attribution = attribution_of(&params);

    let result = load_complaints(
        state.source.as_ref(),
        state.sink.as_ref(),
        &state.cache,
        &query,
        &attribution,
        state.page_sizes.csv,
    )
    .await;

    load_response(result, FETCH_CSV_FAILED)
}

fn attribution_of(params: &CsvPageParams) -> Attribution {
    Attribution {
        name: params.name.clone().unwrap_or_default(),
        org: params.org.clone().unwrap_or_default(),
        purpose: params.purpose.clone().unwrap_or_default(),
        email: params.email.clone().unwrap_or_default(),
    }
}

fn bad_request(error: &ValidationError) -> HttpResponse {
    let mut body = ApiError::new(error.to_string());
    if let Some(details) = error.details() {
        body = body.with_details(details);
    }
    HttpResponse::BadRequest().json(body)
}

fn load_response(result: Result<LoadReport, LoadFailure>, fetch_message: &str) -> HttpResponse {
    match result {
        Ok(report) => {
            let status = match report.outcome {
                LoadOutcome::Completed => STATUS_SAVED,
                LoadOutcome::NothingToInsert => STATUS_NOTHING_TO_INSERT,
            };
            HttpResponse::Ok().json(ApiStatus {
                status: status.to_string(),
            })
        }
        Err(failure) => {
            log::error!("Ingestion failed: {failure}");
            let message = match &failure.error {
                LoadError::Fetch(_) => fetch_message,
                LoadError::Convert(_) => CONVERT_FAILED,
                LoadError::Insert(_) => INSERT_FAILED,
            };
            HttpResponse::InternalServerError().json(
                ApiError::new(message)
                    .with_details(failure.error.to_string())
                    .with_pages_completed(failure.pages_completed),
            )
        }
    }
}
