use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::api::ProviderError;
use crate::services::chart_service::ChartError;
use crate::services::page_service;

/// Failures after input validation; each maps to a generic error page
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Market data error: {0}")]
    Provider(#[from] ProviderError),
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

impl AppError {
    /// Status, heading and user-facing message. Provider details stay in the log.
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AppError::Provider(ProviderError::NotFound(_) | ProviderError::NoData(_)) => (
                StatusCode::BAD_GATEWAY,
                "No market data",
                "No price data was found for this request. Check the symbol and date range.",
            ),
            AppError::Provider(_) => (
                StatusCode::BAD_GATEWAY,
                "Market data unavailable",
                "Could not retrieve price data right now. Please try again later.",
            ),
            AppError::Chart(_) | AppError::Template(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "Something went wrong while building the page.",
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("❌ Request failed: {}", self);
        let (status, heading, message) = self.parts();
        (status, Html(page_service::error_page(heading, message))).into_response()
    }
}
