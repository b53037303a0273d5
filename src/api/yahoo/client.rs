use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use super::models::{ChartResponse, ChartResult, ProviderError, SearchResponse};
use crate::api::MarketData;
use crate::models::{DateRange, PriceRow, PriceTable};

/// Yahoo Finance client for daily price history and symbol search
pub struct YahooClient {
    http_client: HttpClient,
    base_url: String,
}

impl YahooClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://query1.finance.yahoo.com";

    const USER_AGENT: &'static str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    /// Create a client against `base_url` (`DEFAULT_BASE_URL` in production, a mock server in tests)
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, ProviderError> {
        let http_client = HttpClient::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::RequestError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// UNIX bounds for an inclusive window: start of `start` up to start of the day after `end`
    fn period_bounds(range: DateRange) -> (i64, i64) {
        let day_start = |d: NaiveDate| {
            d.and_hms_opt(0, 0, 0)
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).timestamp())
                .unwrap_or_default()
        };
        let after_end = range.end.succ_opt().unwrap_or(range.end);
        (day_start(range.start), day_start(after_end))
    }

    /// Map a non-success status to a typed error, keeping Yahoo's description when present
    async fn handle_error_response(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ProviderError {
        let status_code = status.as_u16();
        let body_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ChartResponse>(&body_text)
            .ok()
            .and_then(|r| r.chart.error)
            .map(|e| e.description)
            .unwrap_or(body_text);

        match status_code {
            404 => ProviderError::NotFound(message),
            429 => {
                warn!("Rate limited by Yahoo Finance");
                ProviderError::RateLimited
            }
            500..=599 => {
                warn!("Server error {}: {}", status_code, message);
                ProviderError::ServerError(status_code, message)
            }
            _ => ProviderError::HttpError(status_code, message),
        }
    }

    /// GET /v8/finance/chart/{symbol}
    ///
    /// Fetches daily candles for the inclusive window. Rows without a close are
    /// dropped; the result is sorted by date and clipped to the window.
    pub async fn get_price_history(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<PriceTable, ProviderError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let (period1, period2) = Self::period_bounds(range);
        debug!("Fetching {} from {} ({}..{})", symbol, url, period1, period2);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::RequestError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .json::<ChartResponse>()
            .await
            .map_err(|e| ProviderError::DeserializationError(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = body.chart.error {
            return Err(ProviderError::Api {
                code: error.code,
                description: error.description,
            });
        }

        let result = body
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| ProviderError::NoData(symbol.to_string()))?;

        let rows = rows_from_chart(&result, range);
        debug!("Received {} rows for {}", rows.len(), symbol);

        if rows.is_empty() {
            return Err(ProviderError::NoData(symbol.to_string()));
        }

        Ok(PriceTable::new(symbol, rows))
    }

    /// GET /v1/finance/search
    ///
    /// Returns the symbol of the best matching quote for a free-text query.
    pub async fn search_symbol(&self, query: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/v1/finance/search", self.base_url);
        debug!("Searching symbol for '{}'", query);

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", query), ("quotesCount", "1"), ("newsCount", "0")])
            .send()
            .await
            .map_err(|e| ProviderError::RequestError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| ProviderError::DeserializationError(format!("Failed to parse response: {}", e)))?;

        Ok(body
            .quotes
            .into_iter()
            .filter_map(|q| q.symbol)
            .find(|s| !s.trim().is_empty()))
    }
}

#[async_trait]
impl MarketData for YahooClient {
    async fn price_history(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<PriceTable, ProviderError> {
        self.get_price_history(symbol, range).await
    }

    async fn lookup_symbol(&self, query: &str) -> Result<Option<String>, ProviderError> {
        self.search_symbol(query).await
    }
}

/// Zip the parallel columns of a chart result into rows inside `range`
pub(crate) fn rows_from_chart(result: &ChartResult, range: DateRange) -> Vec<PriceRow> {
    let timestamps = result.timestamp.as_deref().unwrap_or_default();
    let Some(quote) = result.indicators.quote.first() else {
        return Vec::new();
    };
    let offset = result.meta.gmtoffset;
    let column = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten().unwrap_or(f64::NAN);

    let mut rows: Vec<PriceRow> = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = quote.close.get(i).copied().flatten()?;
            // Exchange-local calendar day
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            if !range.contains(date) {
                return None;
            }
            Some(PriceRow {
                date,
                open: column(quote.open.as_slice(), i),
                high: column(quote.high.as_slice(), i),
                low: column(quote.low.as_slice(), i),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            })
        })
        .collect();

    rows.sort_by_key(|r| r.date);
    rows.dedup_by_key(|r| r.date);
    rows
}
