use serde::Deserialize;
use thiserror::Error;

/// Response envelope of `/v8/finance/chart/{symbol}`
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartErrorBody {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    /// Missing entirely when the window holds no trading days
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartMeta {
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

/// Parallel OHLCV columns; individual entries are null on halted days
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

/// Response of `/v1/finance/search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub quotes: Vec<SearchQuote>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuote {
    pub symbol: Option<String>,
}

/// Error type for market-data operations
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// 404, usually an unknown or delisted symbol
    #[error("Not Found: {0}")]
    NotFound(String),
    /// 429 Too Many Requests
    #[error("Rate Limited by market-data provider")]
    RateLimited,
    /// 5xx Server Error
    #[error("Server Error ({0}): {1}")]
    ServerError(u16, String),
    /// Other HTTP errors
    #[error("HTTP Error ({0}): {1}")]
    HttpError(u16, String),
    /// Error object embedded in an otherwise successful response
    #[error("Provider error {code}: {description}")]
    Api { code: String, description: String },
    /// Network/request error
    #[error("Request Error: {0}")]
    RequestError(String),
    /// Deserialization error
    #[error("Deserialization Error: {0}")]
    DeserializationError(String),
    /// The window contained no usable rows
    #[error("No price data returned for {0}")]
    NoData(String),
}
