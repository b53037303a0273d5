//! External market-data provider
//!
//! Routes and services only see the [`MarketData`] trait; `YahooClient` is the
//! production implementation.

pub mod yahoo;

use async_trait::async_trait;

use crate::models::{DateRange, PriceTable};

pub use yahoo::{ProviderError, YahooClient};

#[async_trait]
pub trait MarketData: Send + Sync {
    /// Daily OHLCV rows for `symbol` within the inclusive `range`, oldest first
    async fn price_history(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<PriceTable, ProviderError>;

    /// Canonical ticker for a free-text query, `None` when nothing matches
    async fn lookup_symbol(&self, query: &str) -> Result<Option<String>, ProviderError>;
}
