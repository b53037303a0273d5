//! In-memory market used by service and route tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

use crate::api::{MarketData, ProviderError};
use crate::models::{DateRange, PriceRow, PriceTable};

#[derive(Default, Clone)]
pub struct FakeMarket {
    companies: HashMap<String, String>,
    tables: HashMap<String, Vec<PriceRow>>,
    fail_lookups: bool,
    fail_history: bool,
    pub history_calls: Arc<AtomicUsize>,
}

impl FakeMarket {
    pub fn with_company(mut self, name: &str, symbol: &str) -> Self {
        self.companies.insert(name.to_lowercase(), symbol.to_string());
        self
    }

    /// Daily rows starting at `start`, one per close value
    pub fn with_closes(mut self, symbol: &str, start: &str, closes: &[f64]) -> Self {
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
        let rows = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceRow {
                date: start + Duration::days(i as i64),
                open: close - 1.0,
                high: close + 2.0,
                low: close - 2.0,
                close,
                volume: 1_000_000 + i as u64 * 1_000,
            })
            .collect();
        self.tables.insert(symbol.to_string(), rows);
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn failing_history(mut self) -> Self {
        self.fail_history = true;
        self
    }

    pub fn history_call_count(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    async fn price_history(
        &self,
        symbol: &str,
        range: DateRange,
    ) -> Result<PriceTable, ProviderError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_history {
            return Err(ProviderError::ServerError(503, "unavailable".to_string()));
        }
        let rows = self
            .tables
            .get(symbol)
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;
        let rows: Vec<PriceRow> = rows
            .iter()
            .filter(|r| range.contains(r.date))
            .cloned()
            .collect();
        if rows.is_empty() {
            return Err(ProviderError::NoData(symbol.to_string()));
        }
        Ok(PriceTable::new(symbol, rows))
    }

    async fn lookup_symbol(&self, query: &str) -> Result<Option<String>, ProviderError> {
        if self.fail_lookups {
            return Err(ProviderError::RequestError("connection refused".to_string()));
        }
        Ok(self.companies.get(&query.to_lowercase()).cloned())
    }
}
