use tracing::{debug, info};

use crate::api::{MarketData, ProviderError};
use crate::models::{DateRange, PriceTable, SymbolSeries};

/// Fetch the full OHLCV table of one symbol
pub async fn fetch_price_table(
    provider: &dyn MarketData,
    symbol: &str,
    range: DateRange,
) -> Result<PriceTable, ProviderError> {
    info!("Fetching {} from {} to {}", symbol, range.start, range.end);

    let table = provider.price_history(symbol, range).await?;
    if table.is_empty() {
        return Err(ProviderError::NoData(symbol.to_string()));
    }

    if let (Some(first), Some(last)) = (table.rows.first(), table.rows.last()) {
        debug!(
            "{}: {} rows, {} close {:.2} .. {} close {:.2}",
            symbol,
            table.rows.len(),
            first.date,
            first.close,
            last.date,
            last.close
        );
    }

    Ok(table)
}

/// Fetch the close series of every symbol, one request each, in input order
pub async fn fetch_close_series(
    provider: &dyn MarketData,
    symbols: &[String],
    range: DateRange,
) -> Result<Vec<SymbolSeries>, ProviderError> {
    let mut series = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let table = fetch_price_table(provider, symbol, range).await?;
        series.push(SymbolSeries::from(table));
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeMarket;

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::parse(start, end).unwrap()
    }

    #[tokio::test]
    async fn test_table_lies_within_window() {
        let market = FakeMarket::default().with_closes(
            "AAPL",
            "2024-01-01",
            &[100.0, 101.0, 102.0, 103.0, 104.0, 105.0],
        );
        let window = range("2024-01-02", "2024-01-04");

        let table = fetch_price_table(&market, "AAPL", window).await.unwrap();

        assert_eq!(table.closes(), vec![101.0, 102.0, 103.0]);
        assert!(table.rows.iter().all(|r| window.contains(r.date)));
        assert!(table.rows.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[tokio::test]
    async fn test_close_series_keep_symbol_order() {
        let market = FakeMarket::default()
            .with_closes("MSFT", "2024-01-01", &[370.0, 372.5])
            .with_closes("AAPL", "2024-01-01", &[185.0, 184.0]);
        let symbols = vec!["MSFT".to_string(), "AAPL".to_string()];

        let series = fetch_close_series(&market, &symbols, range("2024-01-01", "2024-01-31"))
            .await
            .unwrap();

        let names: Vec<&str> = series.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(names, vec!["MSFT", "AAPL"]);
        assert_eq!(series[1].points[1].1, 184.0);
    }

    #[tokio::test]
    async fn test_unknown_symbol_propagates() {
        let market = FakeMarket::default().with_closes("AAPL", "2024-01-01", &[1.0]);
        let symbols = vec!["AAPL".to_string(), "NOPE".to_string()];

        let err = fetch_close_series(&market, &symbols, range("2024-01-01", "2024-01-31"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(ref s) if s == "NOPE"));
    }
}
