use tracing::{info, warn};

use crate::api::{MarketData, ProviderError};

/// Resolve free-text company names to ticker symbols.
///
/// Names the provider has no symbol for are skipped with a warning; the order
/// of the remaining symbols follows the input. Transport and provider errors
/// abort the whole batch.
pub async fn resolve_symbols(
    provider: &dyn MarketData,
    company_names: &[String],
) -> Result<Vec<String>, ProviderError> {
    let mut symbols = Vec::with_capacity(company_names.len());

    for name in company_names {
        match provider.lookup_symbol(name).await? {
            Some(symbol) => {
                info!("Resolved '{}' to {}", name, symbol);
                symbols.push(symbol);
            }
            None => {
                warn!("Ticker symbol not found for '{}', skipping", name);
            }
        }
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeMarket;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_unresolvable_names_are_dropped() {
        let market = FakeMarket::default().with_company("Apple", "AAPL");

        let symbols = resolve_symbols(&market, &names(&["Apple", "NotARealCompany123"]))
            .await
            .unwrap();

        assert_eq!(symbols, vec!["AAPL"]);
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let market = FakeMarket::default()
            .with_company("Microsoft", "MSFT")
            .with_company("Apple", "AAPL")
            .with_company("Tesla", "TSLA");

        let symbols = resolve_symbols(&market, &names(&["Tesla", "Nope", "Apple", "Microsoft"]))
            .await
            .unwrap();

        assert_eq!(symbols, vec!["TSLA", "AAPL", "MSFT"]);
    }

    #[tokio::test]
    async fn test_nothing_resolves() {
        let market = FakeMarket::default();
        let symbols = resolve_symbols(&market, &names(&["Foo", "Bar"])).await.unwrap();
        assert!(symbols.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_batch() {
        let market = FakeMarket::default()
            .with_company("Apple", "AAPL")
            .failing_lookups();

        let err = resolve_symbols(&market, &names(&["Apple"])).await.unwrap_err();
        assert!(matches!(err, ProviderError::RequestError(_)));
    }
}
