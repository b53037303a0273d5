use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use tracing::{info, warn};

use super::AppState;
use crate::models::CompareForm;
use crate::services::{chart_service, page_service, price_service, symbol_service};
use crate::utils::AppError;

const NO_VALID_SYMBOLS: &str =
    "No valid ticker symbols found. Please check your input company names.";

/// GET / - empty form
pub async fn index() -> Result<Html<String>, AppError> {
    Ok(Html(page_service::compare_form(&CompareForm::default(), None)?))
}

/// POST / - resolve names, overlay their series and save the chart
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<CompareForm>,
) -> Result<Response, AppError> {
    info!(
        "📊 Compare request: names='{}' start='{}' end='{}' chart_type='{}'",
        form.company_names, form.start_date, form.end_date, form.chart_type
    );

    let request = match form.validate() {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected compare form: {}", e);
            let html = page_service::compare_form(&form, Some(&e.to_string()))?;
            return Ok((StatusCode::BAD_REQUEST, Html(html)).into_response());
        }
    };

    let symbols =
        symbol_service::resolve_symbols(state.market.as_ref(), &request.company_names).await?;
    if symbols.is_empty() {
        warn!("None of {:?} resolved to a ticker", request.company_names);
        let html = page_service::compare_form(&form, Some(NO_VALID_SYMBOLS))?;
        return Ok(Html(html).into_response());
    }

    let series =
        price_service::fetch_close_series(state.market.as_ref(), &symbols, request.range).await?;
    let chart = chart_service::render_comparison(&series, request.chart_type)?;
    let chart_url = state.charts.save(&chart.png)?;

    info!("Comparison of {:?} saved to {}", symbols, chart_url);
    let html =
        page_service::compare_results(&symbols, request.chart_type, &request.range, &chart_url)?;
    Ok(Html(html).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::compare_router;
    use crate::routes::tests::{body_text, get, post_form, test_state};
    use crate::routes::AppState;
    use crate::services::testing::FakeMarket;

    const APPLE_AND_MICROSOFT: &str =
        "company_names=Apple%2C+Microsoft&start_date=2024-01-02&end_date=2024-01-31&chart_type=returns";

    fn two_companies() -> FakeMarket {
        FakeMarket::default()
            .with_company("Apple", "AAPL")
            .with_company("Microsoft", "MSFT")
            .with_closes("AAPL", "2024-01-02", &[185.6, 184.2, 181.9])
            .with_closes("MSFT", "2024-01-02", &[370.9, 370.6, 367.8])
    }

    /// `src` of the chart image on a results page
    fn chart_url(body: &str) -> String {
        let start = body.find("src=\"/static/charts/").unwrap() + "src=\"".len();
        let len = body[start..].find('"').unwrap();
        body[start..start + len].to_string()
    }

    async fn submit(state: &AppState, form: &str) -> String {
        let response = post_form(compare_router(state.clone()), form).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_text(response).await
    }

    #[tokio::test]
    async fn test_get_returns_form() {
        let response = get(compare_router(test_state(FakeMarket::default())), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("name=\"company_names\""));
        assert!(body.contains("name=\"chart_type\""));
    }

    #[tokio::test]
    async fn test_unknown_chart_type_is_reported() {
        let market = FakeMarket::default()
            .with_company("Apple", "AAPL")
            .with_closes("AAPL", "2024-01-01", &[1.0, 2.0]);
        let response = post_form(
            compare_router(test_state(market.clone())),
            "company_names=Apple&start_date=2024-01-01&end_date=2024-01-31&chart_type=candles",
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Invalid chart type"));
        assert_eq!(market.history_call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_resolvable_names_shows_message() {
        let market = FakeMarket::default().with_closes("AAPL", "2024-01-01", &[1.0, 2.0]);
        let response = post_form(
            compare_router(test_state(market.clone())),
            "company_names=Foo%2C+Bar&start_date=2024-01-01&end_date=2024-01-31&chart_type=returns",
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("No valid ticker symbols found"));
        assert!(body.contains("value=\"Foo, Bar\""));
        assert_eq!(market.history_call_count(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_bad_gateway() {
        let market = FakeMarket::default().failing_lookups();
        let response = post_form(
            compare_router(test_state(market)),
            "company_names=Apple&start_date=2024-01-01&end_date=2024-01-31&chart_type=returns",
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_bad_gateway() {
        let market = FakeMarket::default()
            .with_company("Apple", "AAPL")
            .failing_history();
        let response = post_form(
            compare_router(test_state(market.clone())),
            "company_names=Apple&start_date=2024-01-01&end_date=2024-01-31&chart_type=Closing+Prices",
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(market.history_call_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_saves_chart_and_serves_it() {
        let state = test_state(two_companies());
        let body = submit(&state, APPLE_AND_MICROSOFT).await;
        assert!(body.contains("AAPL, MSFT"));

        let url = chart_url(&body);
        assert!(url.starts_with("/static/charts/chart-") && url.ends_with(".png"));

        let response = get(compare_router(state.clone()), &url).await;
        assert_eq!(response.status(), StatusCode::OK);
        let png = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(png.starts_with(b"\x89PNG"));

        std::fs::remove_dir_all(&state.static_dir).unwrap();
    }

    #[tokio::test]
    async fn test_each_submission_gets_its_own_chart() {
        let state = test_state(two_companies());
        let first = chart_url(&submit(&state, APPLE_AND_MICROSOFT).await);
        let second = chart_url(
            &submit(
                &state,
                "company_names=Apple&start_date=2024-01-02&end_date=2024-01-31&chart_type=closing+prices",
            )
            .await,
        );
        assert_ne!(first, second);

        let saved = std::fs::read_dir(state.static_dir.join("charts"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".png"))
            .count();
        assert_eq!(saved, 2);

        for url in [first, second] {
            let response = get(compare_router(state.clone()), &url).await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        std::fs::remove_dir_all(&state.static_dir).unwrap();
    }

    #[tokio::test]
    async fn test_returns_over_single_session() {
        let market = FakeMarket::default()
            .with_company("Apple", "AAPL")
            .with_closes("AAPL", "2024-01-02", &[185.6]);
        let state = test_state(market);
        let body = submit(
            &state,
            "company_names=Apple&start_date=2024-01-02&end_date=2024-01-02&chart_type=returns",
        )
        .await;
        assert!(chart_url(&body).starts_with("/static/charts/chart-"));

        std::fs::remove_dir_all(&state.static_dir).unwrap();
    }
}
