use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use tracing::{info, warn};

use super::AppState;
use crate::models::AnalysisForm;
use crate::services::{chart_service, page_service, price_service};
use crate::utils::AppError;

/// GET / - empty form
pub async fn index() -> Result<Html<String>, AppError> {
    Ok(Html(page_service::analysis_form(&AnalysisForm::default(), None)?))
}

/// POST / - fetch one symbol and inline its four charts
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<AnalysisForm>,
) -> Result<Response, AppError> {
    info!(
        "📈 Analysis request: symbol='{}' start='{}' end='{}'",
        form.ticker_symbol, form.start_date, form.end_date
    );

    let request = match form.validate() {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected analysis form: {}", e);
            let html = page_service::analysis_form(&form, Some(&e.to_string()))?;
            return Ok((StatusCode::BAD_REQUEST, Html(html)).into_response());
        }
    };

    let table =
        price_service::fetch_price_table(state.market.as_ref(), &request.symbol, request.range)
            .await?;
    let charts = chart_service::render_analysis(&table)?;
    let html = page_service::analysis_results(&request, &table, &charts)?;

    info!("Rendered {} charts for {}", charts.len(), request.symbol);
    Ok(Html(html).into_response())
}
