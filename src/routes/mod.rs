use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::Level;

use crate::api::MarketData;
use crate::services::ChartStore;

pub mod analysis;
pub mod compare;

/// URL prefix the static directory is mounted at
pub const STATIC_PREFIX: &str = "/static";

#[derive(Clone)]
pub struct AppState {
    pub market: Arc<dyn MarketData>,
    pub charts: ChartStore,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(market: Arc<dyn MarketData>, static_dir: PathBuf, chart_retention: usize) -> Self {
        Self {
            market,
            charts: ChartStore::new(&static_dir, STATIC_PREFIX, chart_retention),
            static_dir,
        }
    }
}

/// Single-symbol analysis service
pub fn analysis_router(state: AppState) -> Router {
    with_tracing(
        Router::new()
            .route("/", get(analysis::index).post(analysis::submit))
            .route("/healthz", get(healthz))
            .with_state(state),
    )
}

/// Multi-symbol comparison service; also serves the saved charts
pub fn compare_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    with_tracing(
        Router::new()
            .route("/", get(compare::index).post(compare::submit))
            .route("/healthz", get(healthz))
            .nest_service(STATIC_PREFIX, static_files)
            .with_state(state),
    )
}

fn with_tracing(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO))
            .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
    )
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::services::testing::FakeMarket;

    pub fn test_state(market: FakeMarket) -> AppState {
        let static_dir = std::env::temp_dir().join(format!("tickerplot_static_{}", Uuid::new_v4()));
        AppState::new(Arc::new(market), static_dir, 5)
    }

    pub async fn post_form(app: Router, body: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    pub async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        for app in [
            analysis_router(test_state(FakeMarket::default())),
            compare_router(test_state(FakeMarket::default())),
        ] {
            let response = get(app, "/healthz").await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_text(response).await, "ok");
        }
    }

    #[tokio::test]
    async fn test_saved_charts_are_served() {
        let state = test_state(FakeMarket::default());
        let url = state.charts.save(b"not really a png").unwrap();
        let static_dir = state.static_dir.clone();

        let response = get(compare_router(state), &url).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "not really a png");

        std::fs::remove_dir_all(static_dir).unwrap();
    }
}
