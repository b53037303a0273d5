//! Data models shared by the routes and services
//!
//! Form input and its validated form live in `request`, fetched market data in
//! `price`, and chart selectors and rendered output in `chart`.

pub mod chart;
pub mod price;
pub mod request;

// Re-export commonly used types for convenience
pub use chart::{ChartKind, ChartType, Histogram, RenderedChart};
pub use price::{PriceRow, PriceTable, SymbolSeries};
pub use request::{AnalysisForm, AnalysisRequest, CompareForm, DateRange};
