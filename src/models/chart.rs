//! Chart generation models

use std::fmt;

use crate::models::request::ValidationError;

/// Overlay selector for the comparison chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    ClosingPrices,
    Returns,
}

impl ChartType {
    /// Parse the form value, ignoring case and surrounding whitespace
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.trim().to_lowercase().as_str() {
            "closing prices" => Ok(ChartType::ClosingPrices),
            "returns" => Ok(ChartType::Returns),
            other => Err(ValidationError::InvalidChartType(other.to_string())),
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            ChartType::ClosingPrices => "Price (USD)",
            ChartType::Returns => "Percentage Returns",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartType::ClosingPrices => write!(f, "closing prices"),
            ChartType::Returns => write!(f, "returns"),
        }
    }
}

/// Every chart the services draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    ClosingPrices,
    DailyReturns,
    Volume,
    Histogram,
    Comparison,
}

impl ChartKind {
    pub fn title(self) -> &'static str {
        match self {
            ChartKind::ClosingPrices => "Closing Prices Over Time",
            ChartKind::DailyReturns => "Daily Returns Over Time",
            ChartKind::Volume => "Trading Volume Over Time",
            ChartKind::Histogram => "Histogram of Closing Prices",
            ChartKind::Comparison => "Historical Stock Comparison",
        }
    }

    /// Canvas size in pixels (8x6 or 10x6 inches at 100 dpi)
    pub fn size(self) -> (u32, u32) {
        match self {
            ChartKind::Comparison => (1000, 600),
            _ => (800, 600),
        }
    }
}

/// A rendered PNG image
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub png: Vec<u8>,
}

/// Equal-width binning of a series
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Bin edges, one more than the number of bins
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(self.counts.iter())
            .map(|(edge, &count)| (edge[0], edge[1], count))
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}
