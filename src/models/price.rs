//! Historical price models

use chrono::NaiveDate;

/// One trading day of OHLCV data
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Date-ordered price history for a single symbol
#[derive(Debug, Clone)]
pub struct PriceTable {
    pub symbol: String,
    pub rows: Vec<PriceRow>,
}

impl PriceTable {
    pub fn new(symbol: impl Into<String>, rows: Vec<PriceRow>) -> Self {
        Self {
            symbol: symbol.into(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    /// Close series paired with its date index
    pub fn close_points(&self) -> Vec<(NaiveDate, f64)> {
        self.rows.iter().map(|r| (r.date, r.close)).collect()
    }

    pub fn volume_points(&self) -> Vec<(NaiveDate, f64)> {
        self.rows.iter().map(|r| (r.date, r.volume as f64)).collect()
    }
}

/// Close-price series of one symbol, used for comparison overlays
#[derive(Debug, Clone)]
pub struct SymbolSeries {
    pub symbol: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl From<PriceTable> for SymbolSeries {
    fn from(table: PriceTable) -> Self {
        let points = table.close_points();
        Self {
            symbol: table.symbol,
            points,
        }
    }
}
