//! Form input and the validation boundary in front of the fetch/render pipeline

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::models::chart::ChartType;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Rejected form input. Every variant is shown back to the user on the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid {field}: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },
    #[error("Start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("Ticker symbol '{0}' is not valid")]
    InvalidSymbol(String),
    #[error("Please enter at least one company name")]
    NoCompanyNames,
    #[error("Invalid chart type '{0}'. Please choose 'closing prices' or 'returns'.")]
    InvalidChartType(String),
}

/// Inclusive calendar window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        let start = parse_date("start date", start)?;
        let end = parse_date("end date", end)?;
        Self::new(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

/// Raw single-symbol analysis form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisForm {
    #[serde(default)]
    pub ticker_symbol: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub range: DateRange,
}

impl AnalysisForm {
    pub fn validate(&self) -> Result<AnalysisRequest, ValidationError> {
        let symbol = self.ticker_symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ValidationError::MissingField("ticker symbol"));
        }
        if !symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
        {
            return Err(ValidationError::InvalidSymbol(symbol));
        }

        let range = DateRange::parse(&self.start_date, &self.end_date)?;
        Ok(AnalysisRequest { symbol, range })
    }
}

/// Raw multi-symbol comparison form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompareForm {
    #[serde(default)]
    pub company_names: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub chart_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareRequest {
    pub company_names: Vec<String>,
    pub range: DateRange,
    pub chart_type: ChartType,
}

impl CompareForm {
    pub fn validate(&self) -> Result<CompareRequest, ValidationError> {
        let company_names: Vec<String> = self
            .company_names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if company_names.is_empty() {
            return Err(ValidationError::NoCompanyNames);
        }

        let range = DateRange::parse(&self.start_date, &self.end_date)?;
        let chart_type = ChartType::parse(&self.chart_type)?;

        Ok(CompareRequest {
            company_names,
            range,
            chart_type,
        })
    }
}
