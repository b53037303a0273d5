//! HTML composition for both services

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lazy_static::lazy_static;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::error;

use crate::models::{
    AnalysisForm, AnalysisRequest, ChartType, CompareForm, DateRange, PriceTable, RenderedChart,
};

lazy_static! {
    static ref TEMPLATES: Tera = build_templates().unwrap_or_else(|e| {
        error!("Failed to load page templates: {}", e);
        Tera::default()
    });
}

fn build_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    let sources = vec![
        ("base.html", include_str!("../../templates/base.html")),
        ("error.html", include_str!("../../templates/error.html")),
        ("analysis/index.html", include_str!("../../templates/analysis/index.html")),
        ("analysis/results.html", include_str!("../../templates/analysis/results.html")),
        ("compare/index.html", include_str!("../../templates/compare/index.html")),
        ("compare/results.html", include_str!("../../templates/compare/results.html")),
    ];
    tera.add_raw_templates(sources)?;
    Ok(tera)
}

/// Parse the embedded templates; run at startup so a broken one stops the process
pub fn check_templates() -> Result<(), tera::Error> {
    build_templates().map(|_| ())
}

#[derive(Serialize)]
struct InlineImage<'a> {
    title: &'a str,
    data: String,
}

/// Base64 text of a PNG, suitable for a `data:` URL
pub fn encode_png(png: &[u8]) -> String {
    STANDARD.encode(png)
}

fn insert_range(context: &mut Context, range: &DateRange) {
    context.insert("start_date", &range.start.to_string());
    context.insert("end_date", &range.end.to_string());
}

pub fn analysis_form(form: &AnalysisForm, error: Option<&str>) -> Result<String, tera::Error> {
    let mut context = Context::new();
    context.insert("form", &FormValues::from(form));
    context.insert("error", &error);
    TEMPLATES.render("analysis/index.html", &context)
}

/// Results page with every chart inlined, in render order
pub fn analysis_results(
    request: &AnalysisRequest,
    table: &PriceTable,
    charts: &[RenderedChart],
) -> Result<String, tera::Error> {
    let images: Vec<InlineImage> = charts
        .iter()
        .map(|c| InlineImage {
            title: c.kind.title(),
            data: encode_png(&c.png),
        })
        .collect();

    let mut context = Context::new();
    context.insert("symbol", &request.symbol);
    context.insert("rows", &table.rows.len());
    context.insert("charts", &images);
    insert_range(&mut context, &request.range);
    TEMPLATES.render("analysis/results.html", &context)
}

pub fn compare_form(form: &CompareForm, error: Option<&str>) -> Result<String, tera::Error> {
    let mut context = Context::new();
    context.insert("form", &FormValues::from(form));
    context.insert("error", &error);
    TEMPLATES.render("compare/index.html", &context)
}

pub fn compare_results(
    symbols: &[String],
    chart_type: ChartType,
    range: &DateRange,
    chart_url: &str,
) -> Result<String, tera::Error> {
    let mut context = Context::new();
    context.insert("symbols", symbols);
    context.insert("chart_type", &chart_type.to_string());
    context.insert("chart", chart_url);
    insert_range(&mut context, range);
    TEMPLATES.render("compare/results.html", &context)
}

/// Generic failure page. Falls back to plain markup if the templates are unusable.
pub fn error_page(heading: &str, message: &str) -> String {
    let mut context = Context::new();
    context.insert("heading", heading);
    context.insert("message", message);
    TEMPLATES.render("error.html", &context).unwrap_or_else(|e| {
        error!("Failed to render error page: {}", e);
        format!("<!DOCTYPE html><html><body><h1>{}</h1></body></html>", heading)
    })
}

/// Previously submitted values, echoed back into the form
#[derive(Serialize, Default)]
struct FormValues<'a> {
    ticker_symbol: &'a str,
    company_names: &'a str,
    start_date: &'a str,
    end_date: &'a str,
    chart_type: String,
}

impl<'a> From<&'a AnalysisForm> for FormValues<'a> {
    fn from(form: &'a AnalysisForm) -> Self {
        Self {
            ticker_symbol: &form.ticker_symbol,
            start_date: &form.start_date,
            end_date: &form.end_date,
            ..Default::default()
        }
    }
}

impl<'a> From<&'a CompareForm> for FormValues<'a> {
    fn from(form: &'a CompareForm) -> Self {
        Self {
            company_names: &form.company_names,
            start_date: &form.start_date,
            end_date: &form.end_date,
            chart_type: form.chart_type.trim().to_lowercase(),
            ..Default::default()
        }
    }
}
