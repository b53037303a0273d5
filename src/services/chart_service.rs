use std::fs;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{ChartKind, ChartType, PriceTable, RenderedChart, SymbolSeries};
use crate::services::analytics_service::{histogram, padded_range, pct_change, HISTOGRAM_BINS};

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Not enough data to draw '{0}'")]
    NoData(&'static str),
    #[error("Failed to {0}")]
    Render(String),
    #[error("Chart file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Series colors, cycled per symbol on the comparison chart
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// A contiguous run of defined points
pub type Segment = Vec<(NaiveDate, f64)>;

/// One legend entry and the segments drawn for it
#[derive(Debug, Clone)]
pub struct Line {
    pub label: String,
    pub segments: Vec<Segment>,
}

/// Scratch PNG the bitmap backend renders into; removed when dropped
struct TempChartFile {
    path: PathBuf,
}

impl TempChartFile {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("tickerplot_chart_{}.png", Uuid::new_v4()));
        Self { path }
    }

    fn read(&self) -> Result<Vec<u8>, ChartError> {
        Ok(fs::read(&self.path)?)
    }
}

impl Drop for TempChartFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn render_err<E: std::fmt::Display>(step: &'static str) -> impl Fn(E) -> ChartError {
    move |e| ChartError::Render(format!("{}: {}", step, e))
}

/// Run `draw` against a fresh white canvas sized for `kind` and return the PNG bytes.
/// The backend is released before the file is read; the file is removed on every path.
fn render_png<F>(kind: ChartKind, draw: F) -> Result<RenderedChart, ChartError>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), ChartError>,
{
    let target = TempChartFile::new();

    {
        let root = BitMapBackend::new(&target.path, kind.size()).into_drawing_area();
        root.fill(&WHITE).map_err(render_err("fill canvas"))?;
        draw(&root)?;
        root.present().map_err(render_err("render chart"))?;
    }

    let png = target.read()?;
    debug!("Rendered '{}' ({} bytes)", kind.title(), png.len());
    Ok(RenderedChart { kind, png })
}

/// Split a series into runs of defined values; `None` breaks the line
pub fn segments(dates: &[NaiveDate], values: &[Option<f64>]) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (&date, value) in dates.iter().zip(values) {
        match value {
            Some(v) if v.is_finite() => current.push((date, *v)),
            _ => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Overlay lines for the comparison chart, one per symbol in input order
pub fn comparison_lines(series: &[SymbolSeries], chart_type: ChartType) -> Vec<Line> {
    series
        .iter()
        .map(|s| {
            let dates: Vec<NaiveDate> = s.points.iter().map(|p| p.0).collect();
            let values: Vec<Option<f64>> = match chart_type {
                ChartType::ClosingPrices => s.points.iter().map(|p| Some(p.1)).collect(),
                ChartType::Returns => {
                    let closes: Vec<f64> = s.points.iter().map(|p| p.1).collect();
                    pct_change(&closes)
                }
            };
            Line {
                label: s.symbol.clone(),
                segments: segments(&dates, &values),
            }
        })
        .collect()
}

fn span_of(dates: impl Iterator<Item = NaiveDate>) -> Option<(NaiveDate, NaiveDate)> {
    dates.fold(None, |acc, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    })
}

/// X-axis bounds over the plotted points, or over `dates` when no point is defined.
/// A single day is widened so the axis has non-zero length.
fn date_bounds(lines: &[Line], dates: &[NaiveDate]) -> Option<(NaiveDate, NaiveDate)> {
    let plotted = lines
        .iter()
        .flat_map(|l| l.segments.iter().flatten().map(|p| p.0));
    let (lo, hi) = span_of(plotted).or_else(|| span_of(dates.iter().copied()))?;
    if lo == hi {
        Some((lo, hi + Duration::days(1)))
    } else {
        Some((lo, hi))
    }
}

/// Caption, axes and one line per entry. With nothing defined to plot (a lone
/// return, say) the axes are still drawn over `dates`.
fn draw_date_lines(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    kind: ChartKind,
    y_desc: &str,
    lines: &[Line],
    dates: &[NaiveDate],
    grid: bool,
) -> Result<(), ChartError> {
    let (x_min, x_max) = date_bounds(lines, dates).ok_or(ChartError::NoData(kind.title()))?;
    let values: Vec<f64> = lines
        .iter()
        .flat_map(|l| l.segments.iter().flatten().map(|p| p.1))
        .collect();
    let (y_min, y_max) = padded_range(&values);
    let format_date = |d: &NaiveDate| d.format("%Y-%m-%d").to_string();

    let mut chart = ChartBuilder::on(root)
        .caption(kind.title(), ("sans-serif", 30.0).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(render_err("build chart"))?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc("Date")
        .y_desc(y_desc)
        .x_labels(6)
        .x_label_formatter(&format_date);
    if !grid {
        mesh.disable_mesh();
    }
    mesh.draw().map_err(render_err("draw mesh"))?;

    for (i, line) in lines.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let mut labelled = false;

        for segment in &line.segments {
            let anno = if segment.len() == 1 {
                chart
                    .draw_series(std::iter::once(Circle::new(segment[0], 3, color.filled())))
                    .map_err(render_err("draw point"))?
            } else {
                chart
                    .draw_series(LineSeries::new(segment.iter().copied(), color.stroke_width(2)))
                    .map_err(render_err("draw line"))?
            };

            if !labelled {
                anno.label(line.label.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
                labelled = true;
            }
        }
    }

    if lines.iter().any(|l| !l.segments.is_empty()) {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_err("draw legend"))?;
    }

    Ok(())
}

fn single_line(
    kind: ChartKind,
    label: &str,
    y_desc: &str,
    table: &PriceTable,
    line: Vec<Segment>,
) -> Result<RenderedChart, ChartError> {
    let lines = [Line {
        label: label.to_string(),
        segments: line,
    }];
    let dates = table.dates();
    render_png(kind, |root| {
        draw_date_lines(root, kind, y_desc, &lines, &dates, false)
    })
}

/// Close price against date
pub fn render_closing_prices(table: &PriceTable) -> Result<RenderedChart, ChartError> {
    let closes: Vec<Option<f64>> = table.closes().into_iter().map(Some).collect();
    let line = segments(&table.dates(), &closes);
    single_line(ChartKind::ClosingPrices, "Closing Prices", "Price", table, line)
}

/// Percentage change of the close; the undefined first point is left out
pub fn render_daily_returns(table: &PriceTable) -> Result<RenderedChart, ChartError> {
    let line = segments(&table.dates(), &pct_change(&table.closes()));
    single_line(ChartKind::DailyReturns, "Daily Returns", "Returns (%)", table, line)
}

pub fn render_volume(table: &PriceTable) -> Result<RenderedChart, ChartError> {
    let points = table.volume_points();
    let line = if points.is_empty() { Vec::new() } else { vec![points] };
    single_line(ChartKind::Volume, "Volume", "Volume", table, line)
}

/// Closing prices in 20 equal-width bins
pub fn render_histogram(table: &PriceTable) -> Result<RenderedChart, ChartError> {
    let kind = ChartKind::Histogram;
    if table.is_empty() {
        return Err(ChartError::NoData(kind.title()));
    }
    let hist = histogram(&table.closes(), HISTOGRAM_BINS);
    debug!("Binned {} closes into {} bins", hist.total(), HISTOGRAM_BINS);
    let x_min = hist.edges[0];
    let x_max = hist.edges[hist.edges.len() - 1];
    let y_max = hist.counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.1;

    render_png(kind, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(kind.title(), ("sans-serif", 30.0).into_font())
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)
            .map_err(render_err("build chart"))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Price")
            .y_desc("Frequency")
            .draw()
            .map_err(render_err("draw mesh"))?;

        chart
            .draw_series(hist.bins().map(|(lo, hi, count)| {
                Rectangle::new([(lo, 0.0), (hi, count as f64)], PALETTE[0].filled())
            }))
            .map_err(render_err("draw bars"))?;
        chart
            .draw_series(hist.bins().map(|(lo, hi, count)| {
                Rectangle::new([(lo, 0.0), (hi, count as f64)], BLACK.stroke_width(1))
            }))
            .map_err(render_err("draw bar edges"))?;

        Ok(())
    })
}

type TableRenderer = fn(&PriceTable) -> Result<RenderedChart, ChartError>;

const ANALYSIS_RENDERERS: [TableRenderer; 4] = [
    render_closing_prices,
    render_daily_returns,
    render_volume,
    render_histogram,
];

/// The four single-symbol charts in page order
pub fn render_analysis(table: &PriceTable) -> Result<Vec<RenderedChart>, ChartError> {
    ANALYSIS_RENDERERS.iter().map(|render| render(table)).collect()
}

/// Every symbol overlaid on one set of axes
pub fn render_comparison(
    series: &[SymbolSeries],
    chart_type: ChartType,
) -> Result<RenderedChart, ChartError> {
    let kind = ChartKind::Comparison;
    let lines = comparison_lines(series, chart_type);
    let dates: Vec<NaiveDate> = series.iter().flat_map(|s| s.points.iter().map(|p| p.0)).collect();
    render_png(kind, |root| {
        draw_date_lines(root, kind, chart_type.y_label(), &lines, &dates, true)
    })
}
