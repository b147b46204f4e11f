//! Fare trend charts.
//!
//! Renders the (date, fare) projection of a stitched result as a
//! standalone HTML page with an inline SVG line chart. The page has no
//! external assets, so it can be written to disk and opened directly.

use std::path::Path;

use askama::Template;

use crate::stitch::StitchedResult;

const WIDTH: u32 = 720;
const HEIGHT: u32 = 320;
const PADDING: f64 = 40.0;

/// Error from rendering or writing a chart.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("template error: {0}")]
    Render(#[from] askama::Error),

    #[error("failed to write chart: {0}")]
    Io(#[from] std::io::Error),
}

/// One plotted day.
#[derive(Debug, Clone)]
pub struct ChartPoint {
    pub date: String,
    pub label: String,
    pub fare: String,
    pub x: String,
    pub y: String,
}

/// Standalone trend chart page.
#[derive(Template)]
#[template(path = "trend.html")]
pub struct TrendChartTemplate {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub points: Vec<ChartPoint>,
    /// SVG `points` attribute of the line.
    pub polyline: String,
    pub low: Option<String>,
    pub high: Option<String>,
    /// Labels of days with no fare, listed under the chart.
    pub sold_out: Vec<String>,
}

impl TrendChartTemplate {
    /// Lay out a chart for the priced days of `result`.
    ///
    /// Days are spaced evenly along x in calendar order; sold-out days keep
    /// their slot but get no point.
    pub fn new(title: impl Into<String>, result: &StitchedResult) -> Self {
        let days = result.days();
        let priced = result.fare_points();

        let low = priced.iter().map(|(_, f)| f.as_f64()).fold(f64::INFINITY, f64::min);
        let high = priced
            .iter()
            .map(|(_, f)| f.as_f64())
            .fold(f64::NEG_INFINITY, f64::max);

        let plot_w = WIDTH as f64 - 2.0 * PADDING;
        let plot_h = HEIGHT as f64 - 2.0 * PADDING;
        let step = if days.len() > 1 {
            plot_w / (days.len() - 1) as f64
        } else {
            0.0
        };

        let mut points = Vec::new();
        let mut sold_out = Vec::new();
        for (i, day) in days.iter().enumerate() {
            let Some(fare) = day.fare else {
                sold_out.push(day.label.to_string());
                continue;
            };
            let x = PADDING + step * i as f64;
            let y = if high > low {
                PADDING + plot_h * (high - fare.as_f64()) / (high - low)
            } else {
                PADDING + plot_h / 2.0
            };
            points.push(ChartPoint {
                date: day.date.to_string(),
                label: day.label.to_string(),
                fare: fare.to_string(),
                x: format!("{x:.1}"),
                y: format!("{y:.1}"),
            });
        }

        let polyline = points
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");

        let extremes = !priced.is_empty();
        Self {
            title: title.into(),
            width: WIDTH,
            height: HEIGHT,
            points,
            polyline,
            low: extremes.then(|| format!("{low:.2}")),
            high: extremes.then(|| format!("{high:.2}")),
            sold_out,
        }
    }
}

/// Render the trend chart page for a stitched result.
pub fn render_trend_chart(result: &StitchedResult, title: &str) -> Result<String, ChartError> {
    Ok(TrendChartTemplate::new(title, result).render()?)
}

/// Render the trend chart page and write it to `path`.
pub fn write_trend_chart(
    path: impl AsRef<Path>,
    result: &StitchedResult,
    title: &str,
) -> Result<(), ChartError> {
    let html = render_trend_chart(result, title)?;
    std::fs::write(path, html)?;
    Ok(())
}
