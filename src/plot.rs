//! Plots of a fit and its rolling forecasts
//!
//! Everything is coerced to `f64` for plotting purposes. Output is an SVG file drawn with
//! [`plotters`]:
//! - Observed targets as a black line
//! - Fitted values as a blue line over a shaded confidence band
//! - Each forecast as a red error bar from its lower to its upper bound
//!
//! Requires the `plotting` feature.
use std::{ops::Range, path::Path};

use plotters::prelude::*;

use crate::{fit::RegressionFit, value::Value, window::PredictionRecord};

/// Error occurring during plotting
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    /// Error drawing the plot
    #[error("Error drawing plot: {0}")]
    Draw(String),

    /// Neither the fit nor the forecasts have a finite point
    #[error("Nothing to plot")]
    Empty,
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        Self::Draw(e.to_string())
    }
}

/// Size of the output image in pixels when none is given
pub const DEFAULT_SIZE: (u32, u32) = (1024, 640);

#[derive(Debug, Clone, Copy)]
struct Row {
    x: f64,
    actual: f64,
    value: f64,
    lower: f64,
    upper: f64,
}

/// Draws a fit and the forecasts that followed it into an SVG file at `path`.
///
/// The x axis is each observation's `x1`.
///
/// # Errors
/// - [`PlotError::Empty`] if there is nothing finite to draw
/// - [`PlotError::Draw`] if the file cannot be written
pub fn plot_forecasts<T: Value>(
    path: impl AsRef<Path>,
    title: &str,
    fit: &RegressionFit<T>,
    records: &[PredictionRecord<T>],
    size: (u32, u32),
) -> Result<(), PlotError> {
    let fitted: Vec<Row> = fit
        .observations()
        .iter()
        .zip(fit.targets())
        .zip(fit.bands())
        .map(|((o, y), band)| Row {
            x: o.x1.as_f64(),
            actual: y.as_f64(),
            value: band.value().as_f64(),
            lower: band.min().as_f64(),
            upper: band.max().as_f64(),
        })
        .collect();

    let forecasts: Vec<Row> = records
        .iter()
        .map(|r| Row {
            x: r.observation().x1.as_f64(),
            actual: r.actual().as_f64(),
            value: r.predicted().as_f64(),
            lower: r.lower().as_f64(),
            upper: r.upper().as_f64(),
        })
        .collect();

    let rows = || fitted.iter().chain(&forecasts);
    let x_range = padded_range(rows().map(|r| r.x)).ok_or(PlotError::Empty)?;
    let y_range = padded_range(rows().flat_map(|r| [r.actual, r.lower, r.upper]))
        .ok_or(PlotError::Empty)?;

    let root = SVGBackend::new(path.as_ref(), size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;
    chart.configure_mesh().x_desc("x₁").y_desc("y").draw()?;

    //
    // Fit band, as one polygon: upper edge forwards, lower edge back
    let band: Vec<(f64, f64)> = fitted
        .iter()
        .map(|r| (r.x, r.upper))
        .chain(fitted.iter().rev().map(|r| (r.x, r.lower)))
        .collect();
    let band_color = BLUE.mix(0.2);
    chart
        .draw_series(std::iter::once(Polygon::new(band, band_color)))?
        .label("Fit band")
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], band_color.filled()));

    chart
        .draw_series(LineSeries::new(
            fitted.iter().map(|r| (r.x, r.value)),
            BLUE.stroke_width(2),
        ))?
        .label(fit.equation())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(rows().map(|r| (r.x, r.actual)), &BLACK))?
        .label("Observed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

    chart
        .draw_series(
            forecasts
                .iter()
                .map(|r| ErrorBar::new_vertical(r.x, r.lower, r.value, r.upper, RED.filled(), 8)),
        )?
        .label("Forecast")
        .legend(|(x, y)| PathElement::new(vec![(x, y - 5), (x, y + 5)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Range over the finite values, widened by 5% on each side.
fn padded_range(values: impl Iterator<Item = f64>) -> Option<Range<f64>> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })?;

    let pad = ((max - min) * 0.05).max(1.0);
    Some(min - pad..max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        let range = padded_range([0.0, 100.0, f64::NAN].into_iter()).unwrap();
        assert_eq!(range, -5.0..105.0);
        assert_eq!(padded_range([3.0].into_iter()), Some(2.0..4.0));
        assert!(padded_range(std::iter::empty()).is_none());
    }
}
