//! # Rollfit
//! ## Quadratic regression with an interaction term, refit over a rolling window
//!
//! Given a time series of observations `(x1, x2)` (a time index such as the day number,
//! and a continuous covariate such as temperature) with a target `y`, this crate fits
//!
//! ```math
//! y = b0 + b1·x1 + b2·x1² + b3·x2 + b4·x1·x2
//! ```
//!
//! by ordinary least squares, reports confidence bands for every fitted value, and
//! produces one-step-ahead forecasts by refitting over a sliding window as new data arrives.
//!
//! ```rust
//! use rollfit::{assert_bracketed, RollingPredictor};
//!
//! // 20 days of history: (day, temperature) -> demand
//! let history: Vec<(f64, f64)> = (1..=20)
//!     .map(|day| (f64::from(day), 20.0 + 3.0 * (f64::from(day) * 0.7).sin()))
//!     .collect();
//! let demand: Vec<f64> = history
//!     .iter()
//!     .map(|&(day, temp)| 2400.0 + 90.0 * day - 1.5 * day * day + 10.0 * temp + (day * 1.9).cos() * 40.0)
//!     .collect();
//!
//! let mut predictor = RollingPredictor::new(&history, &demand).unwrap();
//! let record = predictor.step((21.0, 21.3), 4027.65).unwrap();
//!
//! assert_eq!(record.step(), 21);
//! assert_bracketed!(record.band());
//! ```
//!
//! # Core Concepts
//! - A [`RegressionFit`] is the result of one least-squares fit: coefficients, fitted
//!   values, a [`statistics::ConfidenceBand`] per observation and [`FitDiagnostics`].
//!     - The bands are `ŷ ± t · SE`, where `t` comes from a [`critical::CriticalValue`] provider.
//!     - [`critical::StepApproximation`] is the default; [`critical::StudentT`] uses a t-table.
//! - A [`RollingPredictor`] owns a fixed-size window of the most recent observations.
//!     - [`RollingPredictor::step`] fits the window, forecasts the next observation into a
//!       [`PredictionRecord`], then slides the window forward by one.
//!     - [`run_rolling_window`] does this for a whole sequence.
//!
//! # Implementation Details
//!
//! Matrices are stored in `nalgebra` types, but the normal equations are solved with
//! the crate's own Gauss-Jordan inverse ([`algebra::invert`]), which is also where
//! singular or ill-conditioned windows are detected.
//!
//! Nothing is printed. Fits and steps emit `tracing` events at `debug` level, and
//! [`display::Report`] formats results for a console.
//!
//! # Testing utilities
//!
//! Float assertions used throughout the tests are exported; see [`test`].
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]


#[cfg(feature = "plotting")]
#[cfg_attr(docsrs, doc(cfg(feature = "plotting")))]
pub mod plot;

pub mod algebra;
pub mod basis;
pub mod critical;
pub mod display;
pub mod error;
pub mod statistics;
pub mod value;

mod fit;
mod window;

pub use basis::Observation;
pub use error::{Error, Result};
pub use fit::*;
pub use window::*;

pub use nalgebra;
