//! Functions and tools for evaluating regression fits
//!
//! # Model Fit / Regression Diagnostics
//! - [`residual_variance`]: Unbiased estimate of the variance of errors after fitting. Used for confidence bands.
//! - [`f_statistic`]: Ratio of total variance to residual variance. Larger is better.
//! - [`pearson`]: Correlation between observed and fitted values (-1 to 1).
//! - [`r_squared`]: Proportion of variance explained by the model (0 to 1).
//!
//! # Descriptive Statistics
//! - [`mean`]: Arithmetic mean of a dataset.
//! - [`stddev_and_mean`]: Standard deviation and mean of a dataset.
//!
//! # Confidence Intervals
//! - [`ConfidenceBand`]: A central estimate with lower and upper bounds.
//!
//! Critical values for the bands and for the F-test live in [`crate::critical`].
//!
//! # Examples
//!
//! ```rust
//! use rollfit::statistics::{f_statistic, pearson};
//!
//! let y = vec![1.0, 2.0, 3.0, 4.0];
//! let y_fit = vec![1.1, 1.9, 3.05, 3.95];
//!
//! let r = pearson(y.iter().copied(), y_fit.iter().copied());
//! assert!(r > 0.99);
//!
//! let f = f_statistic(y.into_iter(), y_fit.into_iter(), 2.0);
//! assert!(f > 1.0);
//! ```
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Computes the residual variance of a model's predictions.
///
/// Residual variance is the unbiased estimate of the variance of the
/// errors (σ²) after fitting a model. It scales the leverage of each point
/// into a prediction variance.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// σ² = Σ (y_i - y_fit_i)² / (n - k)
/// where
///   y_i = observed values, y_fit_i = predicted values,
///   n = number of observations, k = number of model parameters
/// ```
/// </div>
///
/// # Returns
/// The residual variance, or zero when `n == k` (no residual degrees of freedom).
///
/// # Example
/// ```rust
/// # use rollfit::statistics::residual_variance;
/// let y = vec![1.0, 2.0, 3.0];
/// let y_fit = vec![0.9, 2.1, 2.95];
/// let variance: f64 = residual_variance(y.into_iter(), y_fit.into_iter(), 2.0);
/// assert!((variance - 0.0225).abs() < 1e-12);
/// ```
pub fn residual_variance<T: Value>(
    y: impl Iterator<Item = T>,
    y_fit: impl Iterator<Item = T>,
    k: T,
) -> T {
    let mut ss_residual = T::zero();
    let mut n = T::zero();
    for (y, y_fit) in y.zip(y_fit) {
        ss_residual += Value::powi(y - y_fit, 2);
        n += T::one();
    }

    if n == k {
        return T::zero();
    }
    ss_residual / (n - k)
}

/// Computes the arithmetic mean of a sequence of values.
///
/// # Returns
/// The arithmetic mean of all elements in `data`.
/// - Returns NaN if the iterator yields no elements.
///
/// # Examples
/// ```rust
/// let values = vec![1.0, 2.0, 3.0];
/// let m = rollfit::statistics::mean(values.into_iter());
/// assert_eq!(m, 2.0);
/// ```
pub fn mean<T: Value>(data: impl Iterator<Item = T>) -> T {
    let mut sum = T::zero();
    let mut count = T::zero();
    for value in data {
        sum += value;
        count += T::one();
    }
    sum / count
}

/// Computes the standard deviation and mean of a sequence of values.
/// - Uses the population formula (divides by `N`) rather than `N-1`.
///
/// # Examples
/// ```rust
/// let values = vec![1.0, 2.0, 3.0];
/// let (s, m) = rollfit::statistics::stddev_and_mean(values.into_iter());
/// assert_eq!(m, 2.0);
/// assert_eq!(s, 0.816496580927726); // sqrt(2/3)
/// ```
pub fn stddev_and_mean<T: Value>(data: impl Iterator<Item = T>) -> (T, T) {
    let data: Vec<_> = data.collect();
    let mean = mean(data.iter().copied());
    let mut sum_sq_diff = T::zero();
    let mut count = T::zero();
    for value in data {
        sum_sq_diff += Value::powi(value - mean, 2);
        count += T::one();
    }
    let dev = (sum_sq_diff / count).sqrt();

    (dev, mean)
}

/// Computes the Pearson correlation coefficient between observed and fitted values.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// r = Σ (y_i - ȳ)(f_i - f̄) / sqrt( Σ (y_i - ȳ)² · Σ (f_i - f̄)² )
/// ```
/// </div>
///
/// # Returns
/// A value in `[-1, 1]`.
/// - Returns `0` when either series has zero variance, instead of dividing by zero.
///
/// # Example
/// ```rust
/// # use rollfit::statistics::pearson;
/// let y = vec![1.0, 2.0, 3.0];
/// assert_eq!(pearson(y.iter().copied(), vec![3.0, 2.0, 1.0].into_iter()), -1.0);
/// assert_eq!(pearson(y.into_iter(), vec![5.0, 5.0, 5.0].into_iter()), 0.0);
/// ```
pub fn pearson<T: Value>(y: impl Iterator<Item = T>, y_fit: impl Iterator<Item = T>) -> T {
    let y: Vec<T> = y.collect();
    let y_fit: Vec<T> = y_fit.collect();

    let y_mean = mean(y.iter().copied());
    let fit_mean = mean(y_fit.iter().copied());

    let mut covariance = T::zero();
    let mut var_y = T::zero();
    let mut var_fit = T::zero();
    for (&y, &y_fit) in y.iter().zip(&y_fit) {
        let dy = y - y_mean;
        let df = y_fit - fit_mean;
        covariance += dy * df;
        var_y += dy * dy;
        var_fit += df * df;
    }

    if var_y == T::zero() || var_fit == T::zero() {
        return T::zero();
    }

    let r = covariance / (var_y * var_fit).sqrt();
    nalgebra::RealField::clamp(r, -T::one(), T::one())
}

/// Computes the F-statistic of a fit: total variance over residual variance.
///
/// Large values mean the model explains much more variation than it leaves behind.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// F = (Σ (y_i - ȳ)² / (n - 1)) / (Σ (y_i - y_fit_i)² / (n - k))
/// ```
/// </div>
///
/// # Parameters
/// - `y`: Iterator over the observed values.
/// - `y_fit`: Iterator over the fitted values.
/// - `k`: Number of model parameters.
///
/// # Returns
/// The F-statistic, or NaN if `n <= k` (the caller is expected to check degrees of freedom first).
/// A perfect fit yields infinity.
pub fn f_statistic<T: Value>(
    y: impl Iterator<Item = T>,
    y_fit: impl Iterator<Item = T>,
    k: T,
) -> T {
    let y: Vec<T> = y.collect();
    let n = T::from_positive_int(y.len());
    if n <= k || n <= T::one() {
        return T::nan();
    }

    let y_mean = mean(y.iter().copied());
    let mut ss_total = T::zero();
    let mut ss_residual = T::zero();
    for (&y, y_fit) in y.iter().zip(y_fit) {
        ss_total += Value::powi(y - y_mean, 2);
        ss_residual += Value::powi(y - y_fit, 2);
    }

    let total_variance = ss_total / (n - T::one());
    let residual_variance = ss_residual / (n - k);
    total_variance / residual_variance
}

/// Calculate the R-squared value for a set of data.
///
/// R-squared is a number between 0 and 1 that tells you how well the model explains the data:
/// - `0` means the model explains none of the variation.
/// - `1` means the model explains all the variation.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// R² = 1 - (SS_res / SS_tot)
/// where
///   SS_res = Σ (y_i - y_fit_i)²
///   SS_tot = Σ (y_i - y_mean)²
/// ```
/// </div>
pub fn r_squared<T: Value>(y: impl Iterator<Item = T>, y_fit: impl Iterator<Item = T>) -> T {
    let y: Vec<T> = y.collect();
    let y_mean = mean(y.iter().copied());

    let mut ss_total = T::zero();
    let mut ss_residual = T::zero();
    for (&y, y_fit) in y.iter().zip(y_fit) {
        ss_total += Value::powi(y - y_mean, 2);
        ss_residual += Value::powi(y - y_fit, 2);
    }

    T::one() - (ss_residual / ss_total)
}

/// A confidence band around a model output.
///
/// The band contains the central estimate (`value`) and the lower and upper bounds.
/// Bands are produced by [`crate::RegressionFit`] for in-sample points and by
/// [`crate::RollingPredictor`] for forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand<T = f64> {
    pub(crate) value: T,
    pub(crate) lower: T,
    pub(crate) upper: T,
}

impl<T: Value> ConfidenceBand<T> {
    /// Creates a symmetric band `value ± half_width`.
    pub fn symmetric(value: T, half_width: T) -> Self {
        Self {
            value,
            lower: value - half_width,
            upper: value + half_width,
        }
    }

    /// Returns the central estimate.
    pub fn value(&self) -> T {
        self.value
    }

    /// Returns the lower bound of the band.
    pub fn min(&self) -> T {
        self.lower
    }

    /// Returns the upper bound of the band.
    pub fn max(&self) -> T {
        self.upper
    }

    /// Returns the width of the band (upper - lower).
    pub fn width(&self) -> T {
        self.upper - self.lower
    }

    /// True if `y` falls inside the band, bounds included.
    pub fn contains(&self, y: T) -> bool {
        self.lower <= y && y <= self.upper
    }
}

impl<T: Value> std::fmt::Display for ConfidenceBand<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (min, y, max) = (self.min(), self.value(), self.max());
        match f.precision() {
            Some(p) => write!(f, "{y:.p$} ({min:.p$}, {max:.p$})"),
            None => write!(f, "{y} ({min}, {max})"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::assert_close;

    #[test]
    fn residual_variance_basic() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let y_fit = vec![1.0, 2.0, 3.0, 6.0];
        // SS = 4, n - k = 2
        assert_eq!(residual_variance::<f64>(y.into_iter(), y_fit.into_iter(), 2.0), 2.0);
    }

    #[test]
    fn residual_variance_no_freedom() {
        let y = vec![1.0, 2.0];
        let y_fit = vec![0.0, 0.0];
        assert_eq!(residual_variance::<f64>(y.into_iter(), y_fit.into_iter(), 2.0), 0.0);
    }

    #[test]
    fn mean_basic_and_empty() {
        assert_eq!(mean(vec![2.0, 4.0, 9.0].into_iter()), 5.0);
        assert!(mean(Vec::<f64>::new().into_iter()).is_nan());
    }

    #[test]
    fn stddev_constant() {
        let (s, m) = stddev_and_mean(vec![3.0, 3.0, 3.0].into_iter());
        assert_eq!(s, 0.0);
        assert_eq!(m, 3.0);
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let up = vec![2.0, 4.0, 6.0, 8.0];
        let down = vec![8.0, 6.0, 4.0, 2.0];
        assert_close!(pearson::<f64>(y.iter().copied(), up.into_iter()), 1.0);
        assert_close!(pearson::<f64>(y.into_iter(), down.into_iter()), -1.0);
    }

    #[test]
    fn pearson_zero_variance_sentinel() {
        let y = vec![1.0, 1.0, 1.0];
        let y_fit = vec![1.0, 2.0, 3.0];
        assert_eq!(pearson::<f64>(y.iter().copied(), y_fit.iter().copied()), 0.0);
        assert_eq!(pearson::<f64>(y_fit.into_iter(), y.into_iter()), 0.0);
    }

    #[test]
    fn pearson_known_value() {
        // cov = 2, Σdx² = 2, Σdy² = 8/3 -> r = √3 / 2
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![1.0, 3.0, 3.0];
        let r = pearson::<f64>(x.into_iter(), y.into_iter());
        assert_close!(r, 3.0_f64.sqrt() / 2.0, 1e-12);
    }

    #[test]
    fn f_statistic_known_value() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let y_fit = vec![1.0, 2.0, 3.0, 6.0];
        // total variance = 5 / 3, residual variance = 4 / 2
        let f = f_statistic::<f64>(y.into_iter(), y_fit.into_iter(), 2.0);
        assert_close!(f, (5.0 / 3.0) / 2.0, 1e-12);
    }

    #[test]
    fn f_statistic_invalid_degrees_of_freedom() {
        let y = vec![1.0, 2.0];
        let y_fit = vec![1.0, 2.0];
        assert!(f_statistic::<f64>(y.into_iter(), y_fit.into_iter(), 2.0).is_nan());
    }

    #[test]
    fn f_statistic_perfect_fit_is_infinite() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let f = f_statistic::<f64>(y.clone().into_iter(), y.into_iter(), 2.0);
        assert!(f.is_infinite());
    }

    #[test]
    fn r_squared_perfect_fit() {
        let y = vec![1.0, 2.0, 3.0];
        assert_eq!(r_squared::<f64>(y.clone().into_iter(), y.into_iter()), 1.0);
    }

    #[test]
    fn confidence_band_accessors() {
        let band = ConfidenceBand::symmetric(10.0, 2.5);
        assert_eq!(band.min(), 7.5);
        assert_eq!(band.max(), 12.5);
        assert_eq!(band.width(), 5.0);
        assert!(band.contains(7.5));
        assert!(!band.contains(12.6));
        assert_eq!(format!("{band:.1}"), "10.0 (7.5, 12.5)");
    }
}
