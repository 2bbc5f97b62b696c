//! Least-squares fitting of the interaction model via the normal equations.
//!
//! [`RegressionFit`] holds everything a fit produces: coefficients, fitted values,
//! per-observation confidence bands and diagnostics. It also keeps the inverse moment
//! matrix `(XᵀX)⁻¹` and the residual variance, so forecasts for new observations
//! need no second inversion.
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::{
    algebra,
    basis::{self, InteractionBasis, Observation},
    critical::{f_critical_05, CriticalValue, IntervalKind, StepApproximation},
    error::{Error, Result},
    statistics::{self, ConfidenceBand},
    value::Value,
};

/// Fits the interaction model to `observations` and `targets` using [`StepApproximation`].
///
/// Shorthand for [`RegressionFit::new`].
///
/// # Errors
/// See [`RegressionFit::with_critical`].
pub fn fit<T: Value, O>(observations: &[O], targets: &[T]) -> Result<RegressionFit<T>>
where
    O: Copy + Into<Observation<T>>,
{
    RegressionFit::new(observations, targets)
}

/// Goodness-of-fit summary for one regression.
///
/// Can be serialized to JSON or other formats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics<T = f64> {
    /// Total variance over residual variance, see [`statistics::f_statistic`]
    pub f_statistic: T,

    /// 5% critical value of F(k - 1, N - k)
    pub f_critical: T,

    /// True if `f_statistic` exceeds `f_critical`
    pub adequate: bool,

    /// Correlation between targets and fitted values
    pub pearson: T,

    /// Proportion of variance explained
    pub r_squared: T,

    /// Unbiased residual variance, `Σ(y - ŷ)² / (N - k)`
    pub residual_variance: T,

    /// Residual degrees of freedom, `N - k`
    pub degrees_of_freedom: usize,
}

/// A fitted `y = b0 + b1·x1 + b2·x1² + b3·x2 + b4·x1·x2` model.
///
/// # Example
/// ```rust
/// use rollfit::RegressionFit;
///
/// let observations: Vec<(f64, f64)> = (1..=10)
///     .map(|day| (f64::from(day), 20.0 + f64::from(day % 3)))
///     .collect();
/// let targets: Vec<f64> = observations
///     .iter()
///     .map(|&(x1, x2)| 1.0 + 2.0 * x1 + 0.5 * x1 * x1 + 3.0 * x2 + 0.1 * x1 * x2)
///     .collect();
///
/// let fit = RegressionFit::new(&observations, &targets).unwrap();
/// assert!((fit.coefficients()[2] - 0.5).abs() < 1e-6);
/// assert_eq!(fit.degrees_of_freedom(), 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionFit<T: Value = f64> {
    observations: Vec<Observation<T>>,
    targets: Vec<T>,

    coefficients: DVector<T>,
    fitted: Vec<T>,
    bands: Vec<ConfidenceBand<T>>,

    moment_inverse: DMatrix<T>,
    residual_variance: T,
    critical_value: T,
    diagnostics: FitDiagnostics<T>,
}

impl<T: Value> RegressionFit<T> {
    /// Number of model coefficients.
    pub const K: usize = InteractionBasis::K;

    /// Fits the model with the default [`StepApproximation`] critical value.
    ///
    /// # Errors
    /// See [`RegressionFit::with_critical`].
    pub fn new<O>(observations: &[O], targets: &[T]) -> Result<Self>
    where
        O: Copy + Into<Observation<T>>,
    {
        Self::with_critical(observations, targets, &StepApproximation)
    }

    /// Fits the model, scaling bands with the given critical value provider.
    ///
    /// <div class="warning">
    ///
    /// **Technical Details**
    ///
    /// ```math
    /// X  = augment(observations)            (N×5)
    /// G  = (XᵀX)⁻¹                           (5×5)
    /// B  = G · XᵀY
    /// Ŷ  = X · B
    /// σ² = Σ (Y - Ŷ)² / (N - 5)
    /// s_i = x_iᵀ G x_i                       (leverage of row i)
    /// band_i = Ŷ_i ± t(N - 5) · sqrt(s_i · σ²)
    /// ```
    /// </div>
    ///
    /// # Errors
    /// - [`Error::SizeMismatch`] if `observations` and `targets` differ in length
    /// - [`Error::InsufficientData`] unless there are more than 5 observations
    /// - [`Error::NonFinite`] if any input is NaN or infinite
    /// - [`Error::SingularMatrix`] if `XᵀX` cannot be inverted
    /// - [`Error::CastFailed`] if the critical value cannot be represented as `T`
    pub fn with_critical<O>(
        observations: &[O],
        targets: &[T],
        critical: &impl CriticalValue,
    ) -> Result<Self>
    where
        O: Copy + Into<Observation<T>>,
    {
        let n = observations.len();
        if n != targets.len() {
            return Err(Error::SizeMismatch {
                expected: n,
                found: targets.len(),
                context: "observations and targets",
            });
        }

        if n <= Self::K {
            return Err(Error::InsufficientData { n, k: Self::K });
        }

        let observations: Vec<Observation<T>> = observations.iter().map(|&o| o.into()).collect();
        if !observations.iter().all(Observation::is_finite) {
            return Err(Error::NonFinite("observations"));
        }
        if !targets.iter().all(|y| y.is_real()) {
            return Err(Error::NonFinite("targets"));
        }

        let design = basis::augment(&observations);
        let design_t = algebra::transpose(&design);
        let moments = algebra::multiply(&design_t, &design)?;
        let moment_inverse = algebra::invert(&moments)?;

        let y = DVector::from_column_slice(targets);
        let xty = algebra::multiply_vector(&design_t, &y)?;
        let coefficients = algebra::multiply_vector(&moment_inverse, &xty)?;
        let fitted = algebra::multiply_vector(&design, &coefficients)?;

        let k = T::from_positive_int(Self::K);
        let degrees_of_freedom = n - Self::K;
        let residual_variance =
            statistics::residual_variance(targets.iter().copied(), fitted.iter().copied(), k);
        let critical_value = T::try_cast(critical.critical_value(degrees_of_freedom))?;

        let mut bands = Vec::with_capacity(n);
        for (observation, &value) in observations.iter().zip(fitted.iter()) {
            let row = InteractionBasis::row(observation);
            let leverage = algebra::quadratic_form(&moment_inverse, &row)?;
            let se = standard_error(leverage, residual_variance);
            bands.push(ConfidenceBand::symmetric(value, critical_value * se));
        }

        let f_statistic =
            statistics::f_statistic(targets.iter().copied(), fitted.iter().copied(), k);
        let f_critical = T::try_cast(f_critical_05(Self::K - 1, degrees_of_freedom))?;
        let diagnostics = FitDiagnostics {
            f_statistic,
            f_critical,
            adequate: f_statistic > f_critical,
            pearson: statistics::pearson(targets.iter().copied(), fitted.iter().copied()),
            r_squared: statistics::r_squared(targets.iter().copied(), fitted.iter().copied()),
            residual_variance,
            degrees_of_freedom,
        };

        tracing::debug!(
            n,
            df = degrees_of_freedom,
            f_statistic = diagnostics.f_statistic.as_f64(),
            f_critical = diagnostics.f_critical.as_f64(),
            pearson = diagnostics.pearson.as_f64(),
            adequate = diagnostics.adequate,
            "fitted regression"
        );

        Ok(Self {
            observations,
            targets: targets.to_vec(),
            coefficients,
            fitted: fitted.iter().copied().collect(),
            bands,
            moment_inverse,
            residual_variance,
            critical_value,
            diagnostics,
        })
    }

    /// Coefficients `[b0, b1, b2, b3, b4]`, in [`InteractionBasis`] order.
    pub fn coefficients(&self) -> &[T] {
        self.coefficients.as_slice()
    }

    /// Fitted value for each input observation, in input order.
    pub fn fitted(&self) -> &[T] {
        &self.fitted
    }

    /// Confidence band for each input observation, in input order.
    pub fn bands(&self) -> &[ConfidenceBand<T>] {
        &self.bands
    }

    /// The observations the model was fitted to.
    pub fn observations(&self) -> &[Observation<T>] {
        &self.observations
    }

    /// The targets the model was fitted to.
    pub fn targets(&self) -> &[T] {
        &self.targets
    }

    /// Number of observations used in the fit.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always false; a fit needs more than [`Self::K`] observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Residuals `y - ŷ` for each observation.
    pub fn residuals(&self) -> Vec<T> {
        self.targets
            .iter()
            .zip(&self.fitted)
            .map(|(&y, &y_fit)| y - y_fit)
            .collect()
    }

    /// Unbiased residual variance `σ²`.
    pub fn residual_variance(&self) -> T {
        self.residual_variance
    }

    /// Residual degrees of freedom, `N - 5`.
    pub fn degrees_of_freedom(&self) -> usize {
        self.diagnostics.degrees_of_freedom
    }

    /// The critical value `t` used to scale standard errors into bands.
    pub fn critical_value(&self) -> T {
        self.critical_value
    }

    /// The inverse moment matrix `(XᵀX)⁻¹`.
    pub fn moment_inverse(&self) -> &DMatrix<T> {
        &self.moment_inverse
    }

    /// Goodness-of-fit diagnostics.
    pub fn diagnostics(&self) -> &FitDiagnostics<T> {
        &self.diagnostics
    }

    /// Leverage `xᵀ(XᵀX)⁻¹x` of an observation under this fit.
    ///
    /// # Errors
    /// Returns [`Error::SizeMismatch`] only if the moment matrix is malformed.
    pub fn leverage(&self, observation: &Observation<T>) -> Result<T> {
        algebra::quadratic_form(&self.moment_inverse, &InteractionBasis::row(observation))
    }

    /// Point estimate of the model at an observation.
    pub fn predict(&self, observation: &Observation<T>) -> T {
        InteractionBasis::evaluate(self.coefficients(), observation)
    }

    /// Point estimate and band for an observation that need not be part of the fit.
    ///
    /// Reuses this fit's `(XᵀX)⁻¹` and `σ²`; nothing is re-inverted.
    ///
    /// # Errors
    /// Returns [`Error::NonFinite`] if the observation contains NaN or infinity.
    pub fn forecast(
        &self,
        observation: &Observation<T>,
        kind: IntervalKind,
    ) -> Result<ConfidenceBand<T>> {
        if !observation.is_finite() {
            return Err(Error::NonFinite("forecast observation"));
        }

        let value = self.predict(observation);
        let leverage = kind.adjust(self.leverage(observation)?);
        let se = standard_error(leverage, self.residual_variance);
        Ok(ConfidenceBand::symmetric(value, self.critical_value * se))
    }

    /// Standard error of each coefficient, `sqrt(G_jj · σ²)`.
    pub fn coefficient_standard_errors(&self) -> Vec<T> {
        self.moment_inverse
            .diagonal()
            .iter()
            .map(|&g| standard_error(g, self.residual_variance))
            .collect()
    }

    /// Confidence interval of each coefficient, `b_j ± t · SE_j`.
    pub fn coefficient_intervals(&self) -> Vec<ConfidenceBand<T>> {
        self.coefficients
            .iter()
            .zip(self.coefficient_standard_errors())
            .map(|(&b, se)| ConfidenceBand::symmetric(b, self.critical_value * se))
            .collect()
    }

    /// The fitted equation, e.g. `y = 1.2 + 3.4x₁ - 0.5x₁² + 2x₂ + 0.1x₁x₂`.
    pub fn equation(&self) -> String {
        crate::display::format_model(self.coefficients(), None)
    }
}

impl<T: Value> std::fmt::Display for RegressionFit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.equation())
    }
}

/// `sqrt(s · σ²)`, with round-off negatives in `s` clamped to zero.
fn standard_error<T: Value>(leverage: T, residual_variance: T) -> T {
    (nalgebra::RealField::max(leverage, T::zero()) * residual_variance).sqrt()
}
