//! Rolling-window refits and one-step-ahead forecasts.
//!
//! ## Design notes
//!
//! * **Storage**: a fixed-size ring buffer (`VecDeque`) of `(observation, target)` pairs.
//! * **Stepping**: fit the window, forecast the incoming observation, record, then evict
//!   the oldest pair and append the new one.
//! * **Atomicity**: every fallible part of a step runs before the window is touched, so
//!   a failed step leaves the predictor exactly as it was.
//!
//! ## Invariants
//!
//! * The window always holds exactly `window_size` pairs, oldest first.
//! * All values in the window are finite.
//! * Step indices are strictly increasing.
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    basis::{InteractionBasis, Observation},
    critical::{CriticalValue, IntervalKind, StepApproximation},
    error::{Error, Result},
    fit::RegressionFit,
    statistics::ConfidenceBand,
    value::Value,
};

/// Runs a rolling-window forecast over `new_observations`.
///
/// The window starts with the last `window_size` of the initial data. For every new
/// observation the model is refit on the window, the observation is forecast, and the
/// window slides forward by one.
///
/// # Errors
/// - Any error from [`PredictorBuilder::build`]
/// - [`Error::SizeMismatch`] if `new_observations` and `new_targets` differ in length
/// - Any error from [`RollingPredictor::step`]
///
/// # Example
/// ```rust
/// use rollfit::run_rolling_window;
///
/// let history: Vec<(f64, f64)> = (1..=12).map(|d| (f64::from(d), 20.0 + f64::from(d % 4))).collect();
/// let targets: Vec<f64> = history.iter().map(|&(d, t)| 100.0 + 3.0 * d + 2.0 * t + f64::from(d as u8 % 3)).collect();
///
/// let records = run_rolling_window(&history, &targets, &[(13.0, 22.0)], &[150.0], 10).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].step(), 13);
/// ```
pub fn run_rolling_window<T: Value, O>(
    initial_observations: &[O],
    initial_targets: &[T],
    new_observations: &[O],
    new_targets: &[T],
    window_size: usize,
) -> Result<Vec<PredictionRecord<T>>>
where
    O: Copy + Into<Observation<T>>,
{
    let mut predictor = RollingPredictor::builder()
        .window_size(window_size)
        .build(initial_observations, initial_targets)?;
    predictor.run(new_observations, new_targets)
}

/// One forecast step: the forecast band for an observation and the value actually seen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord<T = f64> {
    step: usize,
    observation: Observation<T>,
    band: ConfidenceBand<T>,
    actual: T,
}

impl<T: Value> PredictionRecord<T> {
    /// 1-based position of the forecast observation in the full series.
    pub fn step(&self) -> usize {
        self.step
    }

    /// The observation that was forecast.
    pub fn observation(&self) -> &Observation<T> {
        &self.observation
    }

    /// Forecast band; `band().value()` is the point forecast.
    pub fn band(&self) -> &ConfidenceBand<T> {
        &self.band
    }

    /// Point forecast.
    pub fn predicted(&self) -> T {
        self.band.value()
    }

    /// Lower bound of the forecast band.
    pub fn lower(&self) -> T {
        self.band.min()
    }

    /// Upper bound of the forecast band.
    pub fn upper(&self) -> T {
        self.band.max()
    }

    /// The observed target.
    pub fn actual(&self) -> T {
        self.actual
    }

    /// `actual - predicted`.
    pub fn absolute_error(&self) -> T {
        self.actual - self.predicted()
    }

    /// `|actual - predicted| / actual`, as a percentage.
    ///
    /// Infinite or NaN when `actual` is zero.
    pub fn relative_error(&self) -> T {
        Value::abs(self.absolute_error()) / self.actual * T::from_positive_int(100)
    }

    /// True if the actual value fell inside the forecast band.
    pub fn contains_actual(&self) -> bool {
        self.band.contains(self.actual)
    }
}

impl<T: Value> std::fmt::Display for PredictionRecord<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (step, band, actual) = (self.step, &self.band, self.actual);
        match f.precision() {
            Some(p) => write!(f, "#{step}: {band:.p$}, actual {actual:.p$}"),
            None => write!(f, "#{step}: {band}, actual {actual}"),
        }
    }
}

/// Configuration for a [`RollingPredictor`].
///
/// ```rust
/// use rollfit::{critical::{IntervalKind, StudentT}, RollingPredictor};
///
/// let builder = RollingPredictor::builder()
///     .window_size(12)
///     .critical(StudentT)
///     .interval(IntervalKind::Prediction);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorBuilder<C = StepApproximation> {
    window_size: usize,
    critical: C,
    interval: IntervalKind,
}

impl Default for PredictorBuilder {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            critical: StepApproximation,
            interval: IntervalKind::default(),
        }
    }
}

/// Window size used when none is configured.
pub const DEFAULT_WINDOW_SIZE: usize = 20;

impl<C: CriticalValue> PredictorBuilder<C> {
    /// Number of observations each fit uses. Defaults to 20.
    ///
    /// Must exceed the 5 model coefficients.
    #[must_use]
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Source of the critical value used for bands. Defaults to [`StepApproximation`].
    pub fn critical<C2: CriticalValue>(self, critical: C2) -> PredictorBuilder<C2> {
        PredictorBuilder {
            window_size: self.window_size,
            critical,
            interval: self.interval,
        }
    }

    /// Which band forecasts carry. Defaults to [`IntervalKind::Confidence`].
    #[must_use]
    pub fn interval(mut self, interval: IntervalKind) -> Self {
        self.interval = interval;
        self
    }

    /// Builds the predictor from the initial history.
    ///
    /// If more than `window_size` initial pairs are given, only the most recent are kept.
    /// Step indices continue from the full length of the history.
    ///
    /// # Errors
    /// - [`Error::InvalidWindow`] if `window_size <= 5`
    /// - [`Error::SizeMismatch`] if the observations and targets differ in length
    /// - [`Error::WindowUnderfilled`] if fewer than `window_size` pairs are given
    /// - [`Error::NonFinite`] if the retained history contains NaN or infinity
    pub fn build<T: Value, O>(
        self,
        initial_observations: &[O],
        initial_targets: &[T],
    ) -> Result<RollingPredictor<T, C>>
    where
        O: Copy + Into<Observation<T>>,
    {
        let minimum = InteractionBasis::K + 1;
        if self.window_size < minimum {
            return Err(Error::InvalidWindow {
                window: self.window_size,
                minimum,
            });
        }

        if initial_observations.len() != initial_targets.len() {
            return Err(Error::SizeMismatch {
                expected: initial_observations.len(),
                found: initial_targets.len(),
                context: "initial observations and targets",
            });
        }

        let available = initial_observations.len();
        if available < self.window_size {
            return Err(Error::WindowUnderfilled {
                window: self.window_size,
                available,
            });
        }

        let skip = available - self.window_size;
        let mut window = VecDeque::with_capacity(self.window_size);
        for (&observation, &target) in initial_observations.iter().zip(initial_targets).skip(skip) {
            let observation: Observation<T> = observation.into();
            if !observation.is_finite() {
                return Err(Error::NonFinite("initial observations"));
            }
            if !target.is_real() {
                return Err(Error::NonFinite("initial targets"));
            }
            window.push_back((observation, target));
        }

        Ok(RollingPredictor {
            window,
            window_size: self.window_size,
            critical: self.critical,
            interval: self.interval,
            position: available,
        })
    }
}

/// Refits the model over a sliding window and forecasts one step ahead.
///
/// The window is private; callers can only read it through [`RollingPredictor::window`].
/// [`RollingPredictor::step`] takes `&mut self`, so steps on one predictor are strictly
/// sequential.
#[derive(Debug, Clone)]
pub struct RollingPredictor<T: Value = f64, C = StepApproximation> {
    window: VecDeque<(Observation<T>, T)>,
    window_size: usize,
    critical: C,
    interval: IntervalKind,
    position: usize,
}

impl<T: Value> RollingPredictor<T> {
    /// Creates a predictor with the default configuration (window of 20).
    ///
    /// # Errors
    /// See [`PredictorBuilder::build`].
    pub fn new<O>(initial_observations: &[O], initial_targets: &[T]) -> Result<Self>
    where
        O: Copy + Into<Observation<T>>,
    {
        PredictorBuilder::default().build(initial_observations, initial_targets)
    }
}

impl RollingPredictor {
    /// Starts configuring a predictor.
    #[must_use]
    pub fn builder() -> PredictorBuilder {
        PredictorBuilder::default()
    }
}

impl<T: Value, C: CriticalValue> RollingPredictor<T, C> {
    /// The current window, oldest pair first.
    pub fn window(&self) -> impl ExactSizeIterator<Item = (Observation<T>, T)> + '_ {
        self.window.iter().copied()
    }

    /// Number of pairs in every fit.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of observations seen so far, history included.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Which band forecasts carry.
    pub fn interval(&self) -> IntervalKind {
        self.interval
    }

    /// Fits the model to the current window.
    ///
    /// # Errors
    /// Returns [`Error::SingularMatrix`] if the window is degenerate.
    pub fn fit(&self) -> Result<RegressionFit<T>> {
        let (observations, targets): (Vec<Observation<T>>, Vec<T>) =
            self.window.iter().copied().unzip();
        RegressionFit::with_critical(&observations, &targets, &self.critical)
    }

    /// Forecasts an observation from the current window, without sliding.
    ///
    /// # Errors
    /// - Any error from [`RollingPredictor::fit`]
    /// - [`Error::NonFinite`] if the observation contains NaN or infinity
    pub fn forecast(&self, observation: impl Into<Observation<T>>) -> Result<ConfidenceBand<T>> {
        self.fit()?.forecast(&observation.into(), self.interval)
    }

    /// Forecasts `observation`, records it against `actual`, then slides the window.
    ///
    /// The window's single fit supplies both the coefficients and the `(XᵀX)⁻¹` used for
    /// the forecast's standard error.
    ///
    /// # Errors
    /// - [`Error::NonFinite`] if `observation` or `actual` is NaN or infinite
    /// - [`Error::SingularMatrix`] if the window is degenerate
    ///
    /// On error the window and position are unchanged.
    pub fn step(
        &mut self,
        observation: impl Into<Observation<T>>,
        actual: T,
    ) -> Result<PredictionRecord<T>> {
        let observation = observation.into();
        if !actual.is_real() {
            return Err(Error::NonFinite("actual"));
        }

        let band = self.fit()?.forecast(&observation, self.interval)?;
        let record = PredictionRecord {
            step: self.position + 1,
            observation,
            band,
            actual,
        };

        tracing::debug!(
            step = record.step,
            predicted = record.predicted().as_f64(),
            lower = record.lower().as_f64(),
            upper = record.upper().as_f64(),
            actual = actual.as_f64(),
            "forecast step"
        );

        self.window.pop_front();
        self.window.push_back((observation, actual));
        self.position += 1;

        Ok(record)
    }

    /// Steps through every pair in order, collecting the records.
    ///
    /// # Errors
    /// - [`Error::SizeMismatch`] if the slices differ in length; nothing is stepped
    /// - The first error from [`RollingPredictor::step`]; earlier steps stay applied
    pub fn run<O>(&mut self, observations: &[O], actuals: &[T]) -> Result<Vec<PredictionRecord<T>>>
    where
        O: Copy + Into<Observation<T>>,
    {
        if observations.len() != actuals.len() {
            return Err(Error::SizeMismatch {
                expected: observations.len(),
                found: actuals.len(),
                context: "new observations and targets",
            });
        }

        observations
            .iter()
            .zip(actuals)
            .map(|(&observation, &actual)| self.step(observation, actual))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    use super::*;
    use crate::{assert_bracketed, assert_close, critical::StudentT};

    fn series(n: usize, seed: u64) -> (Vec<Observation>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 25.0).unwrap();
        (1..=n)
            .map(|day| {
                let x1 = day as f64;
                let x2 = 22.0 + 4.0 * (x1 * 0.9).sin();
                let y = 2500.0 + 90.0 * x1 - 1.5 * x1 * x1 + 12.0 * x2 + 0.4 * x1 * x2;
                (Observation::new(x1, x2), y + noise.sample(&mut rng))
            })
            .unzip()
    }

    #[test]
    fn test_window_invariant() {
        let (observations, targets) = series(30, 1);
        let mut predictor = RollingPredictor::new(&observations[..20], &targets[..20]).unwrap();
        assert_eq!(predictor.window().len(), 20);

        for (i, (&observation, &actual)) in observations[20..].iter().zip(&targets[20..]).enumerate() {
            let oldest_next = predictor.window().nth(1).unwrap();
            predictor.step(observation, actual).unwrap();

            assert_eq!(predictor.window().len(), 20);
            assert_eq!(predictor.window().last(), Some((observation, actual)));
            assert_eq!(predictor.window().next(), Some(oldest_next));
            assert_eq!(predictor.position(), 21 + i);
        }

        let expected: Vec<_> = observations[10..].iter().copied().zip(targets[10..].iter().copied()).collect();
        assert_eq!(predictor.window().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_records_bracket_and_order() {
        let (observations, targets) = series(32, 2);
        let records = run_rolling_window(
            &observations[..20],
            &targets[..20],
            &observations[20..],
            &targets[20..],
            DEFAULT_WINDOW_SIZE,
        )
        .unwrap();

        assert_eq!(records.len(), 12);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.step(), 21 + i);
            assert_eq!(record.actual(), targets[20 + i]);
            assert_eq!(record.observation(), &observations[20 + i]);
            assert_bracketed!(record.band());
        }
    }

    #[test]
    fn test_step_uses_window_fit() {
        let (observations, targets) = series(24, 3);
        let mut predictor = RollingPredictor::builder()
            .window_size(15)
            .build(&observations[..20], &targets[..20])
            .unwrap();

        let fit = predictor.fit().unwrap();
        assert_eq!(fit.observations(), &observations[5..20]);

        let expected = fit.forecast(&observations[20], IntervalKind::Confidence).unwrap();
        let peeked = predictor.forecast(observations[20]).unwrap();
        let record = predictor.step(observations[20], targets[20]).unwrap();

        assert_eq!(peeked, expected);
        assert_eq!(record.band(), &expected);
        assert_eq!(record.step(), 21);
    }

    #[test]
    fn test_forecast_does_not_slide() {
        let (observations, targets) = series(21, 4);
        let predictor = RollingPredictor::new(&observations[..20], &targets[..20]).unwrap();
        let before: Vec<_> = predictor.window().collect();
        predictor.forecast(observations[20]).unwrap();
        assert_eq!(predictor.window().collect::<Vec<_>>(), before);
        assert_eq!(predictor.position(), 20);
    }

    #[test]
    fn test_prediction_interval_is_wider() {
        let (observations, targets) = series(21, 5);
        let narrow = RollingPredictor::new(&observations[..20], &targets[..20]).unwrap();
        let wide = RollingPredictor::builder()
            .interval(IntervalKind::Prediction)
            .build(&observations[..20], &targets[..20])
            .unwrap();

        let narrow = narrow.forecast(observations[20]).unwrap();
        let wide = wide.forecast(observations[20]).unwrap();
        assert_close!(narrow.value(), wide.value());
        assert!(wide.width() > narrow.width());
    }

    #[test]
    fn test_student_t_provider() {
        let (observations, targets) = series(20, 6);
        let predictor = RollingPredictor::builder()
            .critical(StudentT)
            .build(&observations, &targets)
            .unwrap();
        assert_eq!(predictor.fit().unwrap().critical_value(), 2.131);
    }

    #[test]
    fn test_failed_step_is_atomic() {
        let (observations, targets) = series(21, 7);
        let mut predictor = RollingPredictor::new(&observations[..20], &targets[..20]).unwrap();
        let before: Vec<_> = predictor.window().collect();

        assert_eq!(
            predictor.step(observations[20], f64::NAN).unwrap_err(),
            Error::NonFinite("actual")
        );
        assert_eq!(
            predictor.step(Observation::new(21.0, f64::INFINITY), 1.0).unwrap_err(),
            Error::NonFinite("forecast observation")
        );
        assert_eq!(predictor.window().collect::<Vec<_>>(), before);
        assert_eq!(predictor.position(), 20);
    }

    #[test]
    fn test_builder_validation() {
        let (observations, targets) = series(20, 8);

        assert_eq!(
            RollingPredictor::builder()
                .window_size(5)
                .build(&observations, &targets)
                .unwrap_err(),
            Error::InvalidWindow { window: 5, minimum: 6 }
        );
        assert_eq!(
            RollingPredictor::builder()
                .window_size(25)
                .build(&observations, &targets)
                .unwrap_err(),
            Error::WindowUnderfilled { window: 25, available: 20 }
        );
        assert!(matches!(
            RollingPredictor::new(&observations, &targets[..19]),
            Err(Error::SizeMismatch { .. })
        ));

        let mut bad = targets.clone();
        bad[19] = f64::NAN;
        assert_eq!(
            RollingPredictor::new(&observations, &bad).unwrap_err(),
            Error::NonFinite("initial targets")
        );
    }

    #[test]
    fn test_run_length_mismatch() {
        let (observations, targets) = series(22, 9);
        let mut predictor = RollingPredictor::new(&observations[..20], &targets[..20]).unwrap();
        assert!(matches!(
            predictor.run(&observations[20..], &targets[20..21]),
            Err(Error::SizeMismatch { .. })
        ));
        assert_eq!(predictor.position(), 20);
    }

    #[test]
    fn test_record_errors() {
        let record = PredictionRecord {
            step: 21,
            observation: Observation::new(21.0, 21.3),
            band: ConfidenceBand::symmetric(4000.0, 100.0),
            actual: 4040.0,
        };
        assert_eq!(record.absolute_error(), 40.0);
        assert_close!(record.relative_error(), 40.0 / 4040.0 * 100.0, 1e-12);
        assert!(record.contains_actual());
        assert_eq!(format!("{record:.1}"), "#21: 4000.0 (3900.0, 4100.0), actual 4040.0");
    }
}
