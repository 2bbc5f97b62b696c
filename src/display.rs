//! Utilities for displaying fitted models and forecast reports
//!
//! Computation never prints; this module turns already-computed results into text.
//!
//! # Key Concepts
//! - **[`Term`]**: Represents a single model term with a sign and body.
//! - **[`Sign`]**: Tracks whether a term is positive or negative.
//! - **[`format_model`]**: Renders coefficients as `y = b0 + b1x₁ + ...`.
//! - **[`Report`]**: Full text report of a fit and its rolling forecasts.
//!
//! # Helpers
//! - [`format_coefficient`]: Formats a numeric coefficient, skipping zeros.
//! - [`format_variable`]: Adds subscripts and superscript exponents to a variable name.
use std::fmt::Write;

use crate::{basis::InteractionBasis, fit::RegressionFit, value::Value, window::PredictionRecord};

pub mod unicode;

/// Default precision for formatting coefficients
pub const DEFAULT_PRECISION: usize = 2;

/// Default range of magnitudes in which scientific notation is not used
#[must_use]
pub fn default_fixed_range<T: Value>() -> Option<std::ops::Range<T>> {
    const RANGE: std::ops::Range<f64> = 1e-3..1e4;
    let s = T::try_cast(RANGE.start).ok()?;
    let e = T::try_cast(RANGE.end).ok()?;
    Some(s..e)
}

/// Represents the sign of a model term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Positive sign (`+` when displayed).
    Positive,

    /// Negative sign (`-` when displayed).
    Negative,
}

impl Sign {
    /// Determines the sign from a numeric coefficient.
    ///
    /// # Example
    /// ```
    /// # use rollfit::display::Sign;
    /// assert_eq!(Sign::from_coef(3.0), Sign::Positive);
    /// assert_eq!(Sign::from_coef(-2.0), Sign::Negative);
    /// ```
    pub fn from_coef<T: Value>(coef: T) -> Self {
        if coef.is_sign_negative() {
            Self::Negative
        } else {
            Self::Positive
        }
    }

    /// Returns the character representation of the sign.
    #[must_use]
    pub fn char(&self) -> char {
        match self {
            Sign::Positive => '+',
            Sign::Negative => '-',
        }
    }
}

/// A single term of the model for display purposes, e.g. `3.10x₁²`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// The sign of the term
    pub sign: Sign,

    /// The body of the term, without its sign
    pub body: String,
}

impl Term {
    /// Creates a new term with the given sign and body.
    #[must_use]
    pub fn new(sign: Sign, body: String) -> Self {
        Self { sign, body }
    }
}

/// Formats the magnitude of a coefficient for display in a term.
///
/// - Returns `None` if the coefficient is zero or effectively zero (≤ epsilon).
/// - Returns an empty string for a unit coefficient on a non-constant term.
/// - Formats as a decimal if the magnitude is between `1e-3` and `1e4`, in scientific notation otherwise.
///
/// # Example
/// ```
/// # use rollfit::display::format_coefficient;
/// assert_eq!(format_coefficient(0.0, false, 2), None);
/// assert_eq!(format_coefficient(-2.5, false, 2), Some("2.50".to_string()));
/// assert_eq!(format_coefficient(1.0, false, 2), Some(String::new()));
/// assert_eq!(format_coefficient(1e5, true, 2), Some("1.00e5".to_string()));
/// ```
pub fn format_coefficient<T: Value>(coef: T, constant: bool, precision: usize) -> Option<String> {
    let abs = Value::abs(coef);

    if coef.is_zero() || abs <= T::epsilon() {
        return None;
    }

    if abs.abs_sub(T::one()) <= T::epsilon() && !constant {
        return Some(String::new());
    }

    Some(unicode::float(abs, default_fixed_range(), precision))
}

/// Formats a variable name with an optional subscript and exponent.
///
/// # Behavior
/// - If `exp == 0`, returns an empty string (`""`).
/// - If `exp == 1`, no superscript is added.
///
/// # Examples
/// ```
/// # use rollfit::display::format_variable;
/// assert_eq!(format_variable("x", Some("1"), 0), "");
/// assert_eq!(format_variable("x", Some("2"), 1), "x₂");
/// assert_eq!(format_variable("x", Some("1"), 2), "x₁²");
/// ```
#[must_use]
pub fn format_variable(base: &str, subscript: Option<&str>, exp: i32) -> String {
    let lbl = unicode::subscript(subscript.unwrap_or_default());
    match exp {
        0 => String::new(),
        1 => format!("{base}{lbl}"),
        _ => {
            let sup = unicode::superscript(&exp.to_string());
            format!("{base}{lbl}{sup}")
        }
    }
}

/// Variable part of each [`InteractionBasis`] term, in coefficient order.
fn term_variables() -> [String; InteractionBasis::K] {
    [
        String::new(),
        format_variable("x", Some("1"), 1),
        format_variable("x", Some("1"), 2),
        format_variable("x", Some("2"), 1),
        format!(
            "{}{}",
            format_variable("x", Some("1"), 1),
            format_variable("x", Some("2"), 1)
        ),
    ]
}

/// Renders the terms of the model, skipping zero coefficients.
pub fn format_terms<T: Value>(coefficients: &[T], precision: usize) -> Vec<Term> {
    coefficients
        .iter()
        .zip(term_variables())
        .filter_map(|(&coef, variable)| {
            let body = format_coefficient(coef, variable.is_empty(), precision)?;
            Some(Term::new(Sign::from_coef(coef), format!("{body}{variable}")))
        })
        .collect()
}

/// Renders a coefficient vector as the equation `y = b0 + b1x₁ + b2x₁² + b3x₂ + b4x₁x₂`.
///
/// # Example
/// ```
/// # use rollfit::display::format_model;
/// let equation = format_model(&[1.5, -2.0, 0.0, 1.0, 0.25], None);
/// assert_eq!(equation, "y = 1.50 - 2.00x₁ + x₂ + 0.25x₁x₂");
/// ```
pub fn format_model<T: Value>(coefficients: &[T], precision: Option<usize>) -> String {
    let mut terms = format_terms(coefficients, precision.unwrap_or(DEFAULT_PRECISION)).into_iter();

    let mut output = String::from("y = ");
    let Some(first) = terms.next() else {
        output.push('0');
        return output;
    };

    if first.sign == Sign::Negative {
        output.push(first.sign.char());
    }
    output.push_str(&first.body);

    for term in terms {
        output.push(' ');
        output.push(term.sign.char());
        output.push(' ');
        output.push_str(&term.body);
    }

    output
}

/// Text report of a fit on the initial data and the rolling forecasts that followed.
///
/// Sections:
/// - The fitted equation, with each coefficient's standard error
/// - Diagnostics and the adequacy decision
/// - Per-step forecast errors
/// - A table of actual, fitted and forecast values with their bands
///
/// Fit rows are numbered from 1; forecast rows use their record's step.
pub struct Report<'a, T: Value = f64> {
    fit: &'a RegressionFit<T>,
    records: &'a [PredictionRecord<T>],
    precision: usize,
}

impl<'a, T: Value> Report<'a, T> {
    /// Creates a report.
    #[must_use]
    pub fn new(fit: &'a RegressionFit<T>, records: &'a [PredictionRecord<T>]) -> Self {
        Self {
            fit,
            records,
            precision: DEFAULT_PRECISION,
        }
    }

    /// Sets the number of decimals used for values in the report.
    #[must_use]
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    fn write_coefficients(&self, out: &mut impl Write) -> std::fmt::Result {
        writeln!(out, "Model: {}", format_model(self.fit.coefficients(), Some(self.precision)))?;
        let errors = self.fit.coefficient_standard_errors();
        for (j, (b, se)) in self.fit.coefficients().iter().zip(errors).enumerate() {
            writeln!(out, "  b{j} = {b:>12.4} (SE {se:.4})")?;
        }
        Ok(())
    }

    fn write_diagnostics(&self, out: &mut impl Write) -> std::fmt::Result {
        let d = self.fit.diagnostics();
        let decision = if d.adequate { "adequate" } else { "not adequate" };
        writeln!(
            out,
            "F = {:.4} (critical {:.2}, df = {}): model is {decision}",
            d.f_statistic, d.f_critical, d.degrees_of_freedom
        )?;
        writeln!(out, "Pearson r = {:.4}, R² = {:.4}", d.pearson, d.r_squared)
    }

    fn write_forecasts(&self, out: &mut impl Write) -> std::fmt::Result {
        let p = self.precision;
        for record in self.records {
            writeln!(
                out,
                "Step {}: forecast = {:.p$}, actual = {:.p$}, error = {:.p$} ({:.p$}%)",
                record.step(),
                record.predicted(),
                record.actual(),
                record.absolute_error(),
                record.relative_error(),
            )?;
        }
        Ok(())
    }

    fn write_table(&self, out: &mut impl Write) -> std::fmt::Result {
        writeln!(
            out,
            "{:>5} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10}",
            "Step", "Actual", "Fitted", "Forecast", "Lower", "Upper"
        )?;
        writeln!(out, "{}", "-".repeat(5 + 5 * 13))?;

        let fitted = self.fit.targets().iter().zip(self.fit.bands());
        for (i, (actual, band)) in fitted.enumerate() {
            writeln!(
                out,
                "{:>5} | {:>10.1} | {:>10.1} | {:>10} | {:>10.1} | {:>10.1}",
                i + 1,
                actual,
                band.value(),
                "-",
                band.min(),
                band.max()
            )?;
        }

        for record in self.records {
            writeln!(
                out,
                "{:>5} | {:>10.1} | {:>10} | {:>10.1} | {:>10.1} | {:>10.1}",
                record.step(),
                record.actual(),
                "-",
                record.predicted(),
                record.lower(),
                record.upper()
            )?;
        }
        Ok(())
    }
}

impl<T: Value> std::fmt::Display for Report<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_coefficients(f)?;
        writeln!(f)?;
        self.write_diagnostics(f)?;
        if !self.records.is_empty() {
            writeln!(f)?;
            self.write_forecasts(f)?;
        }
        writeln!(f)?;
        self.write_table(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_from_coef() {
        assert_eq!(Sign::from_coef(1.0), Sign::Positive);
        assert_eq!(Sign::from_coef(-1.0), Sign::Negative);
        assert_eq!(Sign::from_coef(0.0), Sign::Positive);
    }

    #[test]
    fn test_format_coefficient() {
        assert_eq!(format_coefficient(2.5, false, 2), Some("2.50".to_string()));
        assert_eq!(format_coefficient(-2.5, false, 2), Some("2.50".to_string()));
        assert_eq!(format_coefficient(1e-20, false, 2), None);
        assert_eq!(format_coefficient(-1.0, false, 2), Some(String::new()));
        assert_eq!(format_coefficient(1.0, true, 2), Some("1.00".to_string()));
        assert_eq!(format_coefficient(1e-5, false, 2), Some("1.00e-5".to_string()));
    }

    #[test]
    fn test_format_variable() {
        assert_eq!(format_variable("x", None, 1), "x");
        assert_eq!(format_variable("x", Some("1"), 2), "x₁²");
        assert_eq!(format_variable("x", Some("2"), 0), "");
    }

    #[test]
    fn test_format_model() {
        let equation = format_model(&[-1.0, 2.0, -0.5, 3.0, -1.0], Some(1));
        assert_eq!(equation, "y = -1.0 + 2.0x₁ - 0.5x₁² + 3.0x₂ - x₁x₂");
    }

    #[test]
    fn test_format_model_zero() {
        assert_eq!(format_model(&[0.0; 5], None), "y = 0");
    }
}
