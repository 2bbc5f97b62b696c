//! Critical values for confidence bands and the F-test.
//!
//! The width of every band is `t · SE`, where `t` comes from a [`CriticalValue`]
//! provider evaluated at the fit's residual degrees of freedom.
//!
//! - [`StepApproximation`] is the default: a four-bucket step function that coarsely
//!   approximates the two-sided 95% critical value of a t-distribution.
//! - [`StudentT`] looks the value up in a two-sided 95% t-table, falling back to the
//!   normal quantile beyond 30 degrees of freedom.
//!
//! [`f_critical_05`] gives the 5% critical value of the F-distribution used to judge
//! whether a fit is adequate.
use serde::{Deserialize, Serialize};

/// Source of the two-sided critical value used to scale standard errors into bands.
///
/// Implement this to swap in a different approximation:
/// ```rust
/// use rollfit::critical::CriticalValue;
///
/// struct Fixed(f64);
/// impl CriticalValue for Fixed {
///     fn critical_value(&self, _df: usize) -> f64 {
///         self.0
///     }
/// }
///
/// assert_eq!(Fixed(2.0).critical_value(12), 2.0);
/// ```
pub trait CriticalValue {
    /// Returns the critical value for `df` residual degrees of freedom.
    fn critical_value(&self, df: usize) -> f64;
}

/// Coarse step-function approximation of the two-sided 95% t critical value.
///
/// | df      | value |
/// |---------|-------|
/// | > 30    | 2.04  |
/// | 21..=30 | 2.09  |
/// | 11..=20 | 2.23  |
/// | ≤ 10    | 2.35  |
///
/// This is an approximation, not a distribution evaluation. It overstates the width
/// at most degrees of freedom; use [`StudentT`] for table values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepApproximation;
impl CriticalValue for StepApproximation {
    fn critical_value(&self, df: usize) -> f64 {
        critical_value_95(df)
    }
}

/// The step function behind [`StepApproximation`].
///
/// # Example
/// ```rust
/// # use rollfit::critical::critical_value_95;
/// assert_eq!(critical_value_95(15), 2.23);
/// assert_eq!(critical_value_95(31), 2.04);
/// ```
#[must_use]
pub fn critical_value_95(df: usize) -> f64 {
    match df {
        31.. => 2.04,
        21..=30 => 2.09,
        11..=20 => 2.23,
        _ => 2.35,
    }
}

/// Two-sided 95% Student-t critical values.
///
/// - `df` 1 to 30 are read from a table
/// - Larger `df` use the normal quantile `1.96`
/// - `df == 0` yields infinity, since no band can be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudentT;
impl StudentT {
    #[rustfmt::skip]
    const T_TABLE: &[f64] = &[
        12.71,  4.303,  3.182,  2.776,  2.571,
        2.447,  2.365,  2.306,  2.262,  2.228,
        2.201,  2.179,  2.16,   2.145,  2.131,
        2.12,   2.11,   2.101,  2.093,  2.086,
        2.08,   2.074,  2.069,  2.064,  2.06,
        2.056,  2.052,  2.048,  2.045,  2.042,
    ];

    const Z_95: f64 = 1.96;
}

impl CriticalValue for StudentT {
    fn critical_value(&self, df: usize) -> f64 {
        match df {
            0 => f64::INFINITY,
            df => Self::T_TABLE.get(df - 1).copied().unwrap_or(Self::Z_95),
        }
    }
}

/// Which variance a band describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntervalKind {
    /// Band for the mean response at a point: leverage `s = xᵀ(XᵀX)⁻¹x`
    #[default]
    Confidence,

    /// Band for a single new observation: leverage `1 + s`.
    ///
    /// Wider than [`IntervalKind::Confidence`] because it adds the noise of the observation itself.
    Prediction,
}

impl IntervalKind {
    /// Applies the interval's adjustment to a raw leverage term.
    #[must_use]
    pub fn adjust<T: crate::value::Value>(self, leverage: T) -> T {
        match self {
            Self::Confidence => leverage,
            Self::Prediction => T::one() + leverage,
        }
    }
}

impl std::str::FromStr for IntervalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confidence" => Ok(Self::Confidence),
            "prediction" => Ok(Self::Prediction),
            other => Err(format!("Unknown interval kind: {other}")),
        }
    }
}

/// Denominator degrees of freedom covered by [`F_TABLE_05`].
const F_TABLE_DF2: [usize; 8] = [1, 2, 3, 4, 5, 10, 20, 30];

/// 5% critical values of F(df1, df2); rows are df1 = 1..=5.
#[rustfmt::skip]
const F_TABLE_05: [[f64; 8]; 5] = [
    /*  1      2      3      4     5     10    20    30 */
    [161.4, 18.51, 10.13, 7.71, 6.61, 4.96, 4.35, 4.17],
    [199.5, 19.00,  9.55, 6.94, 5.79, 4.10, 3.49, 3.32],
    [215.7, 19.16,  9.28, 6.59, 5.41, 3.71, 3.10, 2.92],
    [224.6, 19.25,  9.12, 6.39, 5.19, 3.48, 2.87, 2.69],
    [230.2, 19.30,  9.01, 6.26, 5.05, 3.33, 2.71, 2.53],
];

/// Used when `df1` falls outside the table.
const F_FALLBACK: f64 = 3.0;

/// Returns the 5% critical value of the F-distribution with `(df1, df2)` degrees of freedom.
///
/// - `df1` must be in `1..=5`; anything else returns `3.0`
/// - `df2` between table columns is linearly interpolated
/// - `df2` beyond 30 uses the 30 column, and `df2 == 0` returns infinity
///
/// Untabulated `df2` is interpolated rather than mapped to the flat `3.0` fallback, so the
/// adequacy decision for a 20-observation fit (`df2 = 15`) compares against `3.175`, not `3.0`.
/// The interpolated value sits closer to the exact quantile (about `3.06`). Only an
/// out-of-table `df1` still gets the fallback.
///
/// # Example
/// ```rust
/// # use rollfit::critical::f_critical_05;
/// assert_eq!(f_critical_05(4, 10), 3.48);
/// assert!((f_critical_05(4, 15) - 3.175).abs() < 1e-12);
/// assert_eq!(f_critical_05(4, 100), 2.69);
/// ```
#[must_use]
pub fn f_critical_05(df1: usize, df2: usize) -> f64 {
    let Some(row) = df1.checked_sub(1).and_then(|i| F_TABLE_05.get(i)) else {
        return F_FALLBACK;
    };

    if df2 == 0 {
        return f64::INFINITY;
    }

    for (i, &upper) in F_TABLE_DF2.iter().enumerate() {
        if df2 == upper {
            return row[i];
        }

        if df2 < upper {
            // Columns are contiguous up to 5, so i > 0 here
            let lower = F_TABLE_DF2[i - 1];
            let fraction = (df2 - lower) as f64 / (upper - lower) as f64;
            return row[i - 1] + fraction * (row[i] - row[i - 1]);
        }
    }

    row[row.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;

    #[test]
    fn test_step_buckets() {
        let cases = [
            (0, 2.35),
            (1, 2.35),
            (10, 2.35),
            (11, 2.23),
            (15, 2.23),
            (20, 2.23),
            (21, 2.09),
            (30, 2.09),
            (31, 2.04),
            (500, 2.04),
        ];
        for (df, expected) in cases {
            assert_eq!(StepApproximation.critical_value(df), expected, "df = {df}");
        }
    }

    #[test]
    fn test_student_t() {
        assert!(StudentT.critical_value(0).is_infinite());
        assert_eq!(StudentT.critical_value(1), 12.71);
        assert_eq!(StudentT.critical_value(15), 2.131);
        assert_eq!(StudentT.critical_value(30), 2.042);
        assert_eq!(StudentT.critical_value(31), 1.96);
    }

    #[test]
    fn test_student_t_decreasing() {
        for df in 1..40 {
            assert!(StudentT.critical_value(df) >= StudentT.critical_value(df + 1));
        }
    }

    #[test]
    fn test_f_table_exact() {
        assert_eq!(f_critical_05(1, 1), 161.4);
        assert_eq!(f_critical_05(4, 15 + 5), 2.87);
        assert_eq!(f_critical_05(5, 30), 2.53);
    }

    #[test]
    fn test_f_table_interpolation() {
        // df2 = 25 sits halfway between the 20 and 30 columns
        assert_close!(f_critical_05(4, 25), (2.87 + 2.69) / 2.0, 1e-12);
        assert_close!(f_critical_05(2, 7), 5.79 + 0.4 * (4.10 - 5.79), 1e-12);

        // A 20-point fit gets the interpolated value, not the flat fallback
        assert_close!(f_critical_05(4, 15), 3.175, 1e-12);
        assert!(f_critical_05(4, 15) != F_FALLBACK);
    }

    #[test]
    fn test_f_table_edges() {
        assert_eq!(f_critical_05(0, 10), 3.0);
        assert_eq!(f_critical_05(6, 10), 3.0);
        assert!(f_critical_05(4, 0).is_infinite());
        assert_eq!(f_critical_05(3, 1000), 2.92);
    }

    #[test]
    fn test_interval_adjust() {
        assert_eq!(IntervalKind::Confidence.adjust(0.25), 0.25);
        assert_eq!(IntervalKind::Prediction.adjust(0.25), 1.25);
        assert_eq!("prediction".parse(), Ok(IntervalKind::Prediction));
        assert!("bogus".parse::<IntervalKind>().is_err());
    }
}
