//! Observations and the fixed polynomial feature basis.
//!
//! Every observation carries two raw features: `x1`, the time index (day number),
//! and `x2`, a continuous covariate such as temperature. The model is quadratic in
//! `x1`, linear in `x2`, and includes one interaction term:
//!
//! ```math
//! y = b0 + b1·x1 + b2·x1² + b3·x2 + b4·x1·x2
//! ```
//!
//! [`InteractionBasis`] turns an observation into the 5-term row
//! `[1, x1, x1², x2, x1·x2]`, and [`augment`] builds the N×5 design matrix.
use nalgebra::{DMatrix, MatrixViewMut};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A single raw observation: time index and covariate.
///
/// Targets are carried separately, in a slice parallel to the observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation<T = f64> {
    /// Time index, such as the day number
    pub x1: T,

    /// Continuous covariate, such as the day's temperature
    pub x2: T,
}

impl<T: Value> Observation<T> {
    /// Creates a new observation
    pub fn new(x1: T, x2: T) -> Self {
        Self { x1, x2 }
    }

    /// True if both features are finite
    pub fn is_finite(&self) -> bool {
        self.x1.is_real() && self.x2.is_real()
    }
}

impl<T: Value> From<(T, T)> for Observation<T> {
    fn from((x1, x2): (T, T)) -> Self {
        Self { x1, x2 }
    }
}

impl<T: Value> std::fmt::Display for Observation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x1, self.x2)
    }
}

/// The augmented feature row of one observation.
pub type AugmentedRow<T> = [T; InteractionBasis::K];

/// Second-degree basis in `x1` with a linear `x2` term and an `x1·x2` interaction.
///
/// The layout is fixed; coefficient `j` of a fit always multiplies term `j`:
///
/// | j | term    |
/// |---|---------|
/// | 0 | 1       |
/// | 1 | x1      |
/// | 2 | x1²     |
/// | 3 | x2      |
/// | 4 | x1·x2   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionBasis;
impl InteractionBasis {
    /// Number of basis terms, and therefore of model coefficients
    pub const K: usize = 5;

    /// Evaluates every basis term for one observation.
    #[must_use]
    pub fn row<T: Value>(observation: &Observation<T>) -> AugmentedRow<T> {
        let Observation { x1, x2 } = *observation;
        [T::one(), x1, x1 * x1, x2, x1 * x2]
    }

    /// Writes the basis terms of one observation into a design-matrix row.
    pub fn fill_matrix_row<T, R, C, RS, CS>(
        observation: &Observation<T>,
        mut row: MatrixViewMut<T, R, C, RS, CS>,
    ) where
        T: Value,
        R: nalgebra::Dim,
        C: nalgebra::Dim,
        RS: nalgebra::Dim,
        CS: nalgebra::Dim,
    {
        for (dst, src) in row.iter_mut().zip(Self::row(observation)) {
            *dst = src;
        }
    }

    /// Evaluates the model `Σ b_j·term_j` at an observation.
    ///
    /// Missing coefficients are treated as zero.
    #[must_use]
    pub fn evaluate<T: Value>(coefficients: &[T], observation: &Observation<T>) -> T {
        Self::row(observation)
            .iter()
            .zip(coefficients)
            .fold(T::zero(), |acc, (&term, &b)| acc + term * b)
    }
}

/// Builds the N×5 design matrix for a set of observations.
///
/// Row `i` of the output corresponds to observation `i`.
#[must_use]
pub fn augment<T: Value>(observations: &[Observation<T>]) -> DMatrix<T> {
    let mut design = DMatrix::zeros(observations.len(), InteractionBasis::K);
    for (row, observation) in design.row_iter_mut().zip(observations) {
        InteractionBasis::fill_matrix_row(observation, row);
    }
    design
}
