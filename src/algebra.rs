//! Dense matrix primitives used by the least-squares fitter.
//!
//! Storage is [`nalgebra::DMatrix`] / [`nalgebra::DVector`]; this module only adds
//! the checked operations the regression needs:
//! - [`multiply`] and [`multiply_vector`] verify operand shapes and return
//!   [`Error::SizeMismatch`] instead of panicking.
//! - [`transpose`] swaps dimensions.
//! - [`invert`] performs Gauss-Jordan elimination with partial pivoting, and is the
//!   only place singular moment matrices are detected.
//! - [`quadratic_form`] evaluates `xᵀ M x`, the leverage term of a prediction.
//!
//! # Example
//! ```rust
//! use rollfit::algebra::{invert, multiply};
//! use rollfit::nalgebra::DMatrix;
//!
//! let a = DMatrix::from_row_slice(2, 2, &[4.0, 7.0, 2.0, 6.0]);
//! let inv = invert(&a).unwrap();
//! let product = multiply(&a, &inv).unwrap();
//! assert!((product - DMatrix::<f64>::identity(2, 2)).amax() < 1e-12);
//! ```
use nalgebra::{DMatrix, DVector};

use crate::{
    error::{Error, Result},
    value::Value,
};

/// Smallest pivot magnitude accepted during elimination.
pub const PIVOT_TOLERANCE: f64 = 1e-15;

/// Multiplies `a` (m×n) by `b` (n×p) into an m×p matrix.
///
/// # Errors
/// Returns [`Error::SizeMismatch`] if `a.ncols() != b.nrows()`.
pub fn multiply<T: Value>(a: &DMatrix<T>, b: &DMatrix<T>) -> Result<DMatrix<T>> {
    if a.ncols() != b.nrows() {
        return Err(Error::SizeMismatch {
            expected: a.ncols(),
            found: b.nrows(),
            context: "matrix product",
        });
    }

    Ok(a * b)
}

/// Returns the transpose of `a`.
#[must_use]
pub fn transpose<T: Value>(a: &DMatrix<T>) -> DMatrix<T> {
    a.transpose()
}

/// Multiplies `a` (m×n) by the column vector `x` (n) into an m-length vector.
///
/// # Errors
/// Returns [`Error::SizeMismatch`] if `a.ncols() != x.len()`.
pub fn multiply_vector<T: Value>(a: &DMatrix<T>, x: &DVector<T>) -> Result<DVector<T>> {
    if a.ncols() != x.len() {
        return Err(Error::SizeMismatch {
            expected: a.ncols(),
            found: x.len(),
            context: "matrix-vector product",
        });
    }

    Ok(a * x)
}

/// Inverts a square matrix using Gauss-Jordan elimination with partial pivoting.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// The augmented matrix `[A | I]` (n×2n) is reduced to `[I | A⁻¹]`:
/// 1. For column `i`, the row `r ≥ i` with the largest `|a[r][i]|` is swapped into row `i`.
/// 2. If that pivot is smaller than [`PIVOT_TOLERANCE`] the matrix is rejected.
/// 3. Row `i` is divided by the pivot.
/// 4. Column `i` is cleared from every other row, above and below.
///
/// </div>
///
/// # Errors
/// - [`Error::NotSquare`] if `a` is not square.
/// - [`Error::SingularMatrix`] if a pivot is below tolerance (or NaN).
pub fn invert<T: Value>(a: &DMatrix<T>) -> Result<DMatrix<T>> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(Error::NotSquare {
            rows: n,
            cols: a.ncols(),
        });
    }

    let tolerance = T::try_cast(PIVOT_TOLERANCE)?;
    let mut augmented = DMatrix::from_fn(n, 2 * n, |i, j| {
        if j < n {
            a[(i, j)]
        } else if j - n == i {
            T::one()
        } else {
            T::zero()
        }
    });

    for col in 0..n {
        let mut pivot_row = col;
        for row in col + 1..n {
            if Value::abs(augmented[(row, col)]) > Value::abs(augmented[(pivot_row, col)]) {
                pivot_row = row;
            }
        }

        if pivot_row != col {
            augmented.swap_rows(col, pivot_row);
        }

        let pivot = augmented[(col, col)];
        tracing::trace!(col, pivot_row, pivot = %pivot, "selected pivot");

        // Negated so that a NaN pivot is rejected too
        if !(Value::abs(pivot) >= tolerance) {
            return Err(Error::SingularMatrix { column: col, size: n });
        }

        for j in 0..2 * n {
            augmented[(col, j)] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }

            let factor = augmented[(row, col)];
            if factor == T::zero() {
                continue;
            }

            for j in 0..2 * n {
                let delta = factor * augmented[(col, j)];
                augmented[(row, j)] -= delta;
            }
        }
    }

    Ok(augmented.columns(n, n).into_owned())
}

/// Evaluates the quadratic form `xᵀ M x` = `Σ_j Σ_m x[j]·M[j][m]·x[m]`.
///
/// With `M = (XᵀX)⁻¹` and `x` an augmented row, this is the leverage of `x`.
///
/// # Errors
/// Returns [`Error::SizeMismatch`] unless `m` is square with side `x.len()`.
pub fn quadratic_form<T: Value>(m: &DMatrix<T>, x: &[T]) -> Result<T> {
    if m.nrows() != x.len() || m.ncols() != x.len() {
        return Err(Error::SizeMismatch {
            expected: m.ncols(),
            found: x.len(),
            context: "quadratic form",
        });
    }

    let mut sum = T::zero();
    for (j, &xj) in x.iter().enumerate() {
        for (k, &xk) in x.iter().enumerate() {
            sum += xj * m[(j, k)] * xk;
        }
    }
    Ok(sum)
}
