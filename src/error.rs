//! Error types for regression fitting and rolling forecasts
//!
//! This module defines the failure modes of the matrix primitives, the
//! least-squares fitter and the rolling-window predictor, along with a
//! convenient `Result` alias.

/// Errors that can occur while fitting or forecasting.
///
/// Every variant describes a structural property of the input. None of them
/// are transient, so nothing in this crate retries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Operand dimensions are incompatible.
    ///
    /// Raised by matrix products, matrix-vector products, and when the number of
    /// observations does not match the number of targets.
    #[error("Size mismatch in {context}: expected {expected}, found {found}")]
    SizeMismatch {
        /// Length or dimension the operation required
        expected: usize,
        /// Length or dimension that was supplied
        found: usize,
        /// Which operation detected the mismatch
        context: &'static str,
    },

    /// Only square matrices can be inverted.
    #[error("Cannot invert a non-square {rows}x{cols} matrix")]
    NotSquare {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },

    /// A pivot fell below the elimination tolerance.
    ///
    /// The moment matrix (X^T X) is rank-deficient or numerically degenerate;
    /// usually the window holds too few distinct observations, or the features are collinear.
    #[error("Matrix is singular or ill-conditioned: no usable pivot in column {column} of a {size}x{size} matrix")]
    SingularMatrix {
        /// Column being eliminated when the pivot vanished
        column: usize,
        /// Dimension of the matrix
        size: usize,
    },

    /// The fit would have no residual degrees of freedom.
    ///
    /// Confidence bounds are undefined unless there are more observations than coefficients.
    #[error("Not enough observations for a fit: need more than {k}, got {n}")]
    InsufficientData {
        /// Number of observations supplied
        n: usize,
        /// Number of model coefficients
        k: usize,
    },

    /// The requested window cannot support a fit.
    #[error("Window size {window} is too small; it must be at least {minimum}")]
    InvalidWindow {
        /// Requested window size
        window: usize,
        /// Smallest usable window
        minimum: usize,
    },

    /// Not enough initial history to fill the window.
    #[error("Window of size {window} needs {window} initial observations, only {available} supplied")]
    WindowUnderfilled {
        /// Configured window size
        window: usize,
        /// Number of initial observations supplied
        available: usize,
    },

    /// An input value was NaN or infinite.
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    /// A numeric value could not be cast to the target type.
    #[error("Failed to cast value to target type")]
    CastFailed,
}

/// Result type for fitting and forecasting
pub type Result<T> = std::result::Result<T, Error>;
