//! Numeric types used throughout the crate.
//!
//! This module defines the [`Value`] trait, which abstracts the floating-point
//! types that fits and forecasts can be computed in, ensuring compatibility with
//! nalgebra storage, floating-point operations, and formatting.
//!
//! # Example
//!
//! ```rust
//! use rollfit::value::Value;
//!
//! let squared = Value::powi(2.0_f64, 2);
//! assert_eq!(squared, 4.0);
//! assert_eq!(f64::from_positive_int(20), 20.0);
//! ```
use crate::error::Error;

/// Numeric type for fits and forecasts
pub trait Value:
    nalgebra::Scalar
    + nalgebra::ComplexField<RealField = Self>
    + nalgebra::RealField
    + num_traits::float::FloatCore
    + std::fmt::LowerExp
{
    /// Tries to cast a value to the target type
    ///
    /// # Errors
    /// Returns an error if the cast fails
    fn try_cast<U: num_traits::NumCast>(n: U) -> Result<Self, Error> {
        num_traits::cast(n).ok_or(Error::CastFailed)
    }

    /// Converts the value to `f64`, yielding NaN if it cannot be represented
    fn as_f64(&self) -> f64 {
        num_traits::cast(*self).unwrap_or(f64::NAN)
    }

    /// Raises the value to the power of an integer
    #[must_use]
    fn powi(self, n: i32) -> Self {
        nalgebra::ComplexField::powi(self, n)
    }

    /// Get the absolute value for a numeric type
    #[must_use]
    fn abs(self) -> Self {
        nalgebra::ComplexField::abs(self)
    }

    /// Returns the absolute difference between two values.
    #[must_use]
    fn abs_sub(self, other: Self) -> Self {
        nalgebra::ComplexField::abs(self - other)
    }

    /// True if the value is neither NaN nor infinite
    fn is_real(&self) -> bool {
        num_traits::float::FloatCore::is_finite(*self)
    }

    /// Check if the value is negative
    fn is_sign_negative(&self) -> bool {
        self < &Self::zero()
    }

    /// Converts a `usize` to the target numeric type.
    ///
    /// Results in `infinity` if the value is out of range.
    #[must_use]
    fn from_positive_int(n: usize) -> Self {
        Self::try_cast(n).unwrap_or(Self::infinity())
    }
}

impl<T> Value for T where
    T: nalgebra::Scalar
        + nalgebra::ComplexField<RealField = Self>
        + nalgebra::RealField
        + num_traits::float::FloatCore
        + std::fmt::LowerExp
{
}
