//! # Unit Types
//!
//! Type-safe wrappers for the handful of units the takeoff and recipe
//! calculators work in. These are plain f64 newtypes that serialize as bare
//! numbers, so the JSON payloads stay exactly as the front end stores them.
//!
//! ## Units
//!
//! Site measurements are taken in imperial units:
//! - Length: feet (ft)
//! - Area: square feet (sq ft)
//! - Volume: cubic feet (cu ft)
//! - Wastage: percent (5.0 means 5%)
//!
//! ## Example
//!
//! ```rust
//! use boq_core::units::{Feet, Percent, SqFt};
//!
//! let area: SqFt = Feet(10.0) * Feet(8.0);
//! assert_eq!(area.0, 80.0);
//!
//! let wastage = Percent(5.0);
//! assert!((wastage.factor() - 1.05).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// Coerce a raw business number into the calculators' domain.
///
/// NaN, infinities and negatives become `0.0`. Everything the calculators
/// read from user input goes through here first, which is what keeps them
/// total: no input can produce a NaN or a panic downstream.
///
/// ```rust
/// use boq_core::units::non_negative;
///
/// assert_eq!(non_negative(12.5), 12.5);
/// assert_eq!(non_negative(-3.0), 0.0);
/// assert_eq!(non_negative(f64::NAN), 0.0);
/// ```
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

// ============================================================================
// Length / Area / Volume
// ============================================================================

/// Length in feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feet(pub f64);

/// Area in square feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqFt(pub f64);

/// Volume in cubic feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CuFt(pub f64);

impl Mul<Feet> for Feet {
    type Output = SqFt;
    fn mul(self, rhs: Feet) -> SqFt {
        SqFt(self.0 * rhs.0)
    }
}

impl Mul<Feet> for SqFt {
    type Output = CuFt;
    fn mul(self, rhs: Feet) -> CuFt {
        CuFt(self.0 * rhs.0)
    }
}

// ============================================================================
// Percent
// ============================================================================

/// A percentage, stored as the human number (5.0 means 5%).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(pub f64);

impl Percent {
    /// Percent with non-finite or negative values coerced to zero
    pub fn normalized(self) -> Percent {
        Percent(non_negative(self.0))
    }

    /// Multiplier form: `1 + pct / 100`
    pub fn factor(self) -> f64 {
        1.0 + self.0 / 100.0
    }

    /// Fraction form: `pct / 100`
    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Feet);
impl_arithmetic!(SqFt);
impl_arithmetic!(CuFt);
impl_arithmetic!(Percent);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_and_volume() {
        let area = Feet(10.0) * Feet(8.0);
        assert_eq!(area, SqFt(80.0));

        let volume = area * Feet(0.75);
        assert_eq!(volume, CuFt(60.0));
    }

    #[test]
    fn test_arithmetic() {
        let a = Feet(10.0);
        let b = Feet(5.0);
        assert_eq!((a + b).0, 15.0);
        assert_eq!((a - b).0, 5.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
    }

    #[test]
    fn test_non_negative_coercion() {
        assert_eq!(non_negative(0.0), 0.0);
        assert_eq!(non_negative(-0.0), 0.0);
        assert_eq!(non_negative(f64::INFINITY), 0.0);
        assert_eq!(non_negative(f64::NEG_INFINITY), 0.0);
        assert_eq!(non_negative(4.5), 4.5);
    }

    #[test]
    fn test_percent() {
        assert_eq!(Percent(-10.0).normalized(), Percent(0.0));
        assert_eq!(Percent(f64::NAN).normalized(), Percent(0.0));
        assert!((Percent(10.0).factor() - 1.1).abs() < 1e-12);
        assert!((Percent(25.0).fraction() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_serialization() {
        let pct = Percent(7.5);
        let json = serde_json::to_string(&pct).unwrap();
        assert_eq!(json, "7.5");

        let roundtrip: Percent = serde_json::from_str(&json).unwrap();
        assert_eq!(pct, roundtrip);
    }
}
