//! # Unit System
//!
//! Force and length unit families used by F2K files, plus the conversion
//! factors between every pair of units in a family.
//!
//! ## Design
//!
//! Every unit carries one anchor value in SI (newtons or metres). A factor
//! between two units is the ratio of their anchors, so chained conversions
//! agree with direct ones: `factor(A, B) * factor(B, C) == factor(A, C)`
//! up to floating-point rounding.
//!
//! Derived quantities (area, pressure, moment, ...) are expressed as a pair of
//! exponents on the two base families.
//!
//! ## Example
//!
//! ```rust
//! use f2k_core::units::{ForceUnit, LengthUnit, QuantityKind, UnitPair};
//!
//! let model = UnitPair::new(ForceUnit::N, LengthUnit::Mm);
//! let file = UnitPair::new(ForceUnit::KN, LengthUnit::M);
//!
//! let span_m = model.convert_to(2820.0, QuantityKind::Length, &file);
//! assert!((span_m - 2.82).abs() < 1e-12);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::InterchangeError;

/// Standard gravity, used for the gravitational force units (m/s²)
const STANDARD_GRAVITY: f64 = 9.80665;

// ============================================================================
// Force Units
// ============================================================================

/// Force units accepted in F2K unit declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ForceUnit {
    /// Newton
    N,
    /// Kilonewton
    KN,
    /// Kilogram-force
    Kgf,
    /// Metric tonne-force
    #[serde(rename = "tonf")]
    Tonf,
}

impl ForceUnit {
    pub const ALL: [ForceUnit; 4] = [ForceUnit::N, ForceUnit::KN, ForceUnit::Kgf, ForceUnit::Tonf];

    /// Size of one unit in newtons
    pub fn in_newtons(&self) -> f64 {
        match self {
            ForceUnit::N => 1.0,
            ForceUnit::KN => 1000.0,
            ForceUnit::Kgf => STANDARD_GRAVITY,
            ForceUnit::Tonf => 1000.0 * STANDARD_GRAVITY,
        }
    }

    /// Token as written in F2K files
    pub fn token(&self) -> &'static str {
        match self {
            ForceUnit::N => "N",
            ForceUnit::KN => "KN",
            ForceUnit::Kgf => "Kgf",
            ForceUnit::Tonf => "tonf",
        }
    }

    /// Multiplicative factor converting a value in `self` into `to`
    pub fn factor_to(&self, to: ForceUnit) -> f64 {
        if *self == to {
            return 1.0;
        }
        self.in_newtons() / to.in_newtons()
    }
}

impl fmt::Display for ForceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ForceUnit {
    type Err = InterchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().trim_matches('"');
        ForceUnit::ALL
            .into_iter()
            .find(|unit| unit.token().eq_ignore_ascii_case(token))
            .ok_or_else(|| InterchangeError::units_not_found(format!("unknown force unit '{}'", token)))
    }
}

// ============================================================================
// Length Units
// ============================================================================

/// Length units accepted in F2K unit declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    /// Millimetre
    Mm,
    /// Centimetre
    Cm,
    /// Metre
    M,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 3] = [LengthUnit::Mm, LengthUnit::Cm, LengthUnit::M];

    /// Size of one unit in metres
    pub fn in_metres(&self) -> f64 {
        match self {
            LengthUnit::Mm => 0.001,
            LengthUnit::Cm => 0.01,
            LengthUnit::M => 1.0,
        }
    }

    /// Token as written in F2K files
    pub fn token(&self) -> &'static str {
        match self {
            LengthUnit::Mm => "mm",
            LengthUnit::Cm => "cm",
            LengthUnit::M => "m",
        }
    }

    /// Multiplicative factor converting a value in `self` into `to`
    pub fn factor_to(&self, to: LengthUnit) -> f64 {
        if *self == to {
            return 1.0;
        }
        self.in_metres() / to.in_metres()
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for LengthUnit {
    type Err = InterchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().trim_matches('"');
        LengthUnit::ALL
            .into_iter()
            .find(|unit| unit.token().eq_ignore_ascii_case(token))
            .ok_or_else(|| InterchangeError::units_not_found(format!("unknown length unit '{}'", token)))
    }
}

// ============================================================================
// Factor Tables
// ============================================================================

/// Conversion factors from `unit` to every force unit (`factor[unit] == 1`)
pub fn force_factors(unit: ForceUnit) -> BTreeMap<ForceUnit, f64> {
    ForceUnit::ALL
        .into_iter()
        .map(|to| (to, unit.factor_to(to)))
        .collect()
}

/// Conversion factors from `unit` to every length unit (`factor[unit] == 1`)
pub fn length_factors(unit: LengthUnit) -> BTreeMap<LengthUnit, f64> {
    LengthUnit::ALL
        .into_iter()
        .map(|to| (to, unit.factor_to(to)))
        .collect()
}

// ============================================================================
// Quantity Kinds
// ============================================================================

/// Physical quantity being converted.
///
/// Each kind is `force^f * length^l` for a fixed pair of exponents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantityKind {
    Force,
    Length,
    Area,
    /// Force times length
    Moment,
    /// Line load
    ForcePerLength,
    /// Area load or stress
    Pressure,
    /// Soil spring stiffness per unit area (force / length³)
    SubgradeModulus,
}

impl QuantityKind {
    /// (force exponent, length exponent)
    pub fn exponents(&self) -> (i32, i32) {
        match self {
            QuantityKind::Force => (1, 0),
            QuantityKind::Length => (0, 1),
            QuantityKind::Area => (0, 2),
            QuantityKind::Moment => (1, 1),
            QuantityKind::ForcePerLength => (1, -1),
            QuantityKind::Pressure => (1, -2),
            QuantityKind::SubgradeModulus => (1, -3),
        }
    }
}

// ============================================================================
// Unit Pair
// ============================================================================

/// A force/length unit combination, as declared by a file or used by a producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitPair {
    pub force: ForceUnit,
    pub length: LengthUnit,
}

impl UnitPair {
    pub fn new(force: ForceUnit, length: LengthUnit) -> Self {
        UnitPair { force, length }
    }

    /// Factor converting a `kind` quantity from `self` into `to`
    pub fn factor_to(&self, kind: QuantityKind, to: &UnitPair) -> f64 {
        let (force_exp, length_exp) = kind.exponents();
        self.force.factor_to(to.force).powi(force_exp) * self.length.factor_to(to.length).powi(length_exp)
    }

    /// Convert `value` of quantity `kind` from `self` into `to`
    pub fn convert_to(&self, value: f64, kind: QuantityKind, to: &UnitPair) -> f64 {
        value * self.factor_to(kind, to)
    }
}

impl Default for UnitPair {
    /// Newtons and millimetres, the units CAD-side producers model in
    fn default() -> Self {
        UnitPair::new(ForceUnit::N, LengthUnit::Mm)
    }
}

impl fmt::Display for UnitPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.force, self.length)
    }
}

/// Convert a single-family value between two units.
///
/// Only `Force` and `Length` are meaningful here; derived kinds need a
/// full [`UnitPair`] and go through [`UnitPair::convert_to`].
pub fn convert_force(value: f64, from: ForceUnit, to: ForceUnit) -> f64 {
    value * from.factor_to(to)
}

/// See [`convert_force`]
pub fn convert_length(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
    value * from.factor_to(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_identity_factors() {
        for unit in ForceUnit::ALL {
            assert_eq!(force_factors(unit)[&unit], 1.0);
        }
        for unit in LengthUnit::ALL {
            assert_eq!(length_factors(unit)[&unit], 1.0);
        }
    }

    #[test]
    fn test_known_factors() {
        assert_eq!(force_factors(ForceUnit::KN)[&ForceUnit::N], 1000.0);
        assert!(close(force_factors(ForceUnit::Tonf)[&ForceUnit::Kgf], 1000.0));
        assert!(close(force_factors(ForceUnit::Kgf)[&ForceUnit::N], 9.80665));
        assert!(close(length_factors(LengthUnit::M)[&LengthUnit::Mm], 1000.0));
        assert!(close(length_factors(LengthUnit::Cm)[&LengthUnit::Mm], 10.0));
    }

    #[test]
    fn test_force_factor_transitivity() {
        for a in ForceUnit::ALL {
            for b in ForceUnit::ALL {
                for c in ForceUnit::ALL {
                    let chained = a.factor_to(b) * b.factor_to(c);
                    assert!(close(chained, a.factor_to(c)), "{} -> {} -> {}", a, b, c);
                }
            }
        }
    }

    #[test]
    fn test_length_factor_transitivity() {
        for a in LengthUnit::ALL {
            for b in LengthUnit::ALL {
                for c in LengthUnit::ALL {
                    let chained = a.factor_to(b) * b.factor_to(c);
                    assert!(close(chained, a.factor_to(c)), "{} -> {} -> {}", a, b, c);
                }
            }
        }
        // mm -> cm -> m agrees with mm -> m
        let via_cm = convert_length(convert_length(2820.0, LengthUnit::Mm, LengthUnit::Cm), LengthUnit::Cm, LengthUnit::M);
        assert!(close(via_cm, convert_length(2820.0, LengthUnit::Mm, LengthUnit::M)));
    }

    #[test]
    fn test_derived_quantities() {
        let model = UnitPair::new(ForceUnit::N, LengthUnit::Mm);
        let file = UnitPair::new(ForceUnit::KN, LengthUnit::M);

        // 1 N/mm² = 1000 kN/m²
        assert!(close(model.convert_to(1.0, QuantityKind::Pressure, &file), 1000.0));
        // 1 N/mm³ = 1e6 kN/m³
        assert!(close(model.convert_to(1.0, QuantityKind::SubgradeModulus, &file), 1.0e6));
        // 1 N·mm = 1e-6 kN·m
        assert!(close(model.convert_to(1.0, QuantityKind::Moment, &file), 1.0e-6));
        // 1 mm² = 1e-6 m²
        assert!(close(model.convert_to(1.0, QuantityKind::Area, &file), 1.0e-6));
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!("KN".parse::<ForceUnit>().unwrap(), ForceUnit::KN);
        assert_eq!("kN".parse::<ForceUnit>().unwrap(), ForceUnit::KN);
        assert_eq!("Tonf".parse::<ForceUnit>().unwrap(), ForceUnit::Tonf);
        assert_eq!(" m ".parse::<LengthUnit>().unwrap(), LengthUnit::M);
        assert_eq!("MM".parse::<LengthUnit>().unwrap(), LengthUnit::Mm);
        assert!("lb".parse::<ForceUnit>().is_err());
        assert!("ft".parse::<LengthUnit>().is_err());
    }

    #[test]
    fn test_serialization() {
        let pair = UnitPair::new(ForceUnit::Tonf, LengthUnit::Cm);
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"{"force":"tonf","length":"cm"}"#);

        let roundtrip: UnitPair = serde_json::from_str(&json).unwrap();
        assert_eq!(pair, roundtrip);
    }
}
