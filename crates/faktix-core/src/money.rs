//! # Money Module
//!
//! Provides the `Money` type for CZK amounts and `TaxRate` for DPH (VAT).
//!
//! ## Representation
//! ```text
//!   12,5 m² × 400,00 Kč  + 21 % DPH
//!       │         │            │
//!       │   Money(40_000)  TaxRate(2100)
//!       └────┬────┘            │
//!    multiply_quantity         │        one rounding step per operation,
//!       Money(500_000) ────────┤        half away from zero
//!                        calculate_vat
//!                         Money(105_000)
//! ```
//! Amounts are whole haléře in an `i64`. Floats appear only as quantities
//! (hours, m², kg) and are rounded back to haléře as soon as they touch money,
//! so an invoice total always equals the sum of its printed lines.
//!
//! ## Usage
//! ```rust
//! use faktix_core::money::{Money, TaxRate};
//!
//! let price = Money::from_haler(100_000); // 1000,00 Kč
//! let vat = price.calculate_vat(TaxRate::STANDARD);
//! assert_eq!(vat.haler(), 21_000);
//! assert_eq!((price + vat).to_string(), "1210,00 Kč");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Tax Rate
// =============================================================================

/// DPH rate represented in basis points (bps).
///
/// 1 basis point = 0.01 %, so 2100 bps = 21 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Czech standard DPH rate (21 %).
    pub const STANDARD: TaxRate = TaxRate(2100);

    /// Czech reduced DPH rate (12 %).
    pub const REDUCED: TaxRate = TaxRate(1200);

    /// No DPH (neplátce, or exempt supply).
    pub const ZERO: TaxRate = TaxRate(0);

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::ZERO
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A CZK amount in haléře (the smallest currency unit).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  LineItem.unit_price ──► LineItem.net ──► + DPH ──► LineItem.gross      │
/// │                                                            │            │
/// │                                           InvoiceRecord.total ◄─┘       │
/// │                                                                         │
/// │  Formula.unit_cost ──► CalculationResult.total_cost ──► estimate        │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from haléře.
    ///
    /// ## Example
    /// ```rust
    /// use faktix_core::money::Money;
    ///
    /// let price = Money::from_haler(1099); // 10,99 Kč
    /// assert_eq!(price.haler(), 1099);
    /// ```
    #[inline]
    pub const fn from_haler(haler: i64) -> Self {
        Money(haler)
    }

    /// Creates a Money value from koruny and haléře.
    ///
    /// For negative amounts only the koruny part carries the sign:
    /// `from_major_minor(-5, 50)` is -5,50 Kč.
    #[inline]
    pub const fn from_major_minor(koruny: i64, haler: i64) -> Self {
        if koruny < 0 {
            Money(koruny * 100 - haler)
        } else {
            Money(koruny * 100 + haler)
        }
    }

    /// Returns the value in haléře.
    #[inline]
    pub const fn haler(&self) -> i64 {
        self.0
    }

    /// Returns the whole koruny portion (truncated toward zero).
    #[inline]
    pub const fn koruny(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the haléře portion (always 0-99).
    #[inline]
    pub const fn haler_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates DPH for this (net) amount.
    ///
    /// Rounds half away from zero to whole haléře, in integer arithmetic:
    /// `(amount * bps ± 5000) / 10000`.
    ///
    /// ## Example
    /// ```rust
    /// use faktix_core::money::{Money, TaxRate};
    ///
    /// // 10,05 Kč × 21 % = 2,1105 Kč → 2,11 Kč
    /// let vat = Money::from_haler(1005).calculate_vat(TaxRate::STANDARD);
    /// assert_eq!(vat.haler(), 211);
    /// ```
    pub fn calculate_vat(&self, rate: TaxRate) -> Money {
        // i128 keeps large invoice totals from overflowing
        let raw = self.0 as i128 * rate.bps() as i128;
        let half = if raw < 0 { -5000 } else { 5000 };
        Money::from_haler(((raw + half) / 10000) as i64)
    }

    /// Multiplies by a fractional quantity (e.g. 2.5 hours, 12.75 m²).
    ///
    /// The product is rounded half away from zero to whole haléře.
    pub fn multiply_quantity(&self, qty: f64) -> Money {
        Money::from_haler((self.0 as f64 * qty).round() as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Czech notation with a decimal comma: `1234,50 Kč`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{},{:02} Kč",
            sign,
            self.koruny().abs(),
            self.haler_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a whole quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
