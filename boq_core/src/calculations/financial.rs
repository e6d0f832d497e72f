//! # Tax and Round-Off
//!
//! Turns any subtotal into an invoice-ready total: SGST and CGST are derived
//! from the subtotal, the tax-inclusive amount is rounded to a whole currency
//! unit, and the difference is booked as its own signed round-off line.
//!
//! ```text
//! sgst       = subtotal * 9%
//! cgst       = subtotal * 9%
//! raw        = subtotal + sgst + cgst
//! grandTotal = round(raw)            (half away from zero)
//! roundOff   = grandTotal - raw
//! ```
//!
//! Arithmetic is done in [`Decimal`], so
//! `subtotal + sgst + cgst + roundOff == grandTotal` holds exactly rather
//! than within a float tolerance. The subtotal keeps all of its digits; only
//! display rounds to [`CURRENCY_DP`] places.
//!
//! ## Example
//!
//! ```rust
//! use boq_core::calculations::financial::finalize;
//! use rust_decimal_macros::dec;
//!
//! let totals = finalize(105.50);
//! assert_eq!(totals.sgst, dec!(9.495));
//! assert_eq!(totals.grand_total, dec!(124));
//! assert_eq!(totals.round_off, dec!(-0.49));
//! assert!(totals.reconciles());
//! ```

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::units::non_negative;

/// Decimal places shown for currency amounts
pub const CURRENCY_DP: u32 = 2;

const ONE_HUNDRED: Decimal = dec!(100);

/// Default state GST rate, percent
pub const DEFAULT_SGST_PCT: Decimal = dec!(9);

/// Default central GST rate, percent
pub const DEFAULT_CGST_PCT: Decimal = dec!(9);

/// Tax rates applied on top of a subtotal, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRates {
    /// State GST (percent)
    pub sgst_pct: Decimal,
    /// Central GST (percent)
    pub cgst_pct: Decimal,
}

impl Default for TaxRates {
    fn default() -> Self {
        TaxRates {
            sgst_pct: DEFAULT_SGST_PCT,
            cgst_pct: DEFAULT_CGST_PCT,
        }
    }
}

impl TaxRates {
    /// Rates from plain percentages; negative or non-finite values become 0
    pub fn from_percentages(sgst_pct: f64, cgst_pct: f64) -> Self {
        TaxRates {
            sgst_pct: to_decimal(sgst_pct),
            cgst_pct: to_decimal(cgst_pct),
        }
    }

    /// Combined tax rate, percent
    pub fn total_pct(&self) -> Decimal {
        self.sgst_pct.max(Decimal::ZERO).saturating_add(self.cgst_pct.max(Decimal::ZERO))
    }
}

/// Tax breakdown for one subtotal.
///
/// ## JSON Example
///
/// ```json
/// {
///   "subtotal": "105.5",
///   "sgst": "9.495",
///   "cgst": "9.495",
///   "rawTotal": "124.490",
///   "roundOff": "-0.490",
///   "grandTotal": "124"
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalTotals {
    pub subtotal: Decimal,
    pub sgst: Decimal,
    pub cgst: Decimal,
    /// Tax-inclusive amount before rounding
    pub raw_total: Decimal,
    /// Signed adjustment so the grand total is a whole currency unit
    pub round_off: Decimal,
    pub grand_total: Decimal,
}

impl FinalTotals {
    /// Check the ledger identity `subtotal + sgst + cgst + roundOff == grandTotal`
    pub fn reconciles(&self) -> bool {
        self.subtotal + self.sgst + self.cgst + self.round_off == self.grand_total
    }

    /// Total tax charged
    pub fn total_tax(&self) -> Decimal {
        self.sgst + self.cgst
    }

    /// Amounts rounded to [`CURRENCY_DP`] places for printing.
    ///
    /// The grand total is already whole; the rounded round-off line is
    /// re-derived so the printed lines still add up.
    pub fn for_display(&self) -> Self {
        let round = |d: Decimal| d.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero);
        let subtotal = round(self.subtotal);
        let sgst = round(self.sgst);
        let cgst = round(self.cgst);
        FinalTotals {
            subtotal,
            sgst,
            cgst,
            raw_total: round(self.raw_total),
            round_off: self.grand_total - subtotal - sgst - cgst,
            grand_total: self.grand_total,
        }
    }

    fn untaxed(subtotal: Decimal) -> Self {
        FinalTotals {
            subtotal,
            sgst: Decimal::ZERO,
            cgst: Decimal::ZERO,
            raw_total: subtotal,
            round_off: Decimal::ZERO,
            grand_total: subtotal,
        }
    }
}

/// Convert an engine amount to a decimal, keeping every significant digit.
///
/// Negative and non-finite amounts become zero. Finite amounts beyond the
/// decimal range saturate at [`Decimal::MAX`] instead of collapsing to zero.
pub fn to_decimal(amount: f64) -> Decimal {
    let amount = non_negative(amount);
    match Decimal::from_f64(amount) {
        Some(value) => value,
        None if amount >= 1.0 => {
            warn!(amount, "amount beyond decimal range, saturated");
            Decimal::MAX
        }
        None => Decimal::ZERO,
    }
}

/// Finalize a subtotal with the default 9% + 9% GST.
pub fn finalize(subtotal: f64) -> FinalTotals {
    finalize_with(subtotal, &TaxRates::default())
}

/// Finalize a subtotal with explicit tax rates.
pub fn finalize_with(subtotal: f64, rates: &TaxRates) -> FinalTotals {
    finalize_decimal(to_decimal(subtotal), rates)
}

/// Finalize a subtotal already expressed as a decimal.
///
/// A subtotal whose tax-inclusive total does not fit in a [`Decimal`] is
/// capped at the largest subtotal that does; the result still reconciles.
pub fn finalize_decimal(subtotal: Decimal, rates: &TaxRates) -> FinalTotals {
    let subtotal = subtotal.max(Decimal::ZERO);
    let totals = match checked_totals(subtotal, rates) {
        Some(totals) => totals,
        None => {
            let cap = saturation_cap(rates).min(subtotal);
            warn!(%subtotal, %cap, "tax-inclusive total overflows, subtotal capped");
            checked_totals(cap, rates).unwrap_or_else(|| FinalTotals::untaxed(cap))
        }
    };

    debug!(
        subtotal = %totals.subtotal,
        raw_total = %totals.raw_total,
        grand_total = %totals.grand_total,
        "finalized totals"
    );
    totals
}

fn checked_totals(subtotal: Decimal, rates: &TaxRates) -> Option<FinalTotals> {
    let sgst = subtotal.checked_mul(rate_fraction(rates.sgst_pct))?;
    let cgst = subtotal.checked_mul(rate_fraction(rates.cgst_pct))?;
    let raw_total = subtotal.checked_add(sgst)?.checked_add(cgst)?;
    let grand_total = raw_total.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let round_off = grand_total.checked_sub(raw_total)?;

    Some(FinalTotals {
        subtotal,
        sgst,
        cgst,
        raw_total,
        round_off,
        grand_total,
    })
}

/// Percent as a multiplier (9 → 0.09)
fn rate_fraction(pct: Decimal) -> Decimal {
    pct.max(Decimal::ZERO) / ONE_HUNDRED
}

/// Largest whole subtotal whose taxed total stays well inside the decimal range
fn saturation_cap(rates: &TaxRates) -> Decimal {
    let factor = Decimal::ONE.saturating_add(rate_fraction(rates.total_pct()));
    (Decimal::MAX / dec!(2) / factor).trunc()
}
