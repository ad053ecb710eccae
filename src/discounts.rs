//! Discount arithmetic
//!
//! Minor-unit helpers shared by rewards and the applicator: percentage amounts and the
//! proportional split of one discount across several lines.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{MoneyError, iso::Currency};
use smallvec::{SmallVec, smallvec};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A discount could not be split across lines.
    #[error("cannot allocate {total} minor units: {reason}")]
    Allocation {
        /// Amount being allocated, in minor units
        total: i64,

        /// Why the allocation failed
        reason: &'static str,
    },

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// Rounds half away from zero to the nearest minor unit.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Return the percentage as a plain decimal fraction (`0.25` for 25%).
pub fn percentage_fraction(percent: &Percentage) -> Decimal {
    (*percent) * Decimal::ONE
}

/// Convert minor units into major units of `currency` (`1050` cents is `10.50` dollars).
pub fn minor_to_major(minor: i64, currency: &Currency) -> Decimal {
    Decimal::new(minor, currency.exponent)
}

/// Split `total` minor units across `weights`, proportionally.
///
/// Uses the largest remainder method so the shares always sum to exactly `total`. Weights that
/// are zero or negative receive nothing. Leftover units go to the largest fractional remainders,
/// earlier positions winning ties.
///
/// # Errors
///
/// Returns [`DiscountError::Allocation`] if `total` is negative, if `total` is non-zero but no
/// weight is positive, or if the arithmetic overflows.
pub fn allocate_proportionally(
    total: i64,
    weights: &[Decimal],
) -> Result<SmallVec<[i64; 10]>, DiscountError> {
    let mut shares: SmallVec<[i64; 10]> = smallvec![0; weights.len()];

    if total == 0 {
        return Ok(shares);
    }

    if total < 0 {
        return Err(DiscountError::Allocation {
            total,
            reason: "negative amount",
        });
    }

    let weight_sum: Decimal = weights.iter().filter(|w| w.is_sign_positive()).sum();

    if weight_sum.is_zero() {
        return Err(DiscountError::Allocation {
            total,
            reason: "no positive weights",
        });
    }

    let total_dec = Decimal::from(total);

    let mut remainders: SmallVec<[(usize, Decimal); 10]> = SmallVec::new();
    let mut allocated = 0_i64;

    for (idx, weight) in weights.iter().enumerate() {
        if !weight.is_sign_positive() || weight.is_zero() {
            continue;
        }

        let exact = total_dec
            .checked_mul(*weight)
            .and_then(|value| value.checked_div(weight_sum))
            .ok_or(DiscountError::Allocation {
                total,
                reason: "arithmetic overflow",
            })?;

        let floor = exact.floor();
        let share = floor.to_i64().ok_or(DiscountError::Allocation {
            total,
            reason: "share out of range",
        })?;

        if let Some(slot) = shares.get_mut(idx) {
            *slot = share;
        }

        allocated = allocated.checked_add(share).ok_or(DiscountError::Allocation {
            total,
            reason: "arithmetic overflow",
        })?;

        remainders.push((idx, exact - floor));
    }

    let leftover =
        usize::try_from(total - allocated).map_err(|_err| DiscountError::Allocation {
            total,
            reason: "share out of range",
        })?;

    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    for (idx, _) in remainders.iter().cycle().take(leftover) {
        if let Some(slot) = shares.get_mut(*idx) {
            *slot += 1;
        }
    }

    Ok(shares)
}
