//! Order price composition.
//!
//! Everything here is a pure function of its inputs. Amounts keep full
//! precision; rounding to cents happens only through [`PriceBreakdown::rounded`].

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, RoundingMode, Signed, ToPrimitive};

use super::coupon::Discount;
use super::errors::DomainError;
use super::order::{DeliveryMethod, OrderExtra};

/// Share of the subtotal returned to customers who collect their laundry.
pub const PICKUP_DISCOUNT_PERCENT: i64 = 10;

/// Weights are stored as `NUMERIC(10,3)`.
pub const MAX_WEIGHT_KG: i64 = 10_000_000;
pub const WEIGHT_SCALE: i64 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub base_price: BigDecimal,
    pub extras_price: BigDecimal,
    pub subtotal: BigDecimal,
    pub pickup_discount: BigDecimal,
    pub coupon_discount: BigDecimal,
    pub total_discount: BigDecimal,
    pub total: BigDecimal,
    /// Set when discounts exceeded the subtotal and the total was floored at zero.
    pub clamped: bool,
}

impl PriceBreakdown {
    /// Every amount rounded half-up to two decimals for display.
    pub fn rounded(&self) -> PriceBreakdown {
        PriceBreakdown {
            base_price: to_cents(&self.base_price),
            extras_price: to_cents(&self.extras_price),
            subtotal: to_cents(&self.subtotal),
            pickup_discount: to_cents(&self.pickup_discount),
            coupon_discount: to_cents(&self.coupon_discount),
            total_discount: to_cents(&self.total_discount),
            total: to_cents(&self.total),
            clamped: self.clamped,
        }
    }
}

pub fn to_cents(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

/// Plain decimal text with exactly two fraction digits, zero included.
pub fn format_cents(amount: &BigDecimal) -> String {
    let (cents, _) = to_cents(amount).with_scale(2).into_bigint_and_exponent();
    let sign = if cents.is_negative() { "-" } else { "" };
    let cents = cents.abs();
    let hundred = BigInt::from(100);
    let fraction = (&cents % &hundred).to_u32().unwrap_or(0);
    format!("{}{}.{:02}", sign, &cents / &hundred, fraction)
}

fn check_weight(weight_kg: &BigDecimal) -> Result<(), DomainError> {
    if *weight_kg <= BigDecimal::from(0) {
        return Err(DomainError::Validation(
            "weight_kg must be greater than zero".to_string(),
        ));
    }
    if *weight_kg >= BigDecimal::from(MAX_WEIGHT_KG) {
        return Err(DomainError::Validation(format!(
            "weight_kg must be below {}",
            MAX_WEIGHT_KG
        )));
    }
    if weight_kg.normalized().fractional_digit_count() > WEIGHT_SCALE {
        return Err(DomainError::Validation(format!(
            "weight_kg allows at most {} decimals",
            WEIGHT_SCALE
        )));
    }
    Ok(())
}

fn percent_of(amount: &BigDecimal, percent: &BigDecimal) -> BigDecimal {
    amount * percent / BigDecimal::from(100)
}

pub fn compute_total(
    price_per_kg: &BigDecimal,
    weight_kg: &BigDecimal,
    extras: &[OrderExtra],
    delivery: DeliveryMethod,
    coupon: Option<&Discount>,
) -> Result<PriceBreakdown, DomainError> {
    check_weight(weight_kg)?;
    let zero = BigDecimal::from(0);

    let base_price = price_per_kg * weight_kg;
    let extras_price = extras
        .iter()
        .fold(zero.clone(), |sum, extra| sum + &extra.price);
    let subtotal = &base_price + &extras_price;

    let pickup_discount = match delivery {
        DeliveryMethod::Pickup => percent_of(&subtotal, &BigDecimal::from(PICKUP_DISCOUNT_PERCENT)),
        DeliveryMethod::Home => zero.clone(),
    };
    let coupon_discount = match coupon {
        Some(Discount::Percentage(percent)) => percent_of(&subtotal, percent),
        Some(Discount::Fixed(amount)) => amount.clone(),
        None => zero.clone(),
    };

    let total_discount = &pickup_discount + &coupon_discount;
    let raw_total = &subtotal - &total_discount;
    let clamped = raw_total < zero;
    let total = if clamped { zero } else { raw_total };

    Ok(PriceBreakdown {
        base_price,
        extras_price,
        subtotal,
        pickup_discount,
        coupon_discount,
        total_discount,
        total,
        clamped,
    })
}
