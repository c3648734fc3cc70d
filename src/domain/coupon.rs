use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::DomainError;
use super::pricing::format_cents;

/// What a coupon takes off an order. Exactly one kind per coupon.
#[derive(Debug, Clone, PartialEq)]
pub enum Discount {
    Percentage(BigDecimal),
    Fixed(BigDecimal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coupon {
    pub code: String,
    pub discount: Discount,
    pub active: bool,
    pub valid_to: Option<DateTime<Utc>>,
}

impl Coupon {
    /// Build a coupon from its stored columns, enforcing that exactly one of
    /// `percentage` and `fixed_amount` is set.
    pub fn from_parts(
        code: &str,
        percentage: Option<BigDecimal>,
        fixed_amount: Option<BigDecimal>,
        active: bool,
        valid_to: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        let discount = match (percentage, fixed_amount) {
            (Some(p), None) => Discount::Percentage(p),
            (None, Some(a)) => Discount::Fixed(a),
            _ => {
                return Err(DomainError::Validation(format!(
                    "coupon {} must carry either a percentage or a fixed amount",
                    code
                )))
            }
        };
        Ok(Self {
            code: normalize_code(code),
            discount,
            active,
            valid_to,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_to.is_some_and(|valid_to| valid_to <= now)
    }
}

pub(crate) fn trim_zeros(amount: &BigDecimal) -> String {
    let text = format_cents(amount);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CouponResult {
    pub valid: bool,
    pub discount: Option<Discount>,
    pub message: String,
}

impl CouponResult {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            discount: None,
            message: message.into(),
        }
    }
}

/// Judge a looked-up coupon. Expiry wins over the active flag so an expired
/// coupon always reports as expired.
pub fn evaluate(coupon: Option<&Coupon>, now: DateTime<Utc>) -> CouponResult {
    let Some(coupon) = coupon else {
        return CouponResult::invalid("Coupon code is invalid");
    };
    if coupon.is_expired(now) {
        return CouponResult::invalid("Coupon code has expired");
    }
    if !coupon.active {
        return CouponResult::invalid("Coupon code is no longer active");
    }
    let message = match &coupon.discount {
        Discount::Percentage(p) => format!("{}% discount applied", trim_zeros(p)),
        Discount::Fixed(a) => format!("${} discount applied", format_cents(a)),
    };
    CouponResult {
        valid: true,
        discount: Some(coupon.discount.clone()),
        message,
    }
}
