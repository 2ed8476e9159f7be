//! Coupon records and discount evaluation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PERCENTAGE: &str = "percentage";
pub const FIXED: &str = "fixed";

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount: Decimal,
    /// `percentage` or `fixed`.
    #[serde(rename = "type")]
    pub kind: String,
    pub active: bool,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Expired coupons are invalid even while `active` is still set.
    /// A coupon is good through 23:59:59 of its expiry date.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry_date {
            Some(expiry) => now.date_naive() > expiry,
            None => false,
        }
    }
}

/// Outcome of a successful coupon application.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CouponResult {
    pub code: String,
    pub discount: Decimal,
    pub final_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CouponError {
    #[error("Invalid or expired coupon code")]
    Invalid,
}

/// Match `code` case-insensitively against active, unexpired coupons and
/// compute the discounted total, clamped so it never goes below zero.
pub fn apply(
    coupons: &[Coupon],
    code: &str,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> Result<CouponResult, CouponError> {
    let coupon = coupons
        .iter()
        .find(|c| c.active && c.code.eq_ignore_ascii_case(code) && !c.is_expired(now))
        .ok_or(CouponError::Invalid)?;

    let discount = if coupon.kind == PERCENTAGE {
        subtotal * coupon.discount / Decimal::ONE_HUNDRED
    } else {
        coupon.discount
    };

    Ok(CouponResult {
        code: coupon.code.clone(),
        discount,
        final_total: (subtotal - discount).max(Decimal::ZERO),
    })
}
