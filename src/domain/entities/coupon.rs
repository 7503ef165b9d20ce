use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app_error::{AppError, AppResult};

/// How long a coupon keeps discounting once redeemed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "duration", rename_all = "snake_case")]
pub enum CouponDuration {
    Once,
    Repeating { duration_in_months: u32 },
    Forever,
}

impl CouponDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponDuration::Once => "once",
            CouponDuration::Repeating { .. } => "repeating",
            CouponDuration::Forever => "forever",
        }
    }
}

/// Either a percentage or a fixed amount, never both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discount {
    PercentOff(u32),
    AmountOff { amount_cents: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Used verbatim as the provider's coupon id
    pub code: String,
    pub duration: CouponDuration,
    pub discount: Discount,
    pub max_redemptions: Option<u32>,
    pub redeem_by: Option<DateTime<Utc>>,
}

impl Coupon {
    pub fn new(code: impl Into<String>, duration: CouponDuration, discount: Discount) -> Self {
        Self {
            code: code.into(),
            duration,
            discount,
            max_redemptions: None,
            redeem_by: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Field checks done before a coupon is stored. Code uniqueness is left to storage.
    pub fn validate(&self) -> AppResult<()> {
        if self.code.trim().is_empty() {
            return Err(AppError::InvalidInput("Coupon code is required".into()));
        }

        match self.discount {
            Discount::PercentOff(0) => {
                return Err(AppError::InvalidInput(
                    "percent_off must be greater than zero".into(),
                ));
            }
            Discount::PercentOff(p) if p > 100 => {
                return Err(AppError::InvalidInput(
                    "percent_off cannot exceed 100".into(),
                ));
            }
            Discount::AmountOff { amount_cents } if amount_cents <= 0 => {
                return Err(AppError::InvalidInput(
                    "amount_off must be greater than zero".into(),
                ));
            }
            _ => {}
        }

        if let CouponDuration::Repeating {
            duration_in_months: 0,
        } = self.duration
        {
            return Err(AppError::InvalidInput(
                "duration_in_months must be set for a repeating coupon".into(),
            ));
        }

        if self.max_redemptions == Some(0) {
            return Err(AppError::InvalidInput(
                "max_redemptions must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
