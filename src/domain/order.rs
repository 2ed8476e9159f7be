//! Orders: line-item snapshots, display numbers and the status lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::cart::CartLine;

/// Inclusive range for the human-facing 8-digit order number.
pub const DISPLAY_ID_MIN: u32 = 10_000_000;
pub const DISPLAY_ID_MAX: u32 = 99_999_999;

/// A product snapshot frozen into an order at purchase time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub image: Option<String>,
}

impl LineItem {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

impl From<CartLine> for LineItem {
    fn from(line: CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name,
            price: line.price,
            quantity: line.quantity,
            image: Some(line.image),
        }
    }
}

/// Customer details captured at checkout.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl CustomerInfo {
    /// First name, for greeting lines in receipts.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("Customer")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    CancelledByCustomer,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::CancelledByCustomer => "cancelled_by_customer",
        }
    }

    pub fn is_cancelled(self) -> bool {
        matches!(self, Self::Cancelled | Self::CancelledByCustomer)
    }

    /// The only self-service transition: customers may back out while the
    /// order is still pending or processing.
    pub fn customer_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Transitions worth an email. Pending/processing churn stays quiet.
    pub fn notifies_customer(self) -> bool {
        matches!(
            self,
            Self::Shipped | Self::Delivered | Self::Cancelled | Self::CancelledByCustomer
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "cancelled_by_customer" => Ok(Self::CancelledByCustomer),
            _ => Err(UnknownStatus),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status")]
pub struct UnknownStatus;

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    /// Human-facing 8-digit order number, distinct from the storage id.
    pub display_id: String,
    pub user_id: Option<Uuid>,
    pub customer: Json<CustomerInfo>,
    pub items: Json<Vec<LineItem>>,
    pub total: Decimal,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub status: String,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Parsed status; rows only ever hold the six known values.
    pub fn status(&self) -> OrderStatus {
        self.status.parse().unwrap_or_default()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::subtotal).sum()
    }
}

/// Draw a candidate display number. Uniqueness is enforced by the storage
/// index; callers retry on collision.
pub fn generate_display_id() -> String {
    rand::thread_rng()
        .gen_range(DISPLAY_ID_MIN..=DISPLAY_ID_MAX)
        .to_string()
}
