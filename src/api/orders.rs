//! Order placement and lifecycle.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json as Db;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::domain::coupon::{self, Coupon};
use crate::domain::currency::Currency;
use crate::domain::order::{self, LineItem, Order, OrderStatus};
use crate::notify::NotifyJob;
use crate::{Error, Result};

/// Attempts at drawing an unused display number before giving up.
const DISPLAY_ID_ATTEMPTS: u32 = 5;

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "ZIP code is required"))]
    pub zip: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrderPayload {
    pub items: Vec<LineItem>,
    #[validate]
    pub customer: CustomerPayload,
    pub user_id: Option<Uuid>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub coupon_code: Option<String>,
    pub currency: Option<String>,
}

pub async fn create(
    State(s): State<AppState>,
    Json(payload): Json<PlaceOrderPayload>,
) -> Result<(StatusCode, Json<Order>)> {
    if payload.items.is_empty() {
        return Err(Error::Invalid("No order items".into()));
    }
    payload.validate()?;

    let subtotal: Decimal = payload.items.iter().map(LineItem::subtotal).sum();
    let total = match &payload.coupon_code {
        Some(code) => {
            let coupons = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE active")
                .fetch_all(&s.db)
                .await?;
            coupon::apply(&coupons, code, subtotal, Utc::now())
                .map_err(|err| Error::Invalid(err.to_string()))?
                .final_total
        }
        None => subtotal,
    };

    let currency: Currency = payload
        .currency
        .as_deref()
        .unwrap_or("USD")
        .parse()
        .map_err(|_| Error::Invalid("Unknown currency".into()))?;

    let new_order = NewOrder {
        items: payload.items,
        customer: order::CustomerInfo {
            name: payload.customer.name,
            email: payload.customer.email,
            address: payload.customer.address,
            city: payload.customer.city,
            zip: payload.customer.zip,
            phone: payload.customer.phone,
        },
        user_id: payload.user_id,
        payment_method: payload.payment_method,
        transaction_id: payload.transaction_id,
        total,
        currency,
    };
    let order = insert_with_display_id(&s.db, &new_order).await?;

    // Cart clearing is an independent write: the shopper's local copy clears
    // regardless, so a failure here only costs a stale remote record.
    if let Some(user_id) = order.user_id {
        if let Err(err) = sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(&s.db)
            .await
        {
            tracing::warn!(%user_id, error = %err, "failed to clear remote cart after checkout");
        }
    }

    // Soft-fail: the receipt email never blocks or fails the placement.
    s.notify
        .enqueue(NotifyJob::Confirmation(Box::new(order.clone())));

    Ok((StatusCode::CREATED, Json(order)))
}

struct NewOrder {
    items: Vec<LineItem>,
    customer: order::CustomerInfo,
    user_id: Option<Uuid>,
    payment_method: Option<String>,
    transaction_id: Option<String>,
    total: Decimal,
    currency: Currency,
}

/// Insert the order, retrying with a fresh display number on collision.
async fn insert_with_display_id(db: &sqlx::PgPool, new: &NewOrder) -> Result<Order> {
    for _ in 0..DISPLAY_ID_ATTEMPTS {
        let display_id = order::generate_display_id();
        let inserted = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (id, display_id, user_id, customer, items, total, payment_method, transaction_id, currency, exchange_rate) \
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'card'), $8, $9, $10) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&display_id)
        .bind(new.user_id)
        .bind(Db(&new.customer))
        .bind(Db(&new.items))
        .bind(new.total)
        .bind(&new.payment_method)
        .bind(&new.transaction_id)
        .bind(new.currency.as_str())
        .bind(new.currency.rate())
        .fetch_one(db)
        .await;

        match inserted {
            Ok(order) => return Ok(order),
            Err(sqlx::Error::Database(db))
                if db.is_unique_violation()
                    && db.constraint() == Some("orders_display_id_key") =>
            {
                tracing::warn!(%display_id, "order number collision, drawing again");
            }
            Err(other) => return Err(other.into()),
        }
    }
    Err(Error::Invalid("Could not allocate an order number".into()))
}

pub async fn list(State(s): State<AppState>) -> Result<Json<Vec<Order>>> {
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(orders))
}

/// Look an order up by internal id first (when the path segment parses as
/// one), falling back to the human-facing display number.
async fn find_order(db: &sqlx::PgPool, id: &str) -> Result<Order> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        let by_id = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(uuid)
            .fetch_optional(db)
            .await?;
        if let Some(order) = by_id {
            return Ok(order);
        }
    }
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE display_id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(Error::NotFound("Order"))
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: String,
}

pub async fn update_status(
    State(s): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Order>> {
    let next: OrderStatus = payload
        .status
        .parse()
        .map_err(|_| Error::Invalid(format!("Unknown order status '{}'", payload.status)))?;

    let order = find_order(&s.db, &id).await?;
    let current = order.status();

    // Self-service cancellation is only honored while the order is still
    // pending or processing; every other transition is admin territory.
    if next == OrderStatus::CancelledByCustomer && !current.customer_cancellable() {
        return Err(Error::Invalid(
            "Order can no longer be cancelled by the customer".into(),
        ));
    }

    let updated = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(order.id)
    .bind(next.as_str())
    .fetch_one(&s.db)
    .await?;

    if current != next && next.notifies_customer() {
        s.notify
            .enqueue(NotifyJob::StatusUpdate(Box::new(updated.clone()), next));
    }
    Ok(Json(updated))
}

pub async fn remove(
    State(s): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let order = find_order(&s.db, &id).await?;
    sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(order.id)
        .execute(&s.db)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Order removed" })))
}

/// Bulk cleanup: both cancellation variants share the `cancelled` prefix.
pub async fn clear_cancelled(State(s): State<AppState>) -> Result<Json<serde_json::Value>> {
    sqlx::query("DELETE FROM orders WHERE status LIKE 'cancelled%'")
        .execute(&s.db)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Cancelled orders cleared" })))
}
