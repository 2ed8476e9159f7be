//! Coupon management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::domain::coupon::{Coupon, FIXED, PERCENTAGE};
use crate::{Error, Result};

pub async fn list(State(s): State<AppState>) -> Result<Json<Vec<Coupon>>> {
    let coupons = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons ORDER BY created_at DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(coupons))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CouponPayload {
    #[validate(length(min = 1, message = "Coupon code is required"))]
    pub code: String,
    pub discount: Decimal,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub active: Option<bool>,
    pub expiry_date: Option<NaiveDate>,
}

fn default_kind() -> String {
    PERCENTAGE.to_string()
}

pub async fn create(
    State(s): State<AppState>,
    Json(payload): Json<CouponPayload>,
) -> Result<(StatusCode, Json<Coupon>)> {
    payload.validate()?;
    if payload.kind != PERCENTAGE && payload.kind != FIXED {
        return Err(Error::Invalid(
            "Coupon type must be 'percentage' or 'fixed'".into(),
        ));
    }
    let coupon = sqlx::query_as::<_, Coupon>(
        "INSERT INTO coupons (id, code, discount, kind, active, expiry_date) \
         VALUES ($1, $2, $3, $4, COALESCE($5, TRUE), $6) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&payload.code)
    .bind(payload.discount)
    .bind(&payload.kind)
    .bind(payload.active)
    .bind(payload.expiry_date)
    .fetch_one(&s.db)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Invalid("Coupon code already exists".into())
        }
        other => Error::Database(other),
    })?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

pub async fn remove(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Coupon"));
    }
    Ok(Json(serde_json::json!({ "message": "Coupon removed" })))
}
