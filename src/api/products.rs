//! Product catalog and reviews.

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
use crate::domain::product::{mean_rating, Product, Review};
use crate::{Error, Result};

pub async fn list(State(s): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products =
        sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
            .fetch_all(&s.db)
            .await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductPayload {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub provider: Option<String>,
    pub shipping: Option<String>,
    #[serde(default)]
    pub description: String,
    pub in_stock: Option<bool>,
}

impl ProductPayload {
    fn check(&self) -> Result<()> {
        self.validate()?;
        if self.price < Decimal::ZERO {
            return Err(Error::Invalid("Price cannot be negative".into()));
        }
        Ok(())
    }
}

pub async fn create(
    State(s): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<(StatusCode, Json<Product>)> {
    payload.check()?;
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, price, original_price, categories, images, provider, shipping, description, in_stock) \
         VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'Neon Tech Official'), COALESCE($8, 'Neon Direct'), $9, COALESCE($10, TRUE)) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&payload.name)
    .bind(payload.price)
    .bind(payload.original_price)
    .bind(&payload.categories)
    .bind(&payload.images)
    .bind(&payload.provider)
    .bind(&payload.shipping)
    .bind(&payload.description)
    .bind(payload.in_stock)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<Product>> {
    payload.check()?;
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $2, price = $3, original_price = $4, categories = $5, \
         images = $6, provider = COALESCE($7, provider), shipping = COALESCE($8, shipping), \
         description = $9, in_stock = COALESCE($10, in_stock), updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(payload.price)
    .bind(payload.original_price)
    .bind(&payload.categories)
    .bind(&payload.images)
    .bind(&payload.provider)
    .bind(&payload.shipping)
    .bind(&payload.description)
    .bind(payload.in_stock)
    .fetch_optional(&s.db)
    .await?
    .ok_or(Error::NotFound("Product"))?;
    Ok(Json(product))
}

/// Hard delete. Orders keep their own line-item snapshots, so history is
/// unaffected.
pub async fn remove(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&s.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Product"));
    }
    Ok(Json(serde_json::json!({ "message": "Product removed" })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewPayload {
    #[validate(length(min = 1, message = "Reviewer name is required"))]
    pub user_name: String,
    #[validate(range(min = 0, max = 5, message = "Rating must be between 0 and 5"))]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub user_id: Option<Uuid>,
}

/// Append a review and recompute the product's mean rating and review count.
pub async fn add_review(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewPayload>,
) -> Result<(StatusCode, Json<Product>)> {
    payload.validate()?;
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(Error::NotFound("Product"))?;

    let mut reviews = product.reviews.0;
    reviews.push(Review {
        id: Uuid::new_v4(),
        user_id: payload.user_id,
        user_name: payload.user_name,
        rating: payload.rating,
        comment: payload.comment,
        date: Utc::now().date_naive(),
        verified: false,
    });
    let rating = mean_rating(&reviews);
    let count = reviews.len() as i32;

    let updated = sqlx::query_as::<_, Product>(
        "UPDATE products SET reviews = $2, rating = $3, review_count = $4, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(Db(reviews))
    .bind(rating)
    .bind(count)
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(updated)))
}
