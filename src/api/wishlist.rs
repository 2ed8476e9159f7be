//! Server-side wishlist copy for signed-in shoppers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::AppState;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredWishlist {
    pub user_id: Uuid,
    pub product_ids: Vec<Uuid>,
}

pub async fn upsert(
    State(s): State<AppState>,
    Json(payload): Json<StoredWishlist>,
) -> Result<Json<StoredWishlist>> {
    let wishlist = sqlx::query_as::<_, StoredWishlist>(
        "INSERT INTO wishlists (user_id, product_ids) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE SET product_ids = EXCLUDED.product_ids, updated_at = NOW() \
         RETURNING user_id, product_ids",
    )
    .bind(payload.user_id)
    .bind(&payload.product_ids)
    .fetch_one(&s.db)
    .await?;
    Ok(Json(wishlist))
}

pub async fn fetch(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StoredWishlist>> {
    let wishlist = sqlx::query_as::<_, StoredWishlist>(
        "SELECT user_id, product_ids FROM wishlists WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(&s.db)
    .await?
    .unwrap_or(StoredWishlist {
        user_id,
        product_ids: Vec::new(),
    });
    Ok(Json(wishlist))
}
