//! Server-side cart copy for signed-in shoppers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as Db;
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::cart::CartLine;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredCart {
    pub user_id: Uuid,
    pub items: Db<Vec<CartLine>>,
}

/// Replace the user's cart wholesale. The client owns the merge logic, so
/// the server just keeps the latest snapshot.
pub async fn upsert(
    State(s): State<AppState>,
    Json(payload): Json<StoredCart>,
) -> Result<Json<StoredCart>> {
    let cart = sqlx::query_as::<_, StoredCart>(
        "INSERT INTO carts (user_id, items) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW() \
         RETURNING user_id, items",
    )
    .bind(payload.user_id)
    .bind(&payload.items)
    .fetch_one(&s.db)
    .await?;
    Ok(Json(cart))
}

/// A user with no stored cart gets an empty one, not a 404.
pub async fn fetch(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StoredCart>> {
    let cart = sqlx::query_as::<_, StoredCart>(
        "SELECT user_id, items FROM carts WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(&s.db)
    .await?
    .unwrap_or(StoredCart {
        user_id,
        items: Db(Vec::new()),
    });
    Ok(Json(cart))
}
