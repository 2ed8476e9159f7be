//! Key/value store for admin-tunable settings.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use sqlx::types::Json as Db;

use crate::api::AppState;
use crate::Result;

#[derive(sqlx::FromRow)]
struct SettingRow {
    key: String,
    value: Db<serde_json::Value>,
}

/// All settings folded into one JSON object.
pub async fn list(State(s): State<AppState>) -> Result<Json<HashMap<String, serde_json::Value>>> {
    let rows = sqlx::query_as::<_, SettingRow>("SELECT key, value FROM settings")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(rows.into_iter().map(|r| (r.key, r.value.0)).collect()))
}

#[derive(Debug, Deserialize)]
pub struct SettingPayload {
    pub key: String,
    pub value: serde_json::Value,
}

pub async fn upsert(
    State(s): State<AppState>,
    Json(payload): Json<SettingPayload>,
) -> Result<Json<serde_json::Value>> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES ($1, $2) \
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
    )
    .bind(&payload.key)
    .bind(Db(&payload.value))
    .execute(&s.db)
    .await?;
    Ok(Json(serde_json::json!({ "message": "Setting saved" })))
}

/// Fetch one setting, falling back to a default when unset.
pub async fn value_or(
    db: &sqlx::PgPool,
    key: &str,
    fallback: serde_json::Value,
) -> Result<serde_json::Value> {
    let row = sqlx::query_as::<_, SettingRow>("SELECT key, value FROM settings WHERE key = $1")
        .bind(key)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|r| r.value.0).unwrap_or(fallback))
}
