//! Admin dashboard metrics endpoint.

use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;

use crate::api::{settings, AppState};
use crate::domain::analytics::{self, DashboardMetrics};
use crate::domain::order::Order;
use crate::domain::product::{Category, Product};
use crate::Result;

const DEFAULT_REVENUE_GOAL: i64 = 5000;

pub async fn dashboard(State(s): State<AppState>) -> Result<Json<DashboardMetrics>> {
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders")
        .fetch_all(&s.db)
        .await?;
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products")
        .fetch_all(&s.db)
        .await?;
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories")
        .fetch_all(&s.db)
        .await?;
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&s.db)
        .await?;

    let goal = settings::value_or(&s.db, "revenue_goal", serde_json::json!(DEFAULT_REVENUE_GOAL))
        .await?;
    let revenue_goal = goal
        .as_f64()
        .and_then(Decimal::from_f64_retain)
        .unwrap_or_else(|| Decimal::from(DEFAULT_REVENUE_GOAL));

    let metrics = analytics::compute(
        &orders,
        &products,
        &categories,
        user_count.max(0) as u64,
        revenue_goal,
    );
    Ok(Json(metrics))
}
