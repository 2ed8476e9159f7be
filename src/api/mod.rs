//! REST surface: one module per resource, axum handlers over sqlx.

pub mod analytics;
pub mod cart;
pub mod categories;
pub mod coupons;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;
pub mod wishlist;

use axum::routing::{delete, get, post, put};
use axum::{Json, Router};

use crate::notify::NotifyHandle;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub notify: NotifyHandle,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "API is running..." }))
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "neonmarket"})) }),
        )
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/:id",
            put(products::update).delete(products::remove),
        )
        .route("/api/products/:id/reviews", post(products::add_review))
        .route(
            "/api/categories",
            get(categories::list).post(categories::create),
        )
        .route("/api/categories/:id", delete(categories::remove))
        .route("/api/coupons", get(coupons::list).post(coupons::create))
        .route("/api/coupons/:id", delete(coupons::remove))
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/api/orders/status/cancelled", delete(orders::clear_cancelled))
        .route("/api/orders/:id/status", put(orders::update_status))
        .route("/api/orders/:id", delete(orders::remove))
        .route("/api/cart", post(cart::upsert))
        .route("/api/cart/:user_id", get(cart::fetch))
        .route("/api/wishlist", post(wishlist::upsert))
        .route("/api/wishlist/:user_id", get(wishlist::fetch))
        .route("/api/users", get(users::list))
        .route("/api/users/login", post(users::login))
        .route("/api/users/register", post(users::register))
        .route("/api/users/:id", put(users::update_profile).delete(users::remove))
        .route("/api/users/:id/role", put(users::update_role))
        .route("/api/settings", get(settings::list).post(settings::upsert))
        .route("/api/analytics/dashboard", get(analytics::dashboard))
        .with_state(state)
}
