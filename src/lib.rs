//! NeonMarket Storefront Service
//!
//! Retail backend for the NeonMarket storefront.
//!
//! ## Features
//! - Product catalog, categories and coupons
//! - Cart and wishlist records, plus a client-core cart manager
//! - Order placement with a human-facing display number and status lifecycle
//! - Best-effort email notifications (confirmation + status updates)
//! - Admin dashboard analytics

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub mod api;
pub mod config;
pub mod domain;
pub mod notify;
pub mod storefront;

/// Service-wide error type.
///
/// Handlers map these onto the status codes the storefront expects:
/// 400 for rejected input, 404 for missing records, 401 for failed logins
/// and 500 for storage failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Invalid(errors.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Database(err) => {
                tracing::error!(error = %err, "request failed on storage");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
