//! Business types and pure retail logic.

pub mod analytics;
pub mod cart;
pub mod coupon;
pub mod currency;
pub mod order;
pub mod product;
pub mod user;
