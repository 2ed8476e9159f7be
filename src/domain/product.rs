//! Products, reviews and categories.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// Fallback artwork for products added without any image.
pub const PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1550009158-9ebf69173e03?w=500&q=80";

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    /// Category slugs this product is tagged with.
    pub categories: Vec<String>,
    pub images: Vec<String>,
    /// Arithmetic mean of review ratings, one decimal place.
    pub rating: Decimal,
    pub review_count: i32,
    pub reviews: Json<Vec<Review>>,
    pub provider: String,
    pub shipping: String,
    pub description: String,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Image shown in carts and receipts.
    pub fn display_image(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_IMAGE)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub verified: bool,
}

/// Mean review rating rounded to one decimal place; 0 with no reviews.
pub fn mean_rating(reviews: &[Review]) -> Decimal {
    if reviews.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = reviews.iter().map(|r| Decimal::from(r.rating)).sum();
    (sum / Decimal::from(reviews.len() as u64))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Derive a slug: lower-cased, whitespace runs collapsed to single hyphens.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: Uuid::new_v4(),
            user_id: None,
            user_name: "Alex Chen".into(),
            rating,
            comment: "Solid gear".into(),
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            verified: false,
        }
    }

    #[test]
    fn rating_is_mean_of_reviews() {
        // A 3-star review joining a single 5-star review lands on exactly 4.0.
        let reviews = vec![review(5), review(3)];
        assert_eq!(mean_rating(&reviews), Decimal::new(40, 1));
    }

    #[test]
    fn rating_rounds_to_one_decimal() {
        let reviews = vec![review(5), review(4), review(4)];
        // 13/3 = 4.333... -> 4.3
        assert_eq!(mean_rating(&reviews), Decimal::new(43, 1));
    }

    #[test]
    fn no_reviews_means_zero_rating() {
        assert_eq!(mean_rating(&[]), Decimal::ZERO);
    }

    #[test]
    fn slugs_are_lowercased_and_hyphenated() {
        assert_eq!(slugify("Smart Home Gear"), "smart-home-gear");
        assert_eq!(slugify("Audio"), "audio");
        assert_eq!(slugify("  Double  Spaced "), "double-spaced");
    }
}
