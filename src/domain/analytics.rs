//! Read-side dashboard metrics.
//!
//! Pure computations over already-loaded collections; every metric degrades
//! to zero on empty input.

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};
use crate::domain::product::{Category, Product};

#[derive(Clone, Debug, Serialize)]
pub struct DashboardMetrics {
    /// Sum of totals over delivered and shipped orders.
    pub revenue: Decimal,
    pub average_order_value: Decimal,
    /// Fulfilled orders per registered user, as a percentage. A heuristic,
    /// not a rigorous funnel metric.
    pub conversion_rate: f64,
    /// Percent of the revenue goal reached, capped at 100.
    pub goal_progress: u32,
    pub revenue_goal: Decimal,
    pub category_revenue: Vec<CategoryRevenue>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryRevenue {
    pub name: String,
    pub revenue: Decimal,
}

pub fn compute(
    orders: &[Order],
    products: &[Product],
    categories: &[Category],
    user_count: u64,
    revenue_goal: Decimal,
) -> DashboardMetrics {
    let fulfilled: Vec<&Order> = orders
        .iter()
        .filter(|o| matches!(o.status(), OrderStatus::Delivered | OrderStatus::Shipped))
        .collect();

    let revenue: Decimal = fulfilled.iter().map(|o| o.total).sum();
    let average_order_value = revenue / Decimal::from(fulfilled.len().max(1) as u64);
    let conversion_rate = fulfilled.len() as f64 / user_count.max(1) as f64 * 100.0;

    let goal_progress = if revenue_goal > Decimal::ZERO {
        (revenue / revenue_goal * Decimal::ONE_HUNDRED)
            .round()
            .to_u32()
            .unwrap_or(u32::MAX)
            .min(100)
    } else {
        0
    };

    DashboardMetrics {
        revenue,
        average_order_value,
        conversion_rate,
        goal_progress,
        revenue_goal,
        category_revenue: category_revenue(orders, products, categories),
    }
}

/// Line-item subtotals of non-cancelled orders, attributed to every category
/// the purchased product is tagged with, sorted highest first.
fn category_revenue(
    orders: &[Order],
    products: &[Product],
    categories: &[Category],
) -> Vec<CategoryRevenue> {
    let by_id: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut rows: Vec<CategoryRevenue> = categories
        .iter()
        .map(|cat| {
            let revenue = orders
                .iter()
                .filter(|o| !o.status().is_cancelled())
                .flat_map(|o| o.items.iter())
                .filter(|item| {
                    by_id
                        .get(&item.product_id)
                        .is_some_and(|p| p.categories.contains(&cat.slug))
                })
                .map(|item| item.subtotal())
                .sum();
            CategoryRevenue {
                name: cat.name.clone(),
                revenue,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{CustomerInfo, LineItem};
    use chrono::Utc;
    use sqlx::types::Json;

    fn order(status: &str, total: i64, items: Vec<LineItem>) -> Order {
        Order {
            id: Uuid::new_v4(),
            display_id: "10000001".into(),
            user_id: None,
            customer: Json(CustomerInfo {
                name: "Alex Chen".into(),
                email: "alex@example.com".into(),
                address: "1 Neon Way".into(),
                city: "Karachi".into(),
                zip: "74000".into(),
                phone: None,
            }),
            items: Json(items),
            total: Decimal::new(total, 0),
            payment_method: "card".into(),
            transaction_id: None,
            status: status.into(),
            currency: "USD".into(),
            exchange_rate: Decimal::ONE,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(product_id: Uuid, price: i64, quantity: u32) -> LineItem {
        LineItem {
            product_id,
            name: "Gear".into(),
            price: Decimal::new(price, 0),
            quantity,
            image: None,
        }
    }

    fn product_in(slug: &str) -> Product {
        let mut p = crate::domain::cart::tests::product("Gear", Decimal::new(100, 0));
        p.categories = vec![slug.into()];
        p
    }

    fn category(name: &str, slug: &str) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_collections_degrade_to_zero() {
        let metrics = compute(&[], &[], &[], 0, Decimal::new(5000, 0));
        assert_eq!(metrics.revenue, Decimal::ZERO);
        assert_eq!(metrics.average_order_value, Decimal::ZERO);
        assert_eq!(metrics.conversion_rate, 0.0);
        assert_eq!(metrics.goal_progress, 0);
    }

    #[test]
    fn revenue_counts_delivered_and_shipped_only() {
        let orders = vec![
            order("delivered", 200, vec![]),
            order("shipped", 100, vec![]),
            order("pending", 999, vec![]),
            order("cancelled", 999, vec![]),
        ];
        let metrics = compute(&orders, &[], &[], 10, Decimal::new(600, 0));
        assert_eq!(metrics.revenue, Decimal::new(300, 0));
        assert_eq!(metrics.average_order_value, Decimal::new(150, 0));
        assert_eq!(metrics.conversion_rate, 20.0);
        assert_eq!(metrics.goal_progress, 50);
    }

    #[test]
    fn goal_progress_caps_at_one_hundred() {
        let orders = vec![order("delivered", 10_000, vec![])];
        let metrics = compute(&orders, &[], &[], 1, Decimal::new(500, 0));
        assert_eq!(metrics.goal_progress, 100);
    }

    #[test]
    fn category_revenue_skips_cancelled_orders() {
        let gaming = product_in("gaming");
        let audio = product_in("audio");
        let orders = vec![
            order("delivered", 200, vec![line(gaming.id, 100, 2)]),
            order("pending", 50, vec![line(audio.id, 50, 1)]),
            order("cancelled_by_customer", 400, vec![line(gaming.id, 400, 1)]),
        ];
        let products = vec![gaming, audio];
        let categories = vec![category("Gaming", "gaming"), category("Audio", "audio")];

        let metrics = compute(&orders, &products, &categories, 5, Decimal::new(5000, 0));
        assert_eq!(
            metrics.category_revenue,
            vec![
                CategoryRevenue { name: "Gaming".into(), revenue: Decimal::new(200, 0) },
                CategoryRevenue { name: "Audio".into(), revenue: Decimal::new(50, 0) },
            ]
        );
    }
}
