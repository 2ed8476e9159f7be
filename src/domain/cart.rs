//! Cart lines and merge rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::Product;

/// A denormalized snapshot of a product in a cart.
///
/// Name, price and image are copied at add time so the line survives later
/// product edits or deletion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub image: String,
}

impl CartLine {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartLine::subtotal).sum()
    }

    /// Add one unit of `product`: merge into an existing line for the same
    /// product, otherwise append a new line with quantity 1.
    pub fn add_item(&mut self, product: &Product) {
        if let Some(line) = self.items.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity += 1;
            return;
        }
        self.items.push(CartLine {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: 1,
            image: product.display_image().to_string(),
        });
    }

    /// Remove the line for `product_id`; absent lines are a no-op.
    pub fn remove_item(&mut self, product_id: Uuid) {
        self.items.retain(|l| l.product_id != product_id);
    }

    /// Adjust a line's quantity by `delta`, clamped at zero. A line that
    /// reaches zero is dropped rather than kept around empty.
    pub fn update_quantity(&mut self, product_id: Uuid, delta: i64) {
        for line in &mut self.items {
            if line.product_id == product_id {
                line.quantity = (i64::from(line.quantity) + delta).max(0) as u32;
            }
        }
        self.items.retain(|l| l.quantity > 0);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    pub(crate) fn product(name: &str, price: Decimal) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.into(),
            price,
            original_price: None,
            categories: vec!["gaming".into()],
            images: vec![],
            rating: Decimal::ZERO,
            review_count: 0,
            reviews: Json(vec![]),
            provider: "Neon Tech Official".into(),
            shipping: "Neon Direct".into(),
            description: String::new(),
            in_stock: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn adding_same_product_twice_merges_lines() {
        let p = product("Cyberpunk Headphones", Decimal::new(19999, 2));
        let mut cart = Cart::default();
        cart.add_item(&p);
        cart.add_item(&p);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[test]
    fn missing_image_falls_back_to_placeholder() {
        let p = product("Neon Gaming Mouse", Decimal::new(7999, 2));
        let mut cart = Cart::default();
        cart.add_item(&p);
        assert_eq!(cart.items[0].image, crate::domain::product::PLACEHOLDER_IMAGE);
    }

    #[test]
    fn quantity_reaching_zero_removes_the_line() {
        let p = product("Mechanical Keyboard", Decimal::new(14999, 2));
        let mut cart = Cart::default();
        cart.add_item(&p);
        cart.update_quantity(p.id, -1);
        assert!(cart.is_empty());
    }

    #[test]
    fn quantity_clamps_at_zero() {
        let p = product("Mechanical Keyboard", Decimal::new(14999, 2));
        let mut cart = Cart::default();
        cart.add_item(&p);
        cart.update_quantity(p.id, -5);
        assert!(cart.is_empty());
    }

    #[test]
    fn removing_absent_line_is_a_noop() {
        let mut cart = Cart::default();
        cart.remove_item(Uuid::new_v4());
        assert!(cart.is_empty());
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let a = product("A", Decimal::new(50, 0));
        let b = product("B", Decimal::new(25, 0));
        let mut cart = Cart::default();
        cart.add_item(&a);
        cart.add_item(&a);
        cart.add_item(&b);
        assert_eq!(cart.subtotal(), Decimal::new(125, 0));
    }
}
