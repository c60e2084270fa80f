use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{Result, Validator};

/// Cart item joined with its product
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CartLine {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub image_url: String,
}

impl CartLine {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItemView {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub image_url: String,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: Decimal,
}

impl From<Vec<CartLine>> for CartView {
    fn from(lines: Vec<CartLine>) -> Self {
        let items: Vec<CartItemView> = lines
            .into_iter()
            .map(|line| CartItemView {
                subtotal: line.subtotal(),
                id: line.id,
                product_id: line.product_id,
                quantity: line.quantity,
                name: line.name,
                price: line.price,
                image_url: line.image_url,
            })
            .collect();

        let total = items.iter().map(|item| item.subtotal).sum();

        Self { items, total }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: i64,
    pub quantity: i32,
}

impl AddToCartRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        v.min("product_id", self.product_id, 1)
            .min("quantity", i64::from(self.quantity), 1);
        v.finish()
    }
}
