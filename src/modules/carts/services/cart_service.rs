use std::sync::Arc;

use tracing::debug;

use crate::core::{AppError, Result};
use crate::modules::carts::models::{AddToCartRequest, CartView};
use crate::modules::carts::repositories::CartRepository;
use crate::modules::products::ProductRepository;

pub struct CartService {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { carts, products }
    }

    pub async fn get(&self, user_id: i64) -> Result<CartView> {
        let lines = self.carts.lines(user_id).await?;
        Ok(CartView::from(lines))
    }

    /// Add a product, checking stock against what is already in the cart
    pub async fn add(&self, user_id: i64, request: AddToCartRequest) -> Result<CartView> {
        request.validate()?;

        let product = self
            .products
            .find_by_id(request.product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))?;

        let in_cart = self.carts.quantity_of(user_id, product.id).await?;
        let wanted = i64::from(in_cart) + i64::from(request.quantity);

        if i64::from(product.stock) < wanted {
            return Err(AppError::InsufficientStock(format!(
                "Only {} of '{}' in stock",
                product.stock, product.name
            )));
        }

        self.carts
            .add_item(user_id, product.id, request.quantity)
            .await?;

        debug!(user_id, product_id = product.id, quantity = request.quantity, "Added to cart");

        self.get(user_id).await
    }

    pub async fn clear(&self, user_id: i64) -> Result<()> {
        self.carts.clear(user_id).await
    }
}
