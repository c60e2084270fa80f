mod cart;

pub use cart::{AddToCartRequest, CartItemView, CartLine, CartView};
