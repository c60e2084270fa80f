// In-memory repositories
//
// One shared state behind a mutex implements every repository trait, so
// checkout sees the same stock and carts that the cart endpoints wrote.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use storefront::carts::{CartLine, CartRepository};
use storefront::core::{AppError, Result};
use storefront::orders::models::{NewOrder, OrderItem};
use storefront::orders::{Order, OrderRepository, OrderStatus, PaymentStateUpdate};
use storefront::payments::services::{IntentRequest, ProviderIntent};
use storefront::payments::PaymentProvider;
use storefront::products::{Product, ProductRepository};
use storefront::users::models::NewUser;
use storefront::users::{User, UserRepository};

#[derive(Default)]
struct State {
    next_id: i64,
    users: Vec<User>,
    products: Vec<Product>,
    carts: HashMap<i64, Vec<CartLine>>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store shared by every repository trait
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_payment_updates: AtomicBool,
    payment_updates: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> Product {
        let mut state = self.lock();
        let product = Product {
            id: state.next_id(),
            name: name.to_string(),
            description: format!("{} description", name),
            price,
            category: "general".to_string(),
            stock,
            image_url: format!("https://img.example.com/{}.png", name),
            created_at: Utc::now(),
        };
        state.products.push(product.clone());
        product
    }

    /// Pending order for `user_id` without going through a cart
    pub fn seed_order(&self, user_id: i64, total: Decimal) -> Order {
        let mut state = self.lock();
        let now = Utc::now();
        let order = Order {
            id: state.next_id(),
            user_id,
            total,
            status: OrderStatus::Pending,
            payment_status: None,
            payment_intent_id: None,
            created_at: now,
            updated_at: now,
        };
        state.orders.push(order.clone());
        order
    }

    pub fn order(&self, id: i64) -> Option<Order> {
        self.lock().orders.iter().find(|o| o.id == id).cloned()
    }

    pub fn stock_of(&self, product_id: i64) -> Option<i32> {
        self.lock()
            .products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.stock)
    }

    pub fn cart_size(&self, user_id: i64) -> usize {
        self.lock().carts.get(&user_id).map_or(0, Vec::len)
    }

    /// Make every payment state update fail as a store outage would
    pub fn fail_payment_updates(&self, fail: bool) {
        self.fail_payment_updates.store(fail, Ordering::SeqCst);
    }

    /// Number of payment state updates that reached an existing order
    pub fn payment_updates(&self) -> usize {
        self.payment_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::EmailExists);
        }

        let created = User {
            id: state.next_id(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            full_name: user.full_name.clone(),
            created_at: Utc::now(),
        };
        state.carts.insert(created.id, Vec::new());
        state.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Product>> {
        let state = self.lock();
        Ok(state
            .products
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.lock().products.len() as i64)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.lock().products.iter().find(|p| p.id == id).cloned())
    }

    async fn search(&self, term: &str, limit: i64) -> Result<Vec<Product>> {
        let term = term.to_lowercase();
        Ok(self
            .lock()
            .products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&term) || p.description.to_lowercase().contains(&term)
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn lines(&self, user_id: i64) -> Result<Vec<CartLine>> {
        Ok(self.lock().carts.get(&user_id).cloned().unwrap_or_default())
    }

    async fn quantity_of(&self, user_id: i64, product_id: i64) -> Result<i32> {
        Ok(self
            .lock()
            .carts
            .get(&user_id)
            .and_then(|lines| lines.iter().find(|l| l.product_id == product_id))
            .map_or(0, |l| l.quantity))
    }

    async fn add_item(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<()> {
        let mut state = self.lock();
        let product = state
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Product"))?;
        let line_id = state.next_id();

        let lines = state.carts.entry(user_id).or_default();
        match lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity += quantity,
            None => lines.push(CartLine {
                id: line_id,
                product_id,
                quantity,
                name: product.name,
                price: product.price,
                image_url: product.image_url,
            }),
        }
        Ok(())
    }

    async fn clear(&self, user_id: i64) -> Result<()> {
        if let Some(lines) = self.lock().carts.get_mut(&user_id) {
            lines.clear();
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place(&self, order: &NewOrder) -> Result<Order> {
        let mut state = self.lock();

        // All or nothing, like the transactional store
        for item in &order.items {
            let stock = state
                .products
                .iter()
                .find(|p| p.id == item.product_id)
                .map_or(0, |p| p.stock);
            if stock < item.quantity {
                return Err(AppError::InsufficientStock(format!(
                    "Not enough stock for '{}'",
                    item.product_name
                )));
            }
        }

        let now = Utc::now();
        let placed = Order {
            id: state.next_id(),
            user_id: order.user_id,
            total: order.total,
            status: OrderStatus::Pending,
            payment_status: None,
            payment_intent_id: None,
            created_at: now,
            updated_at: now,
        };

        for item in &order.items {
            if let Some(product) = state.products.iter_mut().find(|p| p.id == item.product_id) {
                product.stock -= item.quantity;
            }
            let item_id = state.next_id();
            state.order_items.push(OrderItem {
                id: item_id,
                order_id: placed.id,
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                price: item.price,
                subtotal: item.subtotal(),
            });
        }

        state.orders.push(placed.clone());
        if let Some(lines) = state.carts.get_mut(&order.user_id) {
            lines.clear();
        }

        Ok(placed)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Order>> {
        Ok(self.order(id))
    }

    async fn items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        Ok(self
            .lock()
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Order>> {
        Ok(self
            .lock()
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_payment_state(&self, order_id: i64, update: &PaymentStateUpdate) -> Result<bool> {
        if self.fail_payment_updates.load(Ordering::SeqCst) {
            return Err(AppError::internal("connection reset by peer"));
        }

        let mut state = self.lock();
        let Some(order) = state.orders.iter_mut().find(|o| o.id == order_id) else {
            return Ok(false);
        };

        if let Some(status) = update.status {
            order.status = status;
        }
        order.payment_status = Some(update.payment_status);
        if let Some(intent) = &update.payment_intent_id {
            order.payment_intent_id = Some(intent.clone());
        }
        order.updated_at = Utc::now();

        self.payment_updates.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// Payment provider that records requests instead of calling out
#[derive(Default)]
pub struct FakeProvider {
    requests: Mutex<Vec<IntentRequest>>,
    failing: AtomicBool,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Provider that rejects every request
    pub fn failing() -> Arc<Self> {
        let provider = Self::default();
        provider.failing.store(true, Ordering::SeqCst);
        Arc::new(provider)
    }

    pub fn requests(&self) -> Vec<IntentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_intent(&self, request: &IntentRequest) -> Result<ProviderIntent> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::gateway("card_declined"));
        }

        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());

        let id = format!("pi_test_{}", requests.len());
        Ok(ProviderIntent {
            client_secret: format!("{}_secret_abc", id),
            id,
            amount: request.amount,
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}
