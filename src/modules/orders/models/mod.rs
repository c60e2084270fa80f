mod order;

pub use order::{
    NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, OrderRow, OrderStatus,
    PaymentStateUpdate, PaymentStatus, PlacedOrder,
};
