// Payments module: intent creation and provider webhook reconciliation

pub mod controllers;
pub mod models;
pub mod services;

pub use models::PaymentEvent;
pub use services::{
    PaymentProvider, PaymentService, StripeProvider, WebhookError, WebhookHandler, WebhookOutcome,
};
