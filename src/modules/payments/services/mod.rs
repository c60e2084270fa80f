pub mod payment_provider;
pub mod payment_service;
pub mod signature;
pub mod webhook_handler;

pub use payment_provider::{IntentRequest, PaymentProvider, ProviderIntent, StripeProvider};
pub use payment_service::PaymentService;
pub use webhook_handler::{WebhookError, WebhookHandler, WebhookOutcome, MAX_PAYLOAD_BYTES};
