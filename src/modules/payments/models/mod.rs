mod payment_event;

pub use payment_event::{
    CreateIntentRequest, CreateIntentResponse, EventData, PaymentEvent, PaymentIntent,
    ProviderEvent, EVENT_PAYMENT_CANCELED, EVENT_PAYMENT_FAILED, EVENT_PAYMENT_SUCCEEDED,
};
