//! Integrations - Servizi esterni dietro un trait (storage dei file, gateway di pagamento)

pub mod payments;
pub mod storage;

pub use payments::{PaymentGateway, StripeEvent, StripeGateway, verify_webhook_signature};
pub use storage::{FileStorage, LocalStorage, extension_for};
