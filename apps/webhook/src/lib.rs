//! HTTP shell for the Telegram relay: routes, request ids, and startup webhook registration.
pub mod http;
pub mod registration;
pub mod request_id;

pub use http::{AppState, build_router};
pub use registration::{RegistrationResult, ensure_webhook, register_webhook};
