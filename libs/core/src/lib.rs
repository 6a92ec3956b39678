//! Core of the Telegram relay.
//!
//! Holds the value types exchanged with Telegram, the authorization store, and the processing
//! backend; the HTTP clients for those three collaborators; the relay pipeline itself; and the
//! framework-neutral webhook adapter the transport shells bind to.
pub mod auth_store;
pub mod backend;
pub mod config;
pub mod error;
pub mod interfaces;
pub mod relay;
pub mod telegram;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
pub mod types;
pub mod webhook;

pub use auth_store::*;
pub use backend::*;
pub use config::*;
pub use error::*;
pub use interfaces::*;
pub use relay::*;
pub use telegram::*;
pub use types::*;
pub use webhook::*;
