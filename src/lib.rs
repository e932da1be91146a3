// Public modules
pub mod auth;
pub mod chat;
pub mod client;
pub mod error;
pub mod history;
pub mod observability;
pub mod sse;
pub mod token_store;
pub mod types;
pub mod utils;

// Re-exports
pub use auth::AuthSession;
pub use client::{HookHandle, RagClient, ResponseHook};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use types::*;
