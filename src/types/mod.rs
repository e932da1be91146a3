// Public modules
pub mod auth;
pub mod history_record;
pub mod message;
pub mod rag_request;
pub mod rag_response;
pub mod session_id;
pub mod user;

// Re-exports
pub use auth::{LoginRequest, SignupRequest, TokenResponse};
pub use history_record::{HistoryPage, HistoryRecord, RecordedResponse};
pub use message::{Message, MessageMetadata, MessageRole};
pub use rag_request::RagRequest;
pub use rag_response::{ContextChunk, RagResponse};
pub use session_id::SessionId;
pub use user::User;
