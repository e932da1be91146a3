//! Chat application module for interactive RAG conversations.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! ragline client library. It supports:
//!
//! - Streaming responses with real-time chunk display
//! - Login and logout from within the session
//! - Slash commands for session control
//! - Hydration of persisted history at startup
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Core chat session management and service interaction
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::{ChatSession, SessionStats};
