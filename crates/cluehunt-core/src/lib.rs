//! Cluehunt Core Library
//!
//! Shared functionality for Cluehunt components:
//! - SQLite pool construction and common database error types
//! - Chat wire protocol frames exchanged with WebSocket clients

pub mod db;
pub mod protocol;

pub use db::{DatabaseError, unix_timestamp};
pub use protocol::{ChatBroadcast, ChatFrame};
