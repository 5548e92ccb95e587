//! Cluehunt Gateway Library
//!
//! Core functionality for the Cluehunt realtime gateway:
//! - SQLite storage for teams, chat messages, and hunt progress
//! - JWT validation for connecting principals
//! - Room group registry for WebSocket fan-out
//! - Fire-and-forget chat message persistence
//! - Hint release scheduling

pub mod auth;
pub mod hints;
pub mod persist;
pub mod registry;
pub mod server;
pub mod storage;
